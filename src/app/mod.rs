use crate::api::ApiServer;
use crate::config::Config;
use crate::ingest::IngestService;
use crate::normalize::MEETING_HEADERS;
use crate::store::{Table, TableStore};
use crate::{aggregate, provision};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

pub async fn run_service() -> Result<()> {
    info!("Starting meetsink service");

    let config = Config::load()?;
    let port = config.server.port;
    let service = Arc::new(IngestService::from_config(&config)?);

    info!("Storage ready at {}", service.store().location());
    info!("meetsink is ready!");
    info!(
        "Test manually: curl -X POST http://127.0.0.1:{}/ingest -d '{{\"source\":\"PWA Meeting Recorder\"}}'",
        port
    );

    ApiServer::new(service, port).start().await
}

/// Provision the meeting table and the aggregate ledger ahead of traffic.
pub fn run_init() -> Result<()> {
    let config = Config::load()?;
    let service = IngestService::from_config(&config)?;
    let store = service.store();
    let tables = service.tables();

    provision::ensure_table(store, &tables.meeting, &MEETING_HEADERS)?;
    info!("Provisioned table {}", tables.meeting);

    let ledger = store.open_table(&tables.aggregate)?;
    if ledger.row_count()? == 0 {
        ledger.append_rows(&aggregate::skeleton())?;
        info!("Provisioned ledger {}", tables.aggregate);
    } else {
        info!("Ledger {} already initialized", tables.aggregate);
    }

    info!("All tables initialized at {}", store.location());
    Ok(())
}

/// Report storage accessibility and per-table row counts.
pub fn run_diagnose() -> Result<()> {
    let config = Config::load()?;
    let service = IngestService::from_config(&config)?;
    let store = service.store();
    let tables = service.tables();

    info!("Storage reachable at {}", store.location());

    for name in [
        &tables.meeting,
        &tables.transcript,
        &tables.generic,
        &tables.aggregate,
    ] {
        let table = store.open_table(name)?;
        info!("Table {}: {} rows", name, table.row_count()?);
    }

    info!("Diagnosis complete, system healthy");
    Ok(())
}
