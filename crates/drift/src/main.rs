//! drift CLI: register configured files as tables and print their schemas.

use std::process::ExitCode;

use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use drift::{CliArgs, Config, FileClient, dynamic_tables, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = CliArgs::parse();

    let paths = args.config_paths();
    if paths.is_empty() {
        eprintln!("Error: no config files or directories specified");
        return ExitCode::FAILURE;
    }

    info!("Loading config from {} source(s)", paths.len());

    let config = match Config::from_paths(&paths) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let client = FileClient::from_config("drift", config);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let tables = match dynamic_tables(&client, &cancel).await {
        Ok(tables) => tables,
        Err(e) => {
            eprintln!("Table registration failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut failed = 0;
    for table in &tables {
        if let Some(e) = table.error() {
            failed += 1;
            warn!(target = %table.name, "Unavailable ({}): {e}", e.kind().as_str());
            continue;
        }

        let (tx, mut rx) = mpsc::channel(1);
        if let Err(e) = table.resolver().resolve(&tx).await {
            warn!(target = %table.name, "Failed to resolve: {e}");
            failed += 1;
            continue;
        }
        let records = rx.recv().await.map(|result| result.len()).unwrap_or_default();

        info!(target = %table.name, "{} record(s)", records);
        for column in &table.columns {
            info!(target = %table.name, "  {} ({})", column.name, column.column_type);
        }
    }

    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
