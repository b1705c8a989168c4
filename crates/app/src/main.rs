use std::{sync::Arc, time::Duration};

use engine::{Engine, MemoryStore, Store};
use server::CorsSettings;
use settings::{Backend, Settings};
use sheets::{SheetsConfig, SheetsStore};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tally={level},server={level},engine={level},sheets={level},tower_http={level}",
            level = settings.app.level
        ))
        .init();

    tracing::info!("Tally backend starting...");

    let store = build_store(&settings.store)?;
    let engine = Engine::builder().store(store).build()?;

    let cors = server::cors_layer(&CorsSettings {
        allowed_origins: settings.server.allowed_origins.clone(),
        allowed_origin_regex: settings.server.allowed_origin_regex.clone(),
    })?;

    let addr = format!("{}:{}", settings.server.bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    if let Err(err) = server::run_with_listener(engine, cors, listener, shutdown_signal()).await {
        tracing::error!("server failed: {err}");
        return Err(err.into());
    }

    tracing::info!("Tally backend stopped.");
    Ok(())
}

fn build_store(
    config: &settings::Store,
) -> Result<Arc<dyn Store>, Box<dyn std::error::Error + Send + Sync>> {
    match config.backend {
        Backend::Memory => {
            tracing::warn!("using the in-memory store, transactions are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        Backend::Sheets => {
            let store = SheetsStore::new(SheetsConfig {
                spreadsheet_name: config.spreadsheet_name.clone(),
                worksheet: config.worksheet.clone(),
                credentials_json: config.credentials_json.clone(),
                credentials_file: config.credentials_file.clone(),
                share_email: config.share_email.clone(),
                request_timeout: Duration::from_secs(config.request_timeout_secs),
                ..SheetsConfig::default()
            })?;
            tracing::info!(
                "using Google Sheets store, spreadsheet {:?}",
                config.spreadsheet_name
            );
            Ok(Arc::new(store))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
