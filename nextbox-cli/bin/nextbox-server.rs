use std::sync::Arc;

use clap::Parser;
use nextbox_cli::{NextboxCliError, NextboxCliResult, ServerArgs};
use nextbox_core::provider::DaytonaProvider;
use nextbox_server::{route, state::AppState};
use nextbox_utils::{CHECKMARK, ERROR_MARK};
use tracing_subscriber::EnvFilter;

//--------------------------------------------------------------------------------------------------
// Functions: Main
//--------------------------------------------------------------------------------------------------

#[tokio::main]
pub async fn main() -> NextboxCliResult<()> {
    // Values from .env act as defaults for the arguments
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .map_err(|e| NextboxCliError::Logging(e.to_string()))?;

    // Parse command line arguments
    let args = ServerArgs::parse();

    // Create configuration from arguments
    let config = Arc::new(args.into_config()?);

    // Create the provider client and application state
    let provider = Arc::new(DaytonaProvider::new(config.get_provider().clone())?);
    let state = AppState::new(config.clone(), provider)?;

    // Build application
    let app = route::create_router(state);

    // Start server
    let addr = *config.get_addr();
    tracing::info!("Starting server on {}", addr);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("{} Could not listen on {}", &*ERROR_MARK, addr);
            return Err(e.into());
        }
    };

    println!(
        "{} Server listening on {}",
        &*CHECKMARK,
        console::style(addr).yellow()
    );
    println!(
        "{} Accepting cross-origin requests from {}",
        &*CHECKMARK,
        console::style(config.get_frontend_origin().to_str().unwrap_or("<invalid>")).yellow()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
