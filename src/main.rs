use anyhow::Result;

use property_ledger::{
    app, config, db, logging,
    repository::{MemoryRepository, PgRepository, PropertyRepository},
    services::LlmClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env)?;
    for warning in settings.warnings() {
        tracing::warn!("{warning}");
    }

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting property ledger backend"
    );

    // Create LLM client
    let llm = LlmClient::new(&settings.llm)?;

    // Choose the store
    match settings.database_url.clone() {
        Some(url) => {
            let pool = db::create_pool(&url, settings.database_max_connections).await?;
            db::run_migrations(&pool).await?;
            serve(PgRepository::new(pool), settings, llm).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set - using in-memory store, data is lost on restart");
            serve(MemoryRepository::new(), settings, llm).await
        }
    }
}

async fn serve<R: PropertyRepository>(
    repo: R,
    settings: config::Settings,
    llm: LlmClient,
) -> Result<()> {
    let server_addr = settings.server_addr.clone();

    // Create application state
    let state = app::AppState::new(repo, settings, llm);

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&server_addr).await?;
    tracing::info!("Listening on {}", server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
