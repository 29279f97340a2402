use aqua_server::{Config, Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (.env, then config)
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    // 2. Logging
    setup_environment(&config)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        funds_policy = ?config.funds_policy,
        "Aqua server starting..."
    );

    // 3. State
    let state = ServerState::initialize(&config).await?;

    // 4. HTTP server (background tasks are started by Server::run)
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    Ok(())
}
