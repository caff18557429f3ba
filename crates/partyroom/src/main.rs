use partyroom::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), PartyroomError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting partyroom");

    let config = ServerConfig::load_or_default();
    tracing::info!(
        bind = %config.bind,
        tick_rate = config.room.tick_rate,
        max_members = config.room.max_members,
        "configuration loaded"
    );

    let server = PartyroomServerBuilder::from_config(config).build().await?;
    server.run().await
}
