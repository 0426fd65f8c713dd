mod api_doc;
mod auth;
mod error;
mod handlers;
mod setup;
mod state;
mod task_dispatch;
mod task_handlers;
mod utils;

use mediavault_core::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let (state, router) = setup::initialize_app(config.clone()).await?;

    setup::server::start_server(&config, router).await?;

    // Stop claiming new tasks; in-flight handlers finish on their own.
    state.tasks.task_queue.shutdown().await;

    Ok(())
}
