use tracing_subscriber::EnvFilter;

use blog_search_proxy::config::{self, Config};
use blog_search_proxy::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Get configuration from environment, with .env as a fallback
    config::load_dotenv();
    let config = Config::from_env()?;

    server::run(config).await
}
