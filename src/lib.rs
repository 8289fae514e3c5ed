pub mod cache;
pub mod config;
pub mod error;
pub mod origin;
pub mod pipeline;
pub mod server;
pub mod types;
pub mod upstream;

use cache::SearchCache;
use config::Config;
use origin::OriginGate;
use upstream::UpstreamClient;

#[derive(Clone, Debug)]
pub struct AppState {
    pub origins: OriginGate,
    pub upstream: UpstreamClient,
    // Lives as long as the process; swept by the task from `SearchCache::spawn_pruner`.
    pub cache: SearchCache,
}

pub use error::ProxyError;
pub use types::*;

impl AppState {
    pub fn new(config: &Config, http_client: reqwest::Client) -> Self {
        Self {
            origins: OriginGate::new(config.allowed_domains.iter().cloned()),
            upstream: UpstreamClient::new(http_client, config.upstream.clone()),
            cache: SearchCache::from_config(config),
        }
    }
}
