use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::UpstreamQueryConfig;
use crate::error::ProxyError;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Client for the blog-post search endpoint. One GET per call, no retries.
#[derive(Clone, Debug)]
pub struct UpstreamClient {
    http_client: reqwest::Client,
    params: UpstreamQueryConfig,
}

impl UpstreamClient {
    pub fn new(http_client: reqwest::Client, params: UpstreamQueryConfig) -> Self {
        Self {
            http_client,
            params,
        }
    }

    /// Full request URL for `term`, including the API credential.
    pub fn build_url(&self, term: &str) -> Result<Url, ProxyError> {
        let mut url = Url::parse(&self.params.base_url)
            .map_err(|e| ProxyError::UpstreamTransport(format!("Invalid upstream URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("hapikey", &self.params.api_key)
            .append_pair("name__icontains", term)
            .append_pair("archived", if self.params.archived { "true" } else { "false" })
            .append_pair("state", &self.params.state)
            .append_pair("order_by", &self.params.order_by)
            .append_pair("content_group_id", &self.params.content_group_id);
        Ok(url)
    }

    pub async fn search(&self, term: &str) -> Result<Value, ProxyError> {
        let url = self.build_url(term)?;
        debug!("Querying upstream for: {}", term);

        let resp = self
            .http_client
            .get(url)
            .header(USER_AGENT, concat!("blog-search-proxy/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, JSON_CONTENT_TYPE)
            .send()
            .await
            .map_err(|e| ProxyError::UpstreamTransport(format!("Failed to reach upstream: {}", e)))?;

        let status = resp.status();
        if status.as_u16() != 200 {
            return Err(ProxyError::UpstreamStatus(status.as_u16()));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
        match content_type {
            Some(ref ct) if ct.starts_with(JSON_CONTENT_TYPE) => {}
            other => {
                return Err(ProxyError::UpstreamContentType(
                    other.unwrap_or_else(|| "none".to_string()),
                ))
            }
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| ProxyError::UpstreamTransport(format!("Failed to read upstream body: {}", e)))?;

        serde_json::from_slice(&body)
            .map_err(|e| ProxyError::UpstreamParse(format!("Failed to parse upstream response: {}", e)))
    }
}
