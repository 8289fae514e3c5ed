use url::Url;

use crate::error::ProxyError;

#[derive(Debug, Clone)]
pub struct OriginGate {
    allowed_domains: Vec<String>,
}

impl OriginGate {
    pub fn new<I, S>(allowed_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_domains: allowed_domains
                .into_iter()
                .map(|d| d.into().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn allowed_domains(&self) -> &[String] {
        &self.allowed_domains
    }

    /// Returns the origin back when it is allowed; a missing origin never is.
    pub fn verify<'a>(&self, origin: Option<&'a str>) -> Result<&'a str, ProxyError> {
        let origin = origin.ok_or(ProxyError::Unauthorized)?;
        match root_domain(origin) {
            Some(domain) if self.allowed_domains.iter().any(|d| *d == domain) => Ok(origin),
            _ => Err(ProxyError::Unauthorized),
        }
    }
}

/// Last two dot-separated labels of the origin's hostname. Not a public-suffix
/// lookup: `shop.example.co.uk` reduces to `co.uk`.
pub fn root_domain(origin: &str) -> Option<String> {
    let url = Url::parse(origin).ok()?;
    let host = url.host_str()?.trim_end_matches('.');
    let labels: Vec<&str> = host.split('.').collect();
    let start = labels.len().saturating_sub(2);
    Some(labels[start..].join("."))
}
