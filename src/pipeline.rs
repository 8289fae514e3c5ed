use axum::{
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN,
        },
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;
use tracing::{error, info, warn};
use url::form_urlencoded;

use crate::error::ProxyError;
use crate::AppState;

/// What the pipeline knows about one inbound request, plus the headers it has
/// decided to put on the response.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub origin: Option<String>,
    pub term: Option<String>,
    pub response_headers: HeaderMap,
}

impl Exchange {
    pub fn new(origin: Option<String>, term: Option<String>) -> Self {
        Self {
            origin,
            term,
            response_headers: HeaderMap::new(),
        }
    }

    /// Reads the `Origin` header and the first `q` query parameter.
    pub fn from_parts(headers: &HeaderMap, raw_query: Option<&str>) -> Self {
        let origin = headers
            .get(ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let term = raw_query.and_then(search_term);
        Self::new(origin, term)
    }

    fn respond(&self, status: StatusCode, body: Value) -> Response {
        self.with_headers((status, Json(body)).into_response())
    }

    fn fail(&self, err: ProxyError) -> Response {
        self.with_headers(err.into_response())
    }

    fn with_headers(&self, mut response: Response) -> Response {
        response.headers_mut().extend(self.response_headers.clone());
        response
    }
}

fn search_term(raw_query: &str) -> Option<String> {
    form_urlencoded::parse(raw_query.as_bytes())
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.into_owned())
}

pub enum Flow {
    Continue,
    Respond(Response),
}

type Stage = fn(&AppState, &mut Exchange) -> Result<(), ProxyError>;

/// Synchronous gate stages, in the order they run.
const STAGES: [Stage; 3] = [check_origin, set_cors_headers, require_search_term];

/// Origin check, CORS headers, search term check, cache lookup, upstream fetch.
pub async fn run(state: &AppState, mut exchange: Exchange) -> Response {
    for stage in STAGES {
        if let Err(err) = stage(state, &mut exchange) {
            return exchange.fail(err);
        }
    }

    if let Flow::Respond(response) = lookup_cache(state, &exchange).await {
        return response;
    }

    fetch_and_store(state, &exchange).await
}

pub fn check_origin(state: &AppState, exchange: &mut Exchange) -> Result<(), ProxyError> {
    state.origins.verify(exchange.origin.as_deref()).map(|_| ()).map_err(|err| {
        warn!("Rejected request from origin: {:?}", exchange.origin);
        err
    })
}

/// Echoes the verified origin back and allows GET with a Content-Type header.
pub fn set_cors_headers(_state: &AppState, exchange: &mut Exchange) -> Result<(), ProxyError> {
    let origin = exchange
        .origin
        .as_deref()
        .and_then(|o| HeaderValue::from_str(o).ok())
        .ok_or(ProxyError::Unauthorized)?;

    let headers = &mut exchange.response_headers;
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET"));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type"));
    Ok(())
}

pub fn require_search_term(_state: &AppState, exchange: &mut Exchange) -> Result<(), ProxyError> {
    match exchange.term.as_deref() {
        Some(term) if !term.is_empty() => Ok(()),
        _ => {
            warn!("No search term provided.");
            Err(ProxyError::MissingSearchTerm)
        }
    }
}

/// Any entry counts as a hit, however old; only the prune sweep removes entries.
pub async fn lookup_cache(state: &AppState, exchange: &Exchange) -> Flow {
    let Some(term) = exchange.term.as_deref() else {
        return Flow::Continue;
    };
    let Some(entry) = state.cache.get(term).await else {
        return Flow::Continue;
    };
    info!("Returned cached results for: {}", term);
    Flow::Respond(exchange.respond(StatusCode::OK, entry.data))
}

pub async fn fetch_and_store(state: &AppState, exchange: &Exchange) -> Response {
    let Some(term) = exchange.term.as_deref() else {
        return exchange.fail(ProxyError::MissingSearchTerm);
    };

    match state.upstream.search(term).await {
        Ok(data) => {
            state.cache.set(term, data.clone()).await;
            info!("Cached and returned found results for: {}", term);
            exchange.respond(StatusCode::OK, data)
        }
        Err(err) => {
            error!("Errored out at: {}", err);
            exchange.fail(err)
        }
    }
}
