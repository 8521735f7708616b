//! Raw transports the fetch adapter sends requests through.
//!
//! - [`ReqwestTransport`]: direct HTTP via reqwest (HTTP/2, TLS 1.3,
//!   compression, cookie jar).
//! - [`ProxiedTransport`]: rewrites every request to go through a
//!   simple-proxy deployment, which replays it with the original headers.
//!
//! Both return non-success statuses as normal responses; deciding what a
//! status means is left to the [`Fetcher`](super::Fetcher).

use std::collections::btree_map::Entry;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::profile::{random_profile, BrowserProfile};
use super::{CredentialsMode, HeaderList};
use crate::error::{Result, ScrapeError};

/// A fully composed request handed to a [`Transport`].
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: Url,
    pub method: Method,
    /// Lowercase header names.
    pub headers: HeaderList,
    pub body: Option<Vec<u8>>,
    pub credentials: Option<CredentialsMode>,
}

/// What came back from the wire, undecoded.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    /// Lowercase header names; repeated headers are joined with `, `.
    pub headers: HeaderList,
    /// URL after redirects.
    pub final_url: String,
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// `content-type` header, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }
}

/// Network-fetch primitive. The only thing in the crate that does I/O for
/// providers and caption backends.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Direct HTTP transport with a browser-like identity.
pub struct ReqwestTransport {
    client: Client,
    profile: BrowserProfile,
}

impl ReqwestTransport {
    /// Create a transport with a random desktop profile and a 30s timeout.
    pub fn new() -> Result<Self> {
        Self::with_profile(random_profile(), Duration::from_secs(30))
    }

    /// Create a transport with a specific browser profile and request timeout.
    pub fn with_profile(profile: BrowserProfile, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            // Let the server negotiate HTTP/2
            .http2_adaptive_window(true)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .brotli(true)
            .zstd(true)
            .gzip(true)
            .deflate(true)
            .default_headers(to_header_map(&profile.to_headers()))
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .cookie_store(true)
            .build()?;

        Ok(Self { client, profile })
    }

    /// Browser profile this transport presents.
    #[must_use]
    pub fn profile(&self) -> &BrowserProfile {
        &self.profile
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut headers = request.headers;
        if request.credentials == Some(CredentialsMode::Omit) {
            headers.remove("cookie");
        }

        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(to_header_map(&headers));
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = from_header_map(response.headers());
        let body = response.bytes().await?.to_vec();

        debug!(status, bytes = body.len(), "response received");

        Ok(TransportResponse {
            status,
            headers,
            final_url,
            body,
        })
    }
}

/// Request headers browsers refuse to set, renamed so the proxy can restore
/// them on the outgoing request.
const PROXY_REQUEST_HEADERS: &[(&str, &str)] = &[
    ("cookie", "x-cookie"),
    ("referer", "x-referer"),
    ("origin", "x-origin"),
    ("user-agent", "x-user-agent"),
    ("x-real-ip", "x-x-real-ip"),
];

/// Response headers the proxy renames on the way back.
const PROXY_RESPONSE_HEADERS: &[(&str, &str)] = &[("x-set-cookie", "set-cookie")];

/// Routes requests through a simple-proxy deployment.
///
/// The target URL travels in the `destination` query parameter and the
/// final URL after redirects comes back in `x-final-destination`.
pub struct ProxiedTransport {
    inner: Arc<dyn Transport>,
    proxy_url: Url,
}

impl ProxiedTransport {
    /// Wrap `inner` so that every request goes to `proxy_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidUrl`] when `proxy_url` is not http(s).
    pub fn new(inner: Arc<dyn Transport>, proxy_url: &str) -> Result<Self> {
        let proxy_url = Url::parse(proxy_url)?;
        if !matches!(proxy_url.scheme(), "http" | "https") {
            return Err(ScrapeError::InvalidUrl(format!(
                "proxy must be http(s): {proxy_url}"
            )));
        }
        Ok(Self { inner, proxy_url })
    }

    fn proxied_url(&self, target: &Url) -> Url {
        let mut url = self.proxy_url.clone();
        url.query_pairs_mut()
            .append_pair("destination", target.as_str());
        url
    }
}

#[async_trait]
impl Transport for ProxiedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let headers = request
            .headers
            .into_iter()
            .map(|(name, value)| (rename(&name, PROXY_REQUEST_HEADERS), value))
            .collect();

        let mut response = self
            .inner
            .send(TransportRequest {
                url: self.proxied_url(&request.url),
                method: request.method,
                headers,
                body: request.body,
                credentials: request.credentials,
            })
            .await?;

        if let Some(destination) = response.headers.remove("x-final-destination") {
            response.final_url = destination;
        } else {
            response.final_url = request.url.to_string();
        }
        response.headers = response
            .headers
            .into_iter()
            .map(|(name, value)| (rename(&name, PROXY_RESPONSE_HEADERS), value))
            .collect();

        Ok(response)
    }
}

fn rename(name: &str, table: &[(&str, &str)]) -> String {
    table
        .iter()
        .find(|(from, _)| *from == name)
        .map_or_else(|| name.to_string(), |(_, to)| (*to).to_string())
}

fn to_header_map(headers: &HeaderList) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => debug!(header = %name, "skipping header that is not valid on the wire"),
        }
    }
    map
}

fn from_header_map(headers: &HeaderMap) -> HeaderList {
    let mut list = HeaderList::new();
    for (name, value) in headers {
        let value = value.to_str().unwrap_or_default().to_string();
        match list.entry(name.as_str().to_string()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.push_str(", ");
                existing.push_str(&value);
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
    }
    list
}
