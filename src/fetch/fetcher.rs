//! The fetch adapter providers use for all outbound requests.

use std::sync::Arc;

use http::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::transport::{Transport, TransportRequest, TransportResponse};
use super::url::{compose, UrlParts};
use super::{CredentialsMode, HeaderList, QueryMap};
use crate::error::{Result, ScrapeError};

/// Request payload. The matching `content-type` is added unless the caller
/// sets one.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Text(String),
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    Json(serde_json::Value),
}

impl RequestBody {
    fn into_parts(self) -> Result<(&'static str, Vec<u8>)> {
        Ok(match self {
            Self::Text(text) => ("text/plain;charset=UTF-8", text.into_bytes()),
            Self::Form(pairs) => {
                let encoded = ::url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs)
                    .finish();
                (
                    "application/x-www-form-urlencoded;charset=UTF-8",
                    encoded.into_bytes(),
                )
            }
            Self::Json(value) => ("application/json", serde_json::to_vec(&value)?),
        })
    }
}

/// Per-request options. Every field has a default, so
/// `FetchOptions::default()` is a plain `GET`.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub method: Method,
    pub headers: HeaderList,
    pub query: QueryMap,
    pub base_url: String,
    pub body: Option<RequestBody>,
    pub credentials: Option<CredentialsMode>,
    /// Response headers to surface in [`FullResponse::headers`].
    pub read_headers: Vec<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderList::new(),
            query: QueryMap::new(),
            base_url: String::new(),
            body: None,
            credentials: None,
            read_headers: Vec::new(),
        }
    }
}

impl FetchOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add a request header. Names are stored lowercase.
    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: &HeaderList) -> Self {
        for (name, value) in headers {
            self.headers.insert(name.to_ascii_lowercase(), value.clone());
        }
        self
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// `POST` a urlencoded form.
    #[must_use]
    pub fn form<K, V>(self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.method(Method::POST).body(RequestBody::Form(pairs))
    }

    /// `POST` a JSON document.
    pub fn json<T: Serialize>(self, value: &T) -> Result<Self> {
        Ok(self
            .method(Method::POST)
            .body(RequestBody::Json(serde_json::to_value(value)?)))
    }

    #[must_use]
    pub fn credentials(mut self, mode: CredentialsMode) -> Self {
        self.credentials = Some(mode);
        self
    }

    #[must_use]
    pub fn read_header(mut self, name: impl AsRef<str>) -> Self {
        self.read_headers.push(name.as_ref().to_ascii_lowercase());
        self
    }
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// The response declared a JSON content type.
    Json(serde_json::Value),
    Text(String),
}

impl Body {
    fn decode(response: &TransportResponse) -> Result<Self> {
        let is_json = response
            .content_type()
            .is_some_and(|ct| ct.contains("application/json") || ct.contains("+json"));
        if is_json {
            Ok(Self::Json(serde_json::from_slice(&response.body)?))
        } else {
            Ok(Self::Text(String::from_utf8_lossy(&response.body).into_owned()))
        }
    }

    /// Body as text. JSON bodies are re-serialized.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Json(value) => value.to_string(),
        }
    }

    /// Deserialize the body. Text bodies are parsed as JSON, since plenty of
    /// sites serve JSON as `text/html`.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Self::Json(value) => Ok(serde_json::from_value(value)?),
            Self::Text(text) => Ok(serde_json::from_str(&text)?),
        }
    }
}

/// Result of [`Fetcher::full`].
#[derive(Debug, Clone)]
pub struct FullResponse {
    pub status: u16,
    pub body: Body,
    /// Only the headers listed in [`FetchOptions::read_headers`].
    pub headers: HeaderList,
    /// URL after redirects (or as reported by the proxy).
    pub final_url: String,
}

/// Fetch adapter over an injected [`Transport`].
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher").finish_non_exhaustive()
    }
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Full-response convention: status, decoded body, the requested
    /// response headers and the final URL. Non-success statuses are returned,
    /// not raised.
    pub async fn full(&self, url: &str, options: FetchOptions) -> Result<FullResponse> {
        let FetchOptions {
            method,
            mut headers,
            query,
            base_url,
            body,
            credentials,
            read_headers,
        } = options;

        let url = compose(
            url,
            &UrlParts {
                base_url: Some(&base_url),
                query: Some(&query),
            },
        )?;

        let body = match body {
            Some(body) => {
                let (content_type, bytes) = body.into_parts()?;
                headers
                    .entry("content-type".to_string())
                    .or_insert_with(|| content_type.to_string());
                Some(bytes)
            }
            None => None,
        };

        debug!(%method, %url, "fetch");
        let response = self
            .transport
            .send(TransportRequest {
                url,
                method,
                headers,
                body,
                credentials,
            })
            .await?;

        let selected = read_headers
            .iter()
            .filter_map(|name| {
                let name = name.to_ascii_lowercase();
                response.headers.get(&name).map(|v| (name, v.clone()))
            })
            .collect();

        Ok(FullResponse {
            status: response.status,
            body: Body::decode(&response)?,
            headers: selected,
            final_url: response.final_url,
        })
    }

    /// Body-only convention. Statuses of 400 and above become
    /// [`ScrapeError::Status`].
    pub async fn fetch(&self, url: &str, options: FetchOptions) -> Result<Body> {
        let response = self.full(url, options).await?;
        if response.status >= 400 {
            return Err(ScrapeError::Status {
                status: response.status,
                url: response.final_url,
            });
        }
        Ok(response.body)
    }

    /// Body as text.
    pub async fn text(&self, url: &str, options: FetchOptions) -> Result<String> {
        Ok(self.fetch(url, options).await?.into_text())
    }

    /// Body deserialized into `T`.
    pub async fn json<T: DeserializeOwned>(&self, url: &str, options: FetchOptions) -> Result<T> {
        self.fetch(url, options).await?.into_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::transport::tests::RecordingTransport;
    use serde::Deserialize;

    fn fetcher(transport: &Arc<RecordingTransport>) -> Fetcher {
        Fetcher::new(transport.clone())
    }

    #[tokio::test]
    async fn defaults_to_plain_get() {
        let transport = Arc::new(RecordingTransport::new(200, "text/html", "<html>"));
        let body = fetcher(&transport)
            .fetch("https://site.test/page", FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(body, Body::Text("<html>".into()));
        let sent = transport.last();
        assert_eq!(sent.method, Method::GET);
        assert!(sent.headers.is_empty());
        assert!(sent.body.is_none());
        assert_eq!(sent.url.as_str(), "https://site.test/page");
    }

    #[tokio::test]
    async fn composes_base_url_and_query() {
        let transport = Arc::new(RecordingTransport::new(200, "text/html", ""));
        fetcher(&transport)
            .fetch(
                "/search",
                FetchOptions::new()
                    .base_url("https://mp4hydra.test/")
                    .query("q", "heat"),
            )
            .await
            .unwrap();
        assert_eq!(transport.last().url.as_str(), "https://mp4hydra.test/search?q=heat");
    }

    #[tokio::test]
    async fn invalid_url_fails_before_transport() {
        let transport = Arc::new(RecordingTransport::new(200, "text/html", ""));
        let err = fetcher(&transport)
            .fetch("/relative", FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidUrl(_)));
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn json_content_type_is_parsed() {
        #[derive(Deserialize)]
        struct Sources {
            source1: String,
        }

        let transport = Arc::new(RecordingTransport::new(
            200,
            "application/json; charset=utf-8",
            r#"{"source1":"https://cdn.test/a.m3u8"}"#,
        ));
        let f = fetcher(&transport);
        let body = f
            .fetch("https://api.test/movie/x", FetchOptions::default())
            .await
            .unwrap();
        assert!(matches!(body, Body::Json(_)));

        let typed: Sources = f
            .json("https://api.test/movie/x", FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(typed.source1, "https://cdn.test/a.m3u8");
    }

    #[tokio::test]
    async fn form_body_sets_method_and_content_type() {
        let transport = Arc::new(RecordingTransport::new(200, "text/plain", "{}"));
        fetcher(&transport)
            .fetch(
                "https://soaper.test/home/index/getMInfoAjax",
                FetchOptions::new().form([("pass", "abc"), ("e2", "0")]),
            )
            .await
            .unwrap();

        let sent = transport.last();
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.body.as_deref(), Some(b"pass=abc&e2=0".as_slice()));
        assert!(sent.headers["content-type"].starts_with("application/x-www-form-urlencoded"));
    }

    #[tokio::test]
    async fn caller_content_type_wins() {
        let transport = Arc::new(RecordingTransport::new(200, "text/plain", ""));
        fetcher(&transport)
            .fetch(
                "https://site.test/",
                FetchOptions::new()
                    .header("Content-Type", "text/x-custom")
                    .body(RequestBody::Text("hi".into())),
            )
            .await
            .unwrap();
        assert_eq!(transport.last().headers["content-type"], "text/x-custom");
    }

    #[tokio::test]
    async fn full_surfaces_only_requested_headers() {
        let mut transport = RecordingTransport::new(302, "text/html", "");
        transport
            .response
            .headers
            .insert("location".into(), "https://elsewhere.test/".into());
        transport
            .response
            .headers
            .insert("x-other".into(), "ignored".into());
        let transport = Arc::new(transport);

        let full = fetcher(&transport)
            .full(
                "https://site.test/go",
                FetchOptions::new().read_header("Location"),
            )
            .await
            .unwrap();
        assert_eq!(full.status, 302);
        assert_eq!(full.headers.len(), 1);
        assert_eq!(full.headers["location"], "https://elsewhere.test/");
        assert_eq!(full.final_url, "https://site.test/go");
    }

    #[tokio::test]
    async fn error_status_fails_body_convention() {
        let transport = Arc::new(RecordingTransport::new(404, "text/html", "gone"));
        let err = fetcher(&transport)
            .fetch("https://site.test/missing", FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Status { status: 404, .. }));
    }

    #[test]
    fn text_body_parses_as_json() {
        let body = Body::Text(r#"{"val":"x.m3u8"}"#.into());
        let value: serde_json::Value = body.into_json().unwrap();
        assert_eq!(value["val"], "x.m3u8");
    }
}
