//! Stream proxy URL codec.
//!
//! Players can't attach custom headers to media requests, and many origins
//! reject requests without the right `referer`/`origin`. The proxy service
//! takes the real target and the headers to replay as query parameters:
//!
//! ```text
//! {proxy}/m3u8-proxy?url=<target>&headers=<json object>
//! ```
//!
//! Wrapping an already-proxied URL nests it and raises the depth by one;
//! consumers need one decode-then-refetch hop per level.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::fetch::HeaderList;

/// Path of the playlist-rewriting endpoint on the proxy service.
pub const M3U8_PROXY_PATH: &str = "m3u8-proxy";

/// Encodes target URLs and headers into proxy URLs.
#[derive(Debug, Clone)]
pub struct ProxyCodec {
    base_url: String,
}

/// A proxy URL together with how many times it has been wrapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxiedUrl {
    pub url: String,
    pub depth: u8,
}

/// Target and headers recovered from a proxy URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedProxyUrl {
    pub target: String,
    pub headers: HeaderList,
}

impl ProxyCodec {
    /// Codec for the proxy service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidUrl`] when `base_url` is not http(s).
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScrapeError::InvalidUrl(format!(
                "proxy service must be http(s): {base_url}"
            )));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Encode `target` and `headers` into a proxy URL.
    ///
    /// Identical inputs always produce the identical string: headers are
    /// serialized in sorted order and every entry is kept, empty values
    /// included.
    #[must_use]
    pub fn encode(&self, target: &str, headers: &HeaderList) -> String {
        let headers_json = serde_json::to_string(headers).unwrap_or_else(|_| "{}".to_string());
        format!(
            "{}/{M3U8_PROXY_PATH}?url={}&headers={}",
            self.base_url,
            urlencoding::encode(target),
            urlencoding::encode(&headers_json)
        )
    }

    /// Wrap a URL once, starting at depth 1.
    #[must_use]
    pub fn wrap(&self, target: &str, headers: &HeaderList) -> ProxiedUrl {
        ProxiedUrl {
            url: self.encode(target, headers),
            depth: 1,
        }
    }

    /// Wrap an already-proxied URL again.
    #[must_use]
    pub fn rewrap(&self, inner: &ProxiedUrl, headers: &HeaderList) -> ProxiedUrl {
        ProxiedUrl {
            url: self.encode(&inner.url, headers),
            depth: inner.depth.saturating_add(1),
        }
    }

    /// `true` if `url` points at this codec's proxy endpoint.
    #[must_use]
    pub fn is_proxied(&self, url: &str) -> bool {
        url.starts_with(&format!("{}/{M3U8_PROXY_PATH}?", self.base_url))
    }

    /// Count how many times `url` has been wrapped by this codec.
    #[must_use]
    pub fn depth_of(&self, url: &str) -> u8 {
        let mut depth = 0u8;
        let mut current = url.to_string();
        while self.is_proxied(&current) {
            match decode(&current) {
                Ok(decoded) => {
                    depth = depth.saturating_add(1);
                    current = decoded.target;
                }
                Err(_) => break,
            }
        }
        depth
    }
}

/// Recover the target URL and headers from one layer of proxying.
///
/// The proxy service does this on its side; here it backs the CLI's
/// inspection command and depth counting.
pub fn decode(proxy_url: &str) -> Result<DecodedProxyUrl> {
    let parsed = Url::parse(proxy_url)?;
    let mut target = None;
    let mut headers = HeaderList::new();

    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            "url" => target = Some(value.into_owned()),
            "headers" => {
                headers = serde_json::from_str::<BTreeMap<String, String>>(&value)?;
            }
            _ => {}
        }
    }

    let target =
        target.ok_or_else(|| ScrapeError::Decode(format!("no url parameter in {proxy_url}")))?;
    Ok(DecodedProxyUrl { target, headers })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderList {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn codec() -> ProxyCodec {
        ProxyCodec::new("https://proxy.test/").unwrap()
    }

    #[test]
    fn encode_is_deterministic() {
        let h = headers(&[("referer", "https://a.test/"), ("origin", "https://a.test")]);
        let first = codec().encode("https://cdn.test/master.m3u8", &h);
        let second = codec().encode("https://cdn.test/master.m3u8", &h);
        assert_eq!(first, second);
        assert!(first.starts_with("https://proxy.test/m3u8-proxy?url=https%3A%2F%2Fcdn.test"));
    }

    #[test]
    fn encode_ignores_insertion_order() {
        let mut a = HeaderList::new();
        a.insert("referer".into(), "r".into());
        a.insert("origin".into(), "o".into());
        let mut b = HeaderList::new();
        b.insert("origin".into(), "o".into());
        b.insert("referer".into(), "r".into());
        assert_eq!(codec().encode("https://x.test", &a), codec().encode("https://x.test", &b));
    }

    #[test]
    fn no_header_is_dropped() {
        let h = headers(&[
            ("referer", "https://a.test/"),
            ("user-agent", "Mozilla/5.0"),
            ("viewport-width", "375"),
            ("x-empty", ""),
        ]);
        let encoded = codec().encode("https://cdn.test/a.m3u8?token=1&x=2", &h);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.target, "https://cdn.test/a.m3u8?token=1&x=2");
        assert_eq!(decoded.headers, h);
    }

    #[test]
    fn rewrap_increments_depth() {
        let c = codec();
        let once = c.wrap("https://cdn.test/a.m3u8", &headers(&[("referer", "r")]));
        assert_eq!(once.depth, 1);
        let twice = c.rewrap(&once, &HeaderList::new());
        assert_eq!(twice.depth, 2);
        assert_eq!(c.depth_of(&twice.url), 2);
        assert_eq!(c.depth_of(&once.url), 1);
        assert_eq!(c.depth_of("https://cdn.test/a.m3u8"), 0);
    }

    #[test]
    fn rejects_non_http_service() {
        assert!(ProxyCodec::new("data:text/plain,x").is_err());
    }

    #[test]
    fn decode_requires_url_parameter() {
        assert!(decode("https://proxy.test/m3u8-proxy?headers=%7B%7D").is_err());
    }
}
