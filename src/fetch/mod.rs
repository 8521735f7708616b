//! Outbound fetch layer shared by every provider and caption backend.
//!
//! # Architecture
//!
//! - [`compose`]: joins base URL, path and query into a validated [`url::Url`]
//! - [`Fetcher`]: uniform defaults over an injected [`Transport`]
//! - [`ReqwestTransport`] / [`ProxiedTransport`]: the transports shipped
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use reelfetch::fetch::{FetchOptions, Fetcher, ReqwestTransport};
//!
//! # async fn example() -> reelfetch::Result<()> {
//! let fetcher = Fetcher::new(Arc::new(ReqwestTransport::new()?));
//! let page = fetcher
//!     .text("/search", FetchOptions::new().base_url("https://example.com").query("q", "alien"))
//!     .await?;
//! println!("{} bytes", page.len());
//! # Ok(())
//! # }
//! ```

pub mod fetcher;
pub mod profile;
pub mod transport;
pub mod url;

use std::collections::BTreeMap;

pub use self::fetcher::{Body, FetchOptions, Fetcher, FullResponse, RequestBody};
pub use self::transport::{
    ProxiedTransport, ReqwestTransport, Transport, TransportRequest, TransportResponse,
};
pub use self::url::{compose, UrlParts};

/// Header map. Ordered so that anything built from it is deterministic.
pub type HeaderList = BTreeMap<String, String>;

/// Query parameters, set on the composed URL in key order.
pub type QueryMap = BTreeMap<String, String>;

/// How cookies and credentials accompany a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsMode {
    Omit,
    SameOrigin,
    Include,
}
