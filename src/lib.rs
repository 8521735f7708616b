//! `reelfetch` - resolve movies and episodes into playable streams
//!
//! # Features
//!
//! - **Ranked fallback**: source sites are tried best-first, then the embed
//!   players they point at, until one yields a stream
//! - **Stream proxy URLs**: playlists that need specific headers are wrapped
//!   for an external proxy service, with nesting depth tracked
//! - **Captions**: site subtitles merged with Wyzie and OpenSubtitles
//!   lookups, each under its own time budget
//! - **Shared fetch layer**: URL composition, browser profiles and an
//!   optional fetch proxy, behind an injectable transport
//!
//! # Example
//!
//! ```rust,no_run
//! use reelfetch::{Config, MediaRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runner = Config::load()?.runner()?;
//!     let media = MediaRequest::movie("Heat", 1995, "949").with_imdb_id("tt0113277");
//!     let found = runner.run(&media).await?;
//!     println!("{} via {}", found.stream.id, found.source_id);
//!     Ok(())
//! }
//! ```

pub mod captions;
pub mod config;
pub mod error;
pub mod fetch;
pub mod media;
pub mod proxy;
pub mod registry;
pub mod runner;
pub mod stream;

pub use captions::{Caption, CaptionAggregator, CaptionFormat, CaptionOrigin};
pub use config::Config;
pub use error::{Result, ScrapeError};
pub use fetch::{FetchOptions, Fetcher, Transport};
pub use media::{decode_media_bundle, encode_media_bundle, MediaKind, MediaRequest};
pub use proxy::{ProxiedUrl, ProxyCodec};
pub use registry::{Registry, RegistryBuilder};
pub use runner::{EventSink, RunEvent, RunOutput, Runner, UpdateStatus};
pub use stream::{
    CapabilityFlag, Embed, EmbedReference, ScrapeContext, Sourcerer, SourcererOutput, Stream,
    StreamKind,
};

/// Version of reelfetch
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
