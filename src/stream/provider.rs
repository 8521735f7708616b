//! Provider contract and the stream types providers produce.
//!
//! A [`Sourcerer`] knows one source site: given a movie or episode it
//! returns either playable [`Stream`]s or [`EmbedReference`]s pointing at
//! third-party players. An [`Embed`] turns one such reference into streams.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::context::ScrapeContext;
use crate::captions::Caption;
use crate::error::{Result, ScrapeError};
use crate::fetch::HeaderList;
use crate::media::{MediaKind, MediaRequest};
use crate::proxy::ProxiedUrl;

/// Environment capability a provider or stream needs or grants.
///
/// Only ever used for filtering, never for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityFlag {
    /// Fetchable directly from a browser; the origin sends permissive CORS
    /// headers.
    CorsAllowed,
    /// Only playable from the IP that resolved it.
    IpLocked,
}

/// Playlist or progressive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Hls,
    File,
}

/// Where the media bytes live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamSource {
    /// HLS master or media playlist, possibly proxy-encoded.
    Hls { playlist: String },
    /// Progressive files keyed by quality label (`"1080"`, `"720"`,
    /// `"unknown"`).
    File { qualities: BTreeMap<String, String> },
}

/// A playable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    pub id: String,
    #[serde(flatten)]
    pub source: StreamSource,
    pub flags: Vec<CapabilityFlag>,
    pub captions: Vec<Caption>,
    /// Headers a player must send when it fetches the media itself.
    #[serde(default, skip_serializing_if = "HeaderList::is_empty")]
    pub headers: HeaderList,
    /// How many times the playlist URL has been proxy-wrapped.
    #[serde(default)]
    pub proxy_depth: u8,
}

impl Stream {
    pub fn hls(id: impl Into<String>, playlist: impl Into<String>) -> Self {
        Self::new(
            id,
            StreamSource::Hls {
                playlist: playlist.into(),
            },
        )
    }

    pub fn file(id: impl Into<String>, qualities: BTreeMap<String, String>) -> Self {
        Self::new(id, StreamSource::File { qualities })
    }

    /// HLS stream whose playlist went through the proxy codec; the depth is
    /// taken from the wrapped URL.
    pub fn proxied_hls(id: impl Into<String>, playlist: ProxiedUrl) -> Self {
        let mut stream = Self::hls(id, playlist.url);
        stream.proxy_depth = playlist.depth;
        stream
    }

    fn new(id: impl Into<String>, source: StreamSource) -> Self {
        Self {
            id: id.into(),
            source,
            flags: Vec::new(),
            captions: Vec::new(),
            headers: HeaderList::new(),
            proxy_depth: 0,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: &[CapabilityFlag]) -> Self {
        self.flags = flags.to_vec();
        self
    }

    #[must_use]
    pub fn with_captions(mut self, captions: Vec<Caption>) -> Self {
        self.captions = captions;
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderList) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn kind(&self) -> StreamKind {
        match self.source {
            StreamSource::Hls { .. } => StreamKind::Hls,
            StreamSource::File { .. } => StreamKind::File,
        }
    }

    #[must_use]
    pub fn has_flag(&self, flag: CapabilityFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// The URL a player should open first: the playlist, or the highest
    /// numeric quality of a file stream.
    #[must_use]
    pub fn primary_url(&self) -> Option<&str> {
        match &self.source {
            StreamSource::Hls { playlist } => Some(playlist.as_str()),
            StreamSource::File { qualities } => qualities
                .iter()
                .max_by_key(|(quality, _)| quality.parse::<u32>().unwrap_or(0))
                .map(|(_, url)| url.as_str()),
        }
    }
}

/// Pointer to a third-party player that an [`Embed`] can resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedReference {
    pub embed_id: String,
    pub url: String,
}

impl EmbedReference {
    pub fn new(embed_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            embed_id: embed_id.into(),
            url: url.into(),
        }
    }
}

/// What a [`Sourcerer`] found: embeds to resolve next, or direct streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourcererOutput {
    Embeds(Vec<EmbedReference>),
    Streams(Vec<Stream>),
}

impl SourcererOutput {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Embeds(embeds) => embeds.is_empty(),
            Self::Streams(streams) => streams.is_empty(),
        }
    }
}

/// A source site.
///
/// Implementations signal "nothing here" with [`ScrapeError::NotFound`]
/// rather than an empty output.
#[async_trait]
pub trait Sourcerer: Send + Sync {
    /// Stable lowercase id (e.g., `"vidsrcvip"`).
    fn id(&self) -> &'static str;

    /// Display name.
    fn name(&self) -> &'static str;

    /// Higher ranks are tried first.
    fn rank(&self) -> i32;

    fn flags(&self) -> &'static [CapabilityFlag] {
        &[]
    }

    /// Disabled sourcerers stay registered but are never ranked.
    fn disabled(&self) -> bool {
        false
    }

    /// Media kinds this sourcerer handles. Both by default.
    fn supports(&self, kind: MediaKind) -> bool {
        let _ = kind;
        true
    }

    async fn scrape_movie(
        &self,
        ctx: &ScrapeContext,
        media: &MediaRequest,
    ) -> Result<SourcererOutput> {
        let _ = (ctx, media);
        Err(ScrapeError::Unsupported(format!("{} has no movies", self.id())))
    }

    async fn scrape_show(
        &self,
        ctx: &ScrapeContext,
        media: &MediaRequest,
    ) -> Result<SourcererOutput> {
        let _ = (ctx, media);
        Err(ScrapeError::Unsupported(format!("{} has no shows", self.id())))
    }
}

/// A third-party player.
#[async_trait]
pub trait Embed: Send + Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn rank(&self) -> i32;

    fn disabled(&self) -> bool {
        false
    }

    /// Resolve an embed URL or token into streams.
    async fn scrape_embed(&self, ctx: &ScrapeContext, url: &str) -> Result<Vec<Stream>>;
}
