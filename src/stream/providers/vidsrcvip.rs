//! VidSrc.vip JSON API.
//!
//! The API is keyed by an obfuscated TMDB id and answers with numbered
//! `source1`, `source2`, … entries. Each entry becomes a reference to one of
//! the `vidsrc-*` embeds, assigned round-robin.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ScrapeError};
use crate::fetch::{FetchOptions, HeaderList};
use crate::media::{EpisodeRef, MediaKind, MediaRequest};
use crate::proxy::ProxyCodec;
use crate::stream::context::ScrapeContext;
use crate::stream::provider::{CapabilityFlag, EmbedReference, Sourcerer, SourcererOutput};

const API_BASE: &str = "https://api2.vidsrc.vip";
const SITE_ORIGIN: &str = "https://vidsrc.vip";
const PLAYER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Embed ids that sources are spread over, in order.
pub const EMBED_IDS: [&str; 3] = ["vidsrc-comet", "vidsrc-pulsar", "vidsrc-nova"];

pub struct VidSrcVipSourcerer;

/// Obfuscate a TMDB id the way the API expects.
///
/// Episodes use `tmdb-season-episode`; movies map every digit to a letter
/// (`0` → `a` … `9` → `j`). The result is reversed and base64-encoded twice.
#[must_use]
pub fn encode_tmdb_id(tmdb_id: &str, episode: Option<EpisodeRef>) -> String {
    let raw: String = match episode {
        Some(EpisodeRef { season, episode }) if season > 0 && episode > 0 => {
            format!("{tmdb_id}-{season}-{episode}")
        }
        _ => tmdb_id
            .chars()
            .map(|c| c.to_digit(10).and_then(|d| char::from_digit(d + 10, 36)).unwrap_or(c))
            .collect(),
    };
    let reversed: String = raw.chars().rev().collect();
    STANDARD.encode(STANDARD.encode(reversed))
}

fn playback_headers() -> HeaderList {
    [
        ("Referer", format!("{SITE_ORIGIN}/")),
        ("Origin", SITE_ORIGIN.to_string()),
        ("User-Agent", PLAYER_USER_AGENT.to_string()),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect()
}

fn looks_like_hls(url: &str) -> bool {
    url.contains(".m3u8") || url.contains("hls")
}

/// Turn the numbered sources of an API answer into embed references.
fn embeds_from(data: &Value, proxy: &ProxyCodec) -> Result<Vec<EmbedReference>> {
    if data.get("source1").is_none_or(Value::is_null) {
        return Err(ScrapeError::not_found("no sources found"));
    }

    let headers = playback_headers();
    let mut embeds = Vec::new();
    for index in 1.. {
        let Some(source) = data.get(format!("source{index}")).filter(|s| !s.is_null()) else {
            break;
        };
        let Some(url) = source.get("url").and_then(Value::as_str).filter(|u| !u.is_empty()) else {
            continue;
        };
        let url = if looks_like_hls(url) {
            proxy.wrap(url, &headers).url
        } else {
            url.to_string()
        };
        let embed_id = EMBED_IDS[embeds.len() % EMBED_IDS.len()];
        embeds.push(EmbedReference::new(embed_id, url));
    }

    if embeds.is_empty() {
        return Err(ScrapeError::not_found("no embeds found"));
    }
    Ok(embeds)
}

impl VidSrcVipSourcerer {
    async fn scrape(&self, ctx: &ScrapeContext, media: &MediaRequest) -> Result<SourcererOutput> {
        let api_type = match media.kind() {
            MediaKind::Movie => "movie",
            MediaKind::Show => "tv",
        };
        let url = format!(
            "{API_BASE}/{api_type}/{}",
            encode_tmdb_id(&media.tmdb_id, media.episode)
        );

        let data: Value = ctx.proxied_fetcher.json(&url, FetchOptions::new()).await?;
        ctx.progress(60);

        let embeds = embeds_from(&data, &ctx.proxy)?;
        debug!(count = embeds.len(), "vidsrcvip sources");
        Ok(SourcererOutput::Embeds(embeds))
    }
}

#[async_trait]
impl Sourcerer for VidSrcVipSourcerer {
    fn id(&self) -> &'static str {
        "vidsrcvip"
    }

    fn name(&self) -> &'static str {
        "VidSrc.vip"
    }

    fn rank(&self) -> i32 {
        150
    }

    fn flags(&self) -> &'static [CapabilityFlag] {
        &[CapabilityFlag::CorsAllowed]
    }

    async fn scrape_movie(
        &self,
        ctx: &ScrapeContext,
        media: &MediaRequest,
    ) -> Result<SourcererOutput> {
        self.scrape(ctx, media).await
    }

    async fn scrape_show(
        &self,
        ctx: &ScrapeContext,
        media: &MediaRequest,
    ) -> Result<SourcererOutput> {
        self.scrape(ctx, media).await
    }
}
