//! Concurrent, timeout-bounded caption lookups.
//!
//! Every backend gets its own deadline and is awaited independently; the
//! merge happens after each one has either answered or run out of time. A
//! backend that times out or errors contributes nothing; its in-flight
//! request is dropped, not retried. [`CaptionAggregator::augment`] never
//! fails.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use super::{label_to_language_code, normalize_languages, Caption, CaptionFormat, CaptionOrigin};
use crate::error::Result;
use crate::media::decode_media_bundle;

/// Identifiers a backend searches by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionQuery {
    pub imdb_id: String,
    pub tmdb_id: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl CaptionQuery {
    /// Season and episode, only when both are known.
    #[must_use]
    pub fn season_episode(&self) -> Option<(u32, u32)> {
        self.season.zip(self.episode)
    }
}

/// A subtitle as a backend reports it, before language normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleDescriptor {
    pub id: String,
    pub url: String,
    pub format: CaptionFormat,
    /// Free-text label or code, e.g. `"English"`, `"pt-BR"`.
    pub language: String,
}

/// An external subtitle search service.
#[async_trait]
pub trait CaptionBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Origin tag stamped on this backend's captions.
    fn origin(&self) -> CaptionOrigin;

    async fn search(&self, query: &CaptionQuery) -> Result<Vec<SubtitleDescriptor>>;
}

struct Slot {
    backend: Arc<dyn CaptionBackend>,
    timeout: Duration,
}

/// Runs every registered backend concurrently under its own timeout.
#[derive(Default)]
pub struct CaptionAggregator {
    slots: Vec<Slot>,
}

impl std::fmt::Debug for CaptionAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|s| (s.backend.name(), s.timeout)))
            .finish()
    }
}

impl CaptionAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a backend with its time budget. Results are appended in
    /// registration order.
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn CaptionBackend>, timeout: Duration) -> Self {
        self.slots.push(Slot { backend, timeout });
        self
    }

    /// Number of registered backends.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Append captions from every backend to `existing`.
    ///
    /// `bundle` is the base64 identifier bundle (see
    /// [`encode_media_bundle`](crate::media::encode_media_bundle)). Without
    /// an IMDB id the lookups go by `tmdb_id`; if there is neither, or the
    /// bundle can't be decoded, no backend is asked. `existing` always has
    /// its languages normalized, and unmappable ones are dropped.
    pub async fn augment(
        &self,
        existing: Vec<Caption>,
        bundle: &str,
        tmdb_id: Option<&str>,
    ) -> Vec<Caption> {
        let existing = normalize_languages(existing);
        let tmdb_id = tmdb_id.filter(|id| !id.is_empty()).map(str::to_string);

        let decoded = match decode_media_bundle(bundle) {
            Ok(decoded) if !decoded.imdb_id.is_empty() || tmdb_id.is_some() => decoded,
            Ok(_) => return existing,
            Err(err) => {
                warn!(error = %err, "caption bundle could not be decoded");
                return existing;
            }
        };

        let query = CaptionQuery {
            imdb_id: decoded.imdb_id,
            tmdb_id,
            season: decoded.season,
            episode: decoded.episode,
        };

        let lookups = self.slots.iter().map(|slot| run_slot(slot, &query));
        let contributions = join_all(lookups).await;

        let mut captions = existing;
        for contribution in contributions {
            captions.extend(contribution);
        }
        captions
    }
}

async fn run_slot(slot: &Slot, query: &CaptionQuery) -> Vec<Caption> {
    let name = slot.backend.name();
    match tokio::time::timeout(slot.timeout, slot.backend.search(query)).await {
        Ok(Ok(found)) => {
            let total = found.len();
            let captions = normalize(found, slot.backend.origin());
            debug!(
                backend = name,
                total,
                kept = captions.len(),
                "caption backend answered"
            );
            captions
        }
        Ok(Err(err)) => {
            warn!(backend = name, error = %err, "caption backend failed");
            Vec::new()
        }
        Err(_) => {
            warn!(
                backend = name,
                timeout_ms = slot.timeout.as_millis(),
                "caption backend timed out"
            );
            Vec::new()
        }
    }
}

fn normalize(found: Vec<SubtitleDescriptor>, origin: CaptionOrigin) -> Vec<Caption> {
    found
        .into_iter()
        .filter(|d| !d.url.is_empty())
        .filter_map(|d| {
            let language = label_to_language_code(&d.language)?;
            Some(Caption {
                id: d.id,
                url: d.url,
                format: d.format,
                language,
                has_cors_restrictions: false,
                origin,
            })
        })
        .collect()
}
