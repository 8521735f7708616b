//! Ranked-fallback resolution.
//!
//! Sourcerers are tried one at a time, best rank first. A sourcerer that
//! answers with embed references has those tried in the order it listed
//! them; the first stream found wins and nothing after it is invoked. Every failure
//! along the way (not found, unknown embed, HTTP, parse) only moves on to
//! the next candidate. The caller sees an error only once every candidate
//! has been tried.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::captions::{dedupe_by_url, normalize_languages, CaptionAggregator};
use crate::error::{Result, ScrapeError};
use crate::fetch::Fetcher;
use crate::media::{encode_media_bundle, MediaRequest};
use crate::proxy::ProxyCodec;
use crate::registry::Registry;
use crate::stream::{
    CapabilityFlag, Embed, EmbedReference, ProgressFn, ScrapeContext, Sourcerer, SourcererOutput,
    Stream,
};

/// Outcome reported with an [`RunEvent::Update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    Pending,
    Success,
    Failure,
    NotFound,
}

/// Progress notifications for a caller-supplied sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum RunEvent {
    /// Sourcerer ids about to be tried, in order.
    Init { source_ids: Vec<String> },
    /// An attempt begins; its progress starts from zero.
    Start { id: String },
    Update {
        id: String,
        percent: u8,
        status: UpdateStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// A sourcerer returned embeds. `embeds` pairs each attempt id with its
    /// embed id.
    DiscoverEmbeds {
        source_id: String,
        embeds: Vec<(String, String)>,
    },
}

pub type EventSink = Arc<dyn Fn(RunEvent) + Send + Sync>;

/// The winning stream and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutput {
    pub source_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_id: Option<String>,
    pub stream: Stream,
}

/// Drives resolutions against a [`Registry`].
pub struct Runner {
    registry: Arc<Registry>,
    proxied_fetcher: Fetcher,
    fetcher: Fetcher,
    proxy: ProxyCodec,
    captions: Option<Arc<CaptionAggregator>>,
    required_flags: Vec<CapabilityFlag>,
    events: Option<EventSink>,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("registry", &self.registry)
            .field("proxy", &self.proxy)
            .field("required_flags", &self.required_flags)
            .finish_non_exhaustive()
    }
}

impl Runner {
    pub fn new(
        registry: Arc<Registry>,
        proxied_fetcher: Fetcher,
        fetcher: Fetcher,
        proxy: ProxyCodec,
    ) -> Self {
        Self {
            registry,
            proxied_fetcher,
            fetcher,
            proxy,
            captions: None,
            required_flags: Vec::new(),
            events: None,
        }
    }

    /// Append external captions to the winning stream.
    #[must_use]
    pub fn with_captions(mut self, aggregator: Arc<CaptionAggregator>) -> Self {
        self.captions = Some(aggregator);
        self
    }

    /// Only consider sourcerers and streams carrying all of `flags`.
    #[must_use]
    pub fn with_required_flags(mut self, flags: Vec<CapabilityFlag>) -> Self {
        self.required_flags = flags;
        self
    }

    #[must_use]
    pub fn with_events(mut self, sink: EventSink) -> Self {
        self.events = Some(sink);
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolve `media` to one playable stream.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::AllProvidersExhausted`] when no sourcerer or embed
    /// produced a usable stream.
    pub async fn run(&self, media: &MediaRequest) -> Result<RunOutput> {
        let media = Arc::new(media.clone());
        let sources = self
            .registry
            .ranked_sourcerers_with(media.kind(), &self.required_flags);

        self.emit(RunEvent::Init {
            source_ids: sources.iter().map(|s| s.id().to_string()).collect(),
        });

        let mut attempted = 0;
        for source in &sources {
            attempted += 1;
            let source_id = source.id();
            self.emit(RunEvent::Start {
                id: source_id.to_string(),
            });

            let ctx = self.context(&media, source_id);
            let output = match scrape_source(source.as_ref(), &ctx, &media).await {
                Ok(output) => output,
                Err(err) => {
                    self.fail(source_id, &err);
                    continue;
                }
            };
            self.succeed(source_id);

            match output {
                SourcererOutput::Streams(streams) => {
                    let Some(stream) = self.playable(streams) else {
                        self.fail(source_id, &ScrapeError::not_found("no playable stream"));
                        continue;
                    };
                    return Ok(self.finish(&media, source_id, None, stream).await);
                }
                SourcererOutput::Embeds(embeds) => {
                    if let Some(found) = self.try_embeds(&media, source_id, embeds).await {
                        return Ok(found);
                    }
                }
            }
        }

        info!(attempted, kind = %media.kind(), "all providers exhausted");
        Err(ScrapeError::AllProvidersExhausted { attempted })
    }

    /// Run one sourcerer by id and return its raw output.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::UnknownSource`] for an unknown or disabled id,
    /// [`ScrapeError::Unsupported`] if it can't handle the media kind, and
    /// [`ScrapeError::NotFound`] for empty output. Provider errors are
    /// returned as is.
    pub async fn run_source(&self, id: &str, media: &MediaRequest) -> Result<SourcererOutput> {
        let source = self.registry.sourcerer(id)?;
        if !source.supports(media.kind()) {
            return Err(ScrapeError::Unsupported(format!(
                "{id} does not handle {}",
                media.kind()
            )));
        }
        let media = Arc::new(media.clone());
        let ctx = self.context(&media, id);
        scrape_source(source.as_ref(), &ctx, &media).await
    }

    /// Run one embed by id on `url`.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::UnknownEmbed`] for an unknown or disabled id and
    /// [`ScrapeError::NotFound`] when it yields no streams.
    pub async fn run_embed(&self, id: &str, url: &str, media: &MediaRequest) -> Result<Vec<Stream>> {
        let embed = self.registry.embed_for(id)?;
        let media = Arc::new(media.clone());
        let ctx = self.context(&media, id);
        let streams = embed.scrape_embed(&ctx, url).await?;
        if streams.is_empty() {
            return Err(ScrapeError::not_found(format!("{id} returned no streams")));
        }
        Ok(streams)
    }

    async fn try_embeds(
        &self,
        media: &Arc<MediaRequest>,
        source_id: &str,
        embeds: Vec<EmbedReference>,
    ) -> Option<RunOutput> {
        let attempts: Vec<(String, EmbedReference)> = embeds
            .into_iter()
            .enumerate()
            .map(|(i, embed)| (format!("{source_id}-{i}"), embed))
            .collect();

        self.emit(RunEvent::DiscoverEmbeds {
            source_id: source_id.to_string(),
            embeds: attempts
                .iter()
                .map(|(id, embed)| (id.clone(), embed.embed_id.clone()))
                .collect(),
        });

        for (attempt_id, reference) in attempts {
            self.emit(RunEvent::Start {
                id: attempt_id.clone(),
            });

            let embed = match self.registry.embed_for(&reference.embed_id) {
                Ok(embed) => embed,
                Err(err) => {
                    self.fail(&attempt_id, &err);
                    continue;
                }
            };

            let ctx = self.context(media, &attempt_id);
            let stream = match embed.scrape_embed(&ctx, &reference.url).await {
                Ok(streams) => self.playable(streams),
                Err(err) => {
                    self.fail(&attempt_id, &err);
                    continue;
                }
            };
            let Some(stream) = stream else {
                self.fail(&attempt_id, &ScrapeError::not_found("no playable stream"));
                continue;
            };

            self.succeed(&attempt_id);
            return Some(
                self.finish(media, source_id, Some(reference.embed_id), stream)
                    .await,
            );
        }
        None
    }

    /// First stream carrying every required flag.
    fn playable(&self, streams: Vec<Stream>) -> Option<Stream> {
        streams
            .into_iter()
            .find(|s| self.required_flags.iter().all(|flag| s.has_flag(*flag)))
    }

    async fn finish(
        &self,
        media: &MediaRequest,
        source_id: &str,
        embed_id: Option<String>,
        mut stream: Stream,
    ) -> RunOutput {
        let mut captions = normalize_languages(std::mem::take(&mut stream.captions));
        if let Some(aggregator) = &self.captions {
            let bundle = media.caption_bundle().unwrap_or_else(|| {
                encode_media_bundle(
                    "",
                    media.episode.map(|e| e.season),
                    media.episode.map(|e| e.episode),
                )
            });
            captions = aggregator
                .augment(captions, &bundle, Some(media.tmdb_id.as_str()))
                .await;
        }
        stream.captions = dedupe_by_url(captions);

        info!(
            source = source_id,
            embed = embed_id.as_deref().unwrap_or("-"),
            captions = stream.captions.len(),
            "resolved"
        );
        RunOutput {
            source_id: source_id.to_string(),
            embed_id,
            stream,
        }
    }

    fn context(&self, media: &Arc<MediaRequest>, attempt_id: &str) -> ScrapeContext {
        let ctx = ScrapeContext::new(
            media.clone(),
            self.proxied_fetcher.clone(),
            self.fetcher.clone(),
            self.proxy.clone(),
        );
        match &self.events {
            Some(sink) => {
                let sink = sink.clone();
                let id = attempt_id.to_string();
                let progress: ProgressFn = Arc::new(move |percent| {
                    sink(RunEvent::Update {
                        id: id.clone(),
                        percent,
                        status: UpdateStatus::Pending,
                        reason: None,
                    });
                });
                ctx.with_progress(progress)
            }
            None => ctx,
        }
    }

    fn emit(&self, event: RunEvent) {
        if let Some(sink) = &self.events {
            sink(event);
        }
    }

    fn succeed(&self, id: &str) {
        self.emit(RunEvent::Update {
            id: id.to_string(),
            percent: 100,
            status: UpdateStatus::Success,
            reason: None,
        });
    }

    fn fail(&self, id: &str, err: &ScrapeError) {
        debug!(provider = id, error = %err, "provider failed, falling back");
        let status = if err.is_not_found() {
            UpdateStatus::NotFound
        } else {
            UpdateStatus::Failure
        };
        self.emit(RunEvent::Update {
            id: id.to_string(),
            percent: 100,
            status,
            reason: Some(err.to_string()),
        });
    }
}

/// Call the right scrape method for the media kind. Empty output counts as
/// not found.
async fn scrape_source(
    source: &dyn Sourcerer,
    ctx: &ScrapeContext,
    media: &MediaRequest,
) -> Result<SourcererOutput> {
    let output = if media.episode.is_some() {
        source.scrape_show(ctx, media).await?
    } else {
        source.scrape_movie(ctx, media).await?
    };
    if output.is_empty() {
        return Err(ScrapeError::not_found(format!(
            "{} returned nothing",
            source.id()
        )));
    }
    Ok(output)
}
