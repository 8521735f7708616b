//! Per-attempt scrape context.

use std::sync::Arc;

use crate::fetch::Fetcher;
use crate::media::MediaRequest;
use crate::proxy::ProxyCodec;

/// Progress callback, called with a percentage in `0..=100`.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// What a provider gets for one scrape attempt.
///
/// `proxied_fetcher` goes through the simple-proxy service when one is
/// configured and is what providers should use for site requests; `fetcher`
/// always goes direct.
#[derive(Clone)]
pub struct ScrapeContext {
    pub media: Arc<MediaRequest>,
    pub proxied_fetcher: Fetcher,
    pub fetcher: Fetcher,
    pub proxy: ProxyCodec,
    progress: ProgressFn,
}

impl std::fmt::Debug for ScrapeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrapeContext")
            .field("media", &self.media)
            .field("proxy", &self.proxy)
            .finish_non_exhaustive()
    }
}

impl ScrapeContext {
    pub fn new(
        media: Arc<MediaRequest>,
        proxied_fetcher: Fetcher,
        fetcher: Fetcher,
        proxy: ProxyCodec,
    ) -> Self {
        Self {
            media,
            proxied_fetcher,
            fetcher,
            proxy,
            progress: Arc::new(|_| {}),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = progress;
        self
    }

    /// Report progress. Values above 100 are clamped.
    pub fn progress(&self, percent: u8) {
        (self.progress)(percent.min(100));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fetch::transport::tests::RecordingTransport;
    use std::sync::Mutex;

    /// Context whose fetchers both answer with the given transport.
    pub(crate) fn context_with(transport: Arc<RecordingTransport>, media: MediaRequest) -> ScrapeContext {
        let fetcher = Fetcher::new(transport);
        ScrapeContext::new(
            Arc::new(media),
            fetcher.clone(),
            fetcher,
            ProxyCodec::new("https://proxy.test").unwrap(),
        )
    }

    #[test]
    fn progress_is_clamped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let ctx = context_with(
            Arc::new(RecordingTransport::new(200, "text/plain", "")),
            MediaRequest::movie("Heat", 1995, "949"),
        )
        .with_progress(Arc::new(move |p| sink.lock().unwrap().push(p)));

        ctx.progress(40);
        ctx.progress(250);
        assert_eq!(*seen.lock().unwrap(), vec![40, 100]);
    }
}
