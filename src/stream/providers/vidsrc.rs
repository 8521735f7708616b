//! The `vidsrc-*` players.
//!
//! The sourcerer already hands over a playable URL, proxy-wrapped when it
//! is HLS, so these embeds only classify it.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::{Result, ScrapeError};
use crate::stream::context::ScrapeContext;
use crate::stream::provider::{CapabilityFlag, Embed, Stream};

pub struct VidSrcEmbed {
    id: &'static str,
    name: &'static str,
    rank: i32,
}

impl VidSrcEmbed {
    pub fn comet() -> Self {
        Self {
            id: "vidsrc-comet",
            name: "Comet",
            rank: 39,
        }
    }

    pub fn pulsar() -> Self {
        Self {
            id: "vidsrc-pulsar",
            name: "Pulsar",
            rank: 38,
        }
    }

    pub fn nova() -> Self {
        Self {
            id: "vidsrc-nova",
            name: "Nova",
            rank: 37,
        }
    }
}

#[async_trait]
impl Embed for VidSrcEmbed {
    fn id(&self) -> &'static str {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn rank(&self) -> i32 {
        self.rank
    }

    async fn scrape_embed(&self, ctx: &ScrapeContext, url: &str) -> Result<Vec<Stream>> {
        if url.is_empty() {
            return Err(ScrapeError::not_found(format!("{}: empty url", self.id)));
        }

        let flags = [CapabilityFlag::CorsAllowed];
        let stream = if ctx.proxy.is_proxied(url) {
            let mut stream = Stream::hls("primary", url);
            stream.proxy_depth = ctx.proxy.depth_of(url);
            stream
        } else if url.contains(".m3u8") {
            Stream::hls("primary", url)
        } else {
            Stream::file(
                "primary",
                BTreeMap::from([("unknown".to_string(), url.to_string())]),
            )
        };

        ctx.progress(100);
        Ok(vec![stream.with_flags(&flags)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::transport::tests::RecordingTransport;
    use crate::fetch::HeaderList;
    use crate::media::MediaRequest;
    use crate::stream::context::tests::context_with;
    use crate::stream::provider::StreamKind;
    use std::sync::Arc;

    fn ctx() -> ScrapeContext {
        context_with(
            Arc::new(RecordingTransport::new(200, "text/plain", "")),
            MediaRequest::movie("Heat", 1995, "949"),
        )
    }

    #[tokio::test]
    async fn proxied_url_keeps_its_depth() {
        let ctx = ctx();
        let wrapped = ctx.proxy.wrap("https://cdn.test/a.m3u8", &HeaderList::new());

        let streams = VidSrcEmbed::comet().scrape_embed(&ctx, &wrapped.url).await.unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].kind(), StreamKind::Hls);
        assert_eq!(streams[0].proxy_depth, 1);
        assert!(streams[0].has_flag(CapabilityFlag::CorsAllowed));
    }

    #[tokio::test]
    async fn plain_urls_are_classified() {
        let ctx = ctx();
        let hls = VidSrcEmbed::pulsar()
            .scrape_embed(&ctx, "https://cdn.test/b.m3u8")
            .await
            .unwrap();
        assert_eq!(hls[0].kind(), StreamKind::Hls);
        assert_eq!(hls[0].proxy_depth, 0);

        let file = VidSrcEmbed::nova()
            .scrape_embed(&ctx, "https://cdn.test/b.mp4")
            .await
            .unwrap();
        assert_eq!(file[0].kind(), StreamKind::File);
        assert_eq!(file[0].primary_url(), Some("https://cdn.test/b.mp4"));
    }

    #[tokio::test]
    async fn empty_url_is_not_found() {
        let err = VidSrcEmbed::comet().scrape_embed(&ctx(), "").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
