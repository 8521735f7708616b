//! VidLink: movie pages with a plain `<video src>` pointing at its CDN.

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::error::{Result, ScrapeError};
use crate::fetch::FetchOptions;
use crate::media::{MediaKind, MediaRequest};
use crate::stream::context::ScrapeContext;
use crate::stream::provider::{EmbedReference, Sourcerer, SourcererOutput};

const BASE_URL: &str = "https://vidlink.pro";
const CDN_HOST: &str = "hurricane.vidlvod.store";

pub struct VidLinkSourcerer;

/// `src` of the first `<video>` element.
fn video_src(html: &str) -> Option<String> {
    let selector = Selector::parse("video").ok()?;
    Html::parse_document(html)
        .select(&selector)
        .next()?
        .value()
        .attr("src")
        .map(str::to_string)
}

#[async_trait]
impl Sourcerer for VidLinkSourcerer {
    fn id(&self) -> &'static str {
        "vidlink"
    }

    fn name(&self) -> &'static str {
        "VidLink"
    }

    fn rank(&self) -> i32 {
        100
    }

    fn supports(&self, kind: MediaKind) -> bool {
        kind == MediaKind::Movie
    }

    async fn scrape_movie(
        &self,
        ctx: &ScrapeContext,
        media: &MediaRequest,
    ) -> Result<SourcererOutput> {
        ctx.progress(50);
        let html = ctx
            .proxied_fetcher
            .text(&format!("/movie/{}", media.tmdb_id), FetchOptions::new().base_url(BASE_URL))
            .await?;

        let src = video_src(&html)
            .filter(|src| src.contains(CDN_HOST))
            .ok_or_else(|| ScrapeError::not_found("no video source on the movie page"))?;

        ctx.progress(90);
        Ok(SourcererOutput::Embeds(vec![EmbedReference::new(
            "vidlink-proxy",
            src,
        )]))
    }
}
