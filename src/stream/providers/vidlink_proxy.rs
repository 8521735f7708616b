//! VidLink's CDN only serves requests that look like they come from its
//! player, so playlists go out through the proxy with its referer.

use async_trait::async_trait;

use crate::error::{Result, ScrapeError};
use crate::fetch::HeaderList;
use crate::proxy::ProxiedUrl;
use crate::stream::context::ScrapeContext;
use crate::stream::provider::{Embed, Stream};

const PLAYER_ORIGIN: &str = "https://videostr.net";

pub struct VidLinkProxyEmbed;

#[async_trait]
impl Embed for VidLinkProxyEmbed {
    fn id(&self) -> &'static str {
        "vidlink-proxy"
    }

    fn name(&self) -> &'static str {
        "VidLink Proxy"
    }

    fn rank(&self) -> i32 {
        110
    }

    async fn scrape_embed(&self, ctx: &ScrapeContext, url: &str) -> Result<Vec<Stream>> {
        if url.is_empty() {
            return Err(ScrapeError::not_found("vidlink-proxy: empty url"));
        }
        ctx.progress(40);

        let headers: HeaderList = [
            ("referer".to_string(), format!("{PLAYER_ORIGIN}/")),
            ("origin".to_string(), PLAYER_ORIGIN.to_string()),
        ]
        .into_iter()
        .collect();

        let playlist = if ctx.proxy.is_proxied(url) {
            let inner = ProxiedUrl {
                url: url.to_string(),
                depth: ctx.proxy.depth_of(url),
            };
            ctx.proxy.rewrap(&inner, &headers)
        } else {
            ctx.proxy.wrap(url, &headers)
        };

        ctx.progress(80);
        Ok(vec![Stream::proxied_hls("primary", playlist)])
    }
}
