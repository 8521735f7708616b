//! SoaperTV: title search, an episode list for shows, then an info endpoint
//! that hands out playlist paths and subtitle files.

use std::collections::HashMap;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tracing::debug;

use crate::captions::{normalize_site_label, Caption, CaptionFormat};
use crate::error::{Result, ScrapeError};
use crate::fetch::{FetchOptions, HeaderList};
use crate::media::MediaRequest;
use crate::stream::context::ScrapeContext;
use crate::stream::provider::{CapabilityFlag, Sourcerer, SourcererOutput, Stream};

const BASE_URL: &str = "https://soaper.cc";
const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 18_0 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.0 Mobile/15E148 Safari/604.1";

/// Subtitle names the site uses that the shared table reads differently.
static SITE_LANGUAGES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("chinese - hong kong", "zh"),
        ("chinese - traditional", "zh"),
        ("english - sdh", "en"),
        ("portuguese - brazilian", "pt"),
        ("protuguese (br)", "pt-br"),
        ("spanish - european", "es"),
        ("spanish - latin american", "es"),
        ("indonesia", "id"),
    ]
    .into_iter()
    .collect()
});

pub struct SoaperTvSourcerer;

#[derive(Debug, Deserialize)]
struct InfoResponse {
    val: String,
    #[serde(default)]
    val_bak: Option<String>,
    #[serde(default)]
    subs: Vec<Subtitle>,
}

#[derive(Debug, Deserialize)]
struct Subtitle {
    name: String,
    path: String,
}

#[derive(Debug, PartialEq, Eq)]
struct SearchHit {
    title: String,
    year: Option<u16>,
    url: String,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::Other(format!("bad selector {css}: {e}")))
}

fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
}

fn search_hits(html: &str) -> Result<Vec<SearchHit>> {
    let card = selector(".thumbnail")?;
    let link = selector("h5 a")?;
    let year = selector(".img-tip")?;

    let document = Html::parse_document(html);
    let hits = document
        .select(&card)
        .filter_map(|card| {
            let anchor = card.select(&link).next()?;
            let title = anchor.text().collect::<String>().trim().to_string();
            let url = anchor.value().attr("href")?.to_string();
            if title.is_empty() || url.is_empty() {
                return None;
            }
            let year = first_text(card, &year).and_then(|y| y.parse().ok());
            Some(SearchHit { title, year, url })
        })
        .collect();
    Ok(hits)
}

/// Lowercase alphanumerics only, so punctuation and spacing don't matter.
fn title_key(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn matches_media(media: &MediaRequest, hit: &SearchHit) -> bool {
    let year_ok = match hit.year {
        Some(year) if media.release_year > 0 => year == media.release_year,
        _ => true,
    };
    year_ok && title_key(&hit.title) == title_key(&media.title)
}

/// Link to `episode` under the `Season<season>` heading of a show page.
fn episode_link(html: &str, season: u32, episode: u32) -> Result<Option<String>> {
    let heading = selector("h4")?;
    let anchor = selector("a")?;
    let wanted = format!("Season{season}");

    let document = Html::parse_document(html);
    let Some(block) = document
        .select(&heading)
        .find(|h| {
            let text = h.text().collect::<String>();
            text.trim().split(':').next().map(str::trim) == Some(wanted.as_str())
        })
        .and_then(|h| h.parent())
        .and_then(ElementRef::wrap)
    else {
        return Ok(None);
    };

    Ok(block
        .select(&anchor)
        .find(|a| {
            let text = a.text().collect::<String>();
            text.split('.').next().and_then(|n| n.trim().parse::<u32>().ok()) == Some(episode)
        })
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string))
}

fn pass_value(html: &str) -> Result<Option<String>> {
    let hidden = selector("#hId")?;
    Ok(Html::parse_document(html)
        .select(&hidden)
        .next()
        .and_then(|e| e.value().attr("value"))
        .filter(|v| !v.is_empty())
        .map(str::to_string))
}

fn site_captions(subs: &[Subtitle]) -> Vec<Caption> {
    subs.iter()
        .filter_map(|sub| {
            let code = normalize_site_label(&sub.name, &SITE_LANGUAGES)?;
            Caption::from_site(
                sub.path.clone(),
                format!("{BASE_URL}{}", sub.path),
                CaptionFormat::Srt,
                &code,
            )
        })
        .collect()
}

fn player_headers(page: &str) -> HeaderList {
    [
        ("referer", format!("{BASE_URL}{page}")),
        ("User-Agent", MOBILE_USER_AGENT.to_string()),
        ("Viewport-Width", "375".to_string()),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect()
}

impl SoaperTvSourcerer {
    async fn scrape(&self, ctx: &ScrapeContext, media: &MediaRequest) -> Result<SourcererOutput> {
        let fetcher = &ctx.proxied_fetcher;
        let search = fetcher
            .text(
                "/search.html",
                FetchOptions::new()
                    .base_url(BASE_URL)
                    .query("keyword", &media.title),
            )
            .await?;

        let mut page = search_hits(&search)?
            .into_iter()
            .find(|hit| matches_media(media, hit))
            .map(|hit| hit.url)
            .ok_or_else(|| ScrapeError::not_found("soapertv: no search match"))?;

        if let Some(episode) = media.episode {
            let show = fetcher
                .text(&page, FetchOptions::new().base_url(BASE_URL))
                .await?;
            page = episode_link(&show, episode.season, episode.episode)?
                .ok_or_else(|| ScrapeError::not_found("soapertv: episode not listed"))?;
        }

        let content = fetcher
            .text(&page, FetchOptions::new().base_url(BASE_URL))
            .await?;
        let pass = pass_value(&content)?
            .ok_or_else(|| ScrapeError::not_found("soapertv: no content key"))?;
        ctx.progress(50);

        let endpoint = if media.episode.is_some() {
            "/home/index/getEInfoAjax"
        } else {
            "/home/index/getMInfoAjax"
        };
        let headers = player_headers(&page);
        let raw = fetcher
            .text(
                endpoint,
                FetchOptions::new()
                    .base_url(BASE_URL)
                    .headers(&headers)
                    .form([("pass", pass.as_str()), ("e2", "0"), ("server", "0")]),
            )
            .await?;
        let info: InfoResponse = serde_json::from_str(&raw)?;

        let captions = site_captions(&info.subs);
        debug!(subs = info.subs.len(), kept = captions.len(), "soapertv captions");
        ctx.progress(90);

        let mut streams = vec![("primary", info.val.as_str())];
        if let Some(backup) = info.val_bak.as_deref().filter(|v| !v.is_empty()) {
            streams.push(("backup", backup));
        }

        Ok(SourcererOutput::Streams(
            streams
                .into_iter()
                .map(|(id, path)| {
                    let playlist = ctx.proxy.wrap(&format!("{BASE_URL}/{path}"), &headers);
                    Stream::proxied_hls(id, playlist)
                        .with_flags(&[CapabilityFlag::CorsAllowed])
                        .with_captions(captions.clone())
                })
                .collect(),
        ))
    }
}

#[async_trait]
impl Sourcerer for SoaperTvSourcerer {
    fn id(&self) -> &'static str {
        "soapertv"
    }

    fn name(&self) -> &'static str {
        "SoaperTV"
    }

    fn rank(&self) -> i32 {
        130
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{Fetcher, Transport, TransportRequest, TransportResponse};
    use crate::proxy::{self, ProxyCodec};
    use std::sync::{Arc, Mutex};

    /// Answers by URL path; anything unrouted is a 404.
    struct SiteTransport {
        routes: Vec<(&'static str, &'static str)>,
        seen: Mutex<Vec<TransportRequest>>,
    }

    #[async_trait]
    impl Transport for SiteTransport {
        async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
            let path = request.url.path().to_string();
            let (status, body) = self
                .routes
                .iter()
                .find(|(route, _)| *route == path)
                .map_or((404, "not found"), |(_, body)| (200, *body));
            let final_url = request.url.to_string();
            self.seen.lock().unwrap().push(request);

            let mut headers = HeaderList::new();
            headers.insert("content-type".into(), "text/html".into());
            Ok(TransportResponse {
                status,
                headers,
                final_url,
                body: body.as_bytes().to_vec(),
            })
        }
    }

    fn context(
        routes: Vec<(&'static str, &'static str)>,
        media: MediaRequest,
    ) -> (ScrapeContext, Arc<SiteTransport>) {
        let transport = Arc::new(SiteTransport {
            routes,
            seen: Mutex::new(Vec::new()),
        });
        let fetcher = Fetcher::new(transport.clone());
        let ctx = ScrapeContext::new(
            Arc::new(media),
            fetcher.clone(),
            fetcher,
            ProxyCodec::new("https://proxy.test").unwrap(),
        );
        (ctx, transport)
    }

    const SEARCH: &str = r#"<html><body>
        <div class="thumbnail"><h5><a href="/movie_heat_remake.html">Heat</a></h5><div class="img-tip">2020</div></div>
        <div class="thumbnail"><h5><a href="/movie_heat.html">Heat</a></h5><div class="img-tip">1995</div></div>
        <div class="thumbnail"><h5><a href="/tv_the_office.html">The Office</a></h5><div class="img-tip">2005</div></div>
    </body></html>"#;

    const INFO: &str = r#"{
        "val": "dev/heat/index.m3u8",
        "val_bak": "dev/heat/backup.m3u8",
        "subs": [
            {"name": "English.srt", "path": "/subs/heat/en.srt"},
            {"name": "spanish - latin american", "path": "/subs/heat/es.srt"},
            {"name": "Klingon", "path": "/subs/heat/tlh.srt"}
        ]
    }"#;

    #[test]
    fn search_matches_title_and_year() {
        let hits = search_hits(SEARCH).unwrap();
        assert_eq!(hits.len(), 3);

        let media = MediaRequest::movie("Heat", 1995, "949");
        let hit = hits.iter().find(|h| matches_media(&media, h)).unwrap();
        assert_eq!(hit.url, "/movie_heat.html");

        let office = MediaRequest::show("the office!", 2005, "2316", 1, 1);
        assert!(hits.iter().any(|h| matches_media(&office, h)));
    }

    #[test]
    fn finds_episode_under_its_season() {
        let html = r#"<div><h4>Season1 : 6 episodes</h4><a href="/ep_1_1.html">1. Pilot</a><a href="/ep_1_2.html">2. Diversity Day</a></div>
            <div><h4>Season2 : 22 episodes</h4><a href="/ep_2_1.html">1. The Dundies</a><a href="/ep_2_3.html">3. Office Olympics</a></div>"#;
        assert_eq!(
            episode_link(html, 2, 3).unwrap().as_deref(),
            Some("/ep_2_3.html")
        );
        assert_eq!(episode_link(html, 1, 9).unwrap(), None);
        assert_eq!(episode_link(html, 4, 1).unwrap(), None);
    }

    #[test]
    fn subtitle_names_are_normalized() {
        let info: InfoResponse = serde_json::from_str(INFO).unwrap();
        let captions = site_captions(&info.subs);
        let langs: Vec<_> = captions.iter().map(|c| c.language.as_str()).collect();
        assert_eq!(langs, ["en", "es"]);
        assert_eq!(captions[0].url, "https://soaper.cc/subs/heat/en.srt");
    }

    #[tokio::test]
    async fn movie_resolves_to_proxied_streams() {
        let media = MediaRequest::movie("Heat", 1995, "949");
        let (ctx, transport) = context(
            vec![
                ("/search.html", SEARCH),
                ("/movie_heat.html", r#"<input type="hidden" id="hId" value="k3y">"#),
                ("/home/index/getMInfoAjax", INFO),
            ],
            media.clone(),
        );

        let output = SoaperTvSourcerer.scrape_movie(&ctx, &media).await.unwrap();
        let SourcererOutput::Streams(streams) = output else {
            panic!("expected streams");
        };
        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].id, "primary");
        assert_eq!(streams[0].proxy_depth, 1);
        assert_eq!(streams[0].captions.len(), 2);
        assert!(streams[0].has_flag(CapabilityFlag::CorsAllowed));

        let decoded = proxy::decode(streams[0].primary_url().unwrap()).unwrap();
        assert_eq!(decoded.target, "https://soaper.cc/dev/heat/index.m3u8");
        assert_eq!(decoded.headers["referer"], "https://soaper.cc/movie_heat.html");

        let seen = transport.seen.lock().unwrap();
        let post = seen.last().unwrap();
        assert_eq!(post.method, http::Method::POST);
        let body = String::from_utf8(post.body.clone().unwrap()).unwrap();
        assert_eq!(body, "pass=k3y&e2=0&server=0");
    }

    #[tokio::test]
    async fn unlisted_episode_is_not_found() {
        let media = MediaRequest::show("The Office", 2005, "2316", 3, 1);
        let (ctx, _) = context(
            vec![
                ("/search.html", SEARCH),
                ("/tv_the_office.html", r#"<div><h4>Season1</h4><a href="/ep.html">1. Pilot</a></div>"#),
            ],
            media.clone(),
        );

        let err = SoaperTvSourcerer.scrape_show(&ctx, &media).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
