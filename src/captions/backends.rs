//! Caption backends: Wyzie subtitle search and the legacy OpenSubtitles REST
//! index.

use async_trait::async_trait;
use serde::Deserialize;

use super::aggregator::{CaptionBackend, CaptionQuery, SubtitleDescriptor};
use super::{CaptionFormat, CaptionOrigin};
use crate::error::Result;
use crate::fetch::{FetchOptions, Fetcher};

pub const WYZIE_BASE_URL: &str = "https://sub.wyzie.ru";
pub const OPENSUBTITLES_BASE_URL: &str = "https://rest.opensubtitles.org";

/// The OpenSubtitles REST API only answers clients it knows.
const OPENSUBTITLES_USER_AGENT: &str = "VLSub 0.10.2";

/// Structured subtitle search (`/search?id=…&season=…&episode=…`).
pub struct WyzieBackend {
    fetcher: Fetcher,
    base_url: String,
}

impl WyzieBackend {
    pub fn new(fetcher: Fetcher, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
        }
    }

    fn options(&self, query: &CaptionQuery) -> FetchOptions {
        let mut options = FetchOptions::new()
            .base_url(&self.base_url)
            .query("encoding", "utf-8")
            .query("source", "all");

        // The TMDB id is only a fallback for media without an IMDB id.
        options = match query.tmdb_id.as_deref() {
            Some(tmdb) if query.imdb_id.is_empty() => options.query("id", tmdb),
            _ => options.query("id", &query.imdb_id),
        };

        if let Some((season, episode)) = query.season_episode() {
            options = options
                .query("season", season.to_string())
                .query("episode", episode.to_string());
        }
        options
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WyzieSubtitle {
    id: serde_json::Value,
    url: String,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    display: Option<String>,
}

#[async_trait]
impl CaptionBackend for WyzieBackend {
    fn name(&self) -> &'static str {
        "wyzie"
    }

    fn origin(&self) -> CaptionOrigin {
        CaptionOrigin::Wyzie
    }

    async fn search(&self, query: &CaptionQuery) -> Result<Vec<SubtitleDescriptor>> {
        let found: Vec<WyzieSubtitle> = self.fetcher.json("/search", self.options(query)).await?;

        Ok(found
            .into_iter()
            .map(|sub| SubtitleDescriptor {
                id: match sub.id {
                    serde_json::Value::String(id) => id,
                    other => other.to_string(),
                },
                url: sub.url,
                format: CaptionFormat::from_label(sub.format.as_deref().unwrap_or("srt")),
                // Prefer the code; fall back to the display name.
                language: sub.language.or(sub.display).unwrap_or_default(),
            })
            .collect())
    }
}

/// Path-based legacy index:
/// `/search/[episode-<e>/]imdbid-<digits>[/season-<s>]`.
pub struct OpenSubtitlesBackend {
    fetcher: Fetcher,
    base_url: String,
}

impl OpenSubtitlesBackend {
    pub fn new(fetcher: Fetcher, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
        }
    }

    /// Search path for a query. The IMDB id is sent without its `tt`
    /// prefix.
    #[must_use]
    pub fn search_path(query: &CaptionQuery) -> String {
        let digits = query.imdb_id.trim_start_matches("tt");
        match query.season_episode() {
            Some((season, episode)) => {
                format!("/search/episode-{episode}/imdbid-{digits}/season-{season}")
            }
            None => format!("/search/imdbid-{digits}"),
        }
    }

    /// Turn a `.gz` download link into a plain UTF-8 one.
    #[must_use]
    pub fn direct_download_url(link: &str) -> String {
        link.replacen(".gz", "", 1)
            .replacen("download/", "download/subencoding-utf8/", 1)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OpenSubtitlesEntry {
    #[serde(default)]
    sub_download_link: String,
    #[serde(default)]
    language_name: String,
    #[serde(default)]
    sub_format: Option<String>,
}

#[async_trait]
impl CaptionBackend for OpenSubtitlesBackend {
    fn name(&self) -> &'static str {
        "opensubtitles"
    }

    fn origin(&self) -> CaptionOrigin {
        CaptionOrigin::OpenSubtitles
    }

    async fn search(&self, query: &CaptionQuery) -> Result<Vec<SubtitleDescriptor>> {
        // The index is keyed by IMDB id only.
        if query.imdb_id.is_empty() {
            return Ok(Vec::new());
        }

        let entries: Vec<OpenSubtitlesEntry> = self
            .fetcher
            .json(
                &Self::search_path(query),
                FetchOptions::new()
                    .base_url(&self.base_url)
                    .header("X-User-Agent", OPENSUBTITLES_USER_AGENT),
            )
            .await?;

        Ok(entries
            .into_iter()
            .filter(|e| !e.sub_download_link.is_empty())
            .map(|e| {
                let url = Self::direct_download_url(&e.sub_download_link);
                SubtitleDescriptor {
                    id: url.clone(),
                    url,
                    format: CaptionFormat::from_label(e.sub_format.as_deref().unwrap_or("srt")),
                    language: e.language_name,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::transport::tests::RecordingTransport;
    use std::sync::Arc;

    fn query(season: Option<u32>, episode: Option<u32>) -> CaptionQuery {
        CaptionQuery {
            imdb_id: "tt0386676".into(),
            tmdb_id: Some("2316".into()),
            season,
            episode,
        }
    }

    #[test]
    fn opensubtitles_paths() {
        assert_eq!(
            OpenSubtitlesBackend::search_path(&query(None, None)),
            "/search/imdbid-0386676"
        );
        assert_eq!(
            OpenSubtitlesBackend::search_path(&query(Some(2), Some(3))),
            "/search/episode-3/imdbid-0386676/season-2"
        );
        // Half an episode reference is treated as a movie lookup.
        assert_eq!(
            OpenSubtitlesBackend::search_path(&query(Some(2), None)),
            "/search/imdbid-0386676"
        );
    }

    #[test]
    fn opensubtitles_download_link_rewrite() {
        assert_eq!(
            OpenSubtitlesBackend::direct_download_url(
                "https://dl.opensubtitles.org/en/download/src-api/vrf-19b50c58/sid-x/file/1954.gz"
            ),
            "https://dl.opensubtitles.org/en/download/subencoding-utf8/src-api/vrf-19b50c58/sid-x/file/1954"
        );
    }

    #[tokio::test]
    async fn opensubtitles_sends_user_agent_and_parses() {
        let transport = Arc::new(RecordingTransport::new(
            200,
            "application/json",
            r#"[
                {"SubDownloadLink":"https://dl.test/download/file/1.gz","LanguageName":"English","SubFormat":"srt"},
                {"SubDownloadLink":"","LanguageName":"French","SubFormat":"srt"}
            ]"#,
        ));
        let backend = OpenSubtitlesBackend::new(Fetcher::new(transport.clone()), OPENSUBTITLES_BASE_URL);

        let found = backend.search(&query(Some(1), Some(2))).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "https://dl.test/download/subencoding-utf8/file/1");
        assert_eq!(found[0].language, "English");

        let sent = transport.last();
        assert_eq!(sent.headers["x-user-agent"], "VLSub 0.10.2");
        assert_eq!(
            sent.url.as_str(),
            "https://rest.opensubtitles.org/search/episode-2/imdbid-0386676/season-1"
        );
    }

    #[tokio::test]
    async fn wyzie_query_parameters() {
        let transport = Arc::new(RecordingTransport::new(
            200,
            "application/json",
            r#"[{"id":"123","url":"https://w.test/123.vtt","format":"vtt","language":"en","display":"English"}]"#,
        ));
        let backend = WyzieBackend::new(Fetcher::new(transport.clone()), WYZIE_BASE_URL);

        let found = backend.search(&query(Some(1), Some(2))).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].format, CaptionFormat::Vtt);
        assert_eq!(found[0].language, "en");

        let sent = transport.last();
        let pairs: std::collections::HashMap<_, _> = sent.url.query_pairs().into_owned().collect();
        assert_eq!(pairs["id"], "tt0386676");
        assert_eq!(pairs["season"], "1");
        assert_eq!(pairs["episode"], "2");
        assert_eq!(pairs["source"], "all");
    }

    #[tokio::test]
    async fn wyzie_uses_tmdb_only_without_imdb() {
        let transport = Arc::new(RecordingTransport::new(200, "application/json", "[]"));
        let backend = WyzieBackend::new(Fetcher::new(transport.clone()), WYZIE_BASE_URL);
        let mut q = query(None, None);
        q.imdb_id.clear();

        backend.search(&q).await.unwrap();
        let pairs: std::collections::HashMap<_, _> =
            transport.last().url.query_pairs().into_owned().collect();
        assert_eq!(pairs["id"], "2316");
        assert!(!pairs.contains_key("season"));
    }

    #[tokio::test]
    async fn opensubtitles_skips_queries_without_imdb() {
        let transport = Arc::new(RecordingTransport::new(200, "application/json", "[]"));
        let backend = OpenSubtitlesBackend::new(Fetcher::new(transport.clone()), OPENSUBTITLES_BASE_URL);
        let mut q = query(None, None);
        q.imdb_id.clear();

        assert!(backend.search(&q).await.unwrap().is_empty());
        assert!(transport.requests.lock().unwrap().is_empty());
    }
}
