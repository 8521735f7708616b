//! What the caller asks to resolve.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};

/// Movie or show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Show,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Movie => "movie",
            Self::Show => "show",
        })
    }
}

/// Season/episode selector for shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRef {
    pub season: u32,
    pub episode: u32,
}

/// A single resolution target. Not modified during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRequest {
    pub title: String,
    pub release_year: u16,
    pub tmdb_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    /// `Some` for shows, `None` for movies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<EpisodeRef>,
}

impl MediaRequest {
    pub fn movie(title: impl Into<String>, release_year: u16, tmdb_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            release_year,
            tmdb_id: tmdb_id.into(),
            imdb_id: None,
            episode: None,
        }
    }

    pub fn show(
        title: impl Into<String>,
        release_year: u16,
        tmdb_id: impl Into<String>,
        season: u32,
        episode: u32,
    ) -> Self {
        Self {
            title: title.into(),
            release_year,
            tmdb_id: tmdb_id.into(),
            imdb_id: None,
            episode: Some(EpisodeRef { season, episode }),
        }
    }

    #[must_use]
    pub fn with_imdb_id(mut self, imdb_id: impl Into<String>) -> Self {
        self.imdb_id = Some(imdb_id.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> MediaKind {
        if self.episode.is_some() {
            MediaKind::Show
        } else {
            MediaKind::Movie
        }
    }

    /// Identifier bundle for caption lookups, if an IMDB id is known.
    #[must_use]
    pub fn caption_bundle(&self) -> Option<String> {
        let imdb = self.imdb_id.as_deref()?;
        Some(encode_media_bundle(
            imdb,
            self.episode.map(|e| e.season),
            self.episode.map(|e| e.episode),
        ))
    }
}

/// Identifiers decoded from a media bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBundle {
    pub imdb_id: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

/// Encode `imdb[.season.episode]` as base64.
#[must_use]
pub fn encode_media_bundle(imdb_id: &str, season: Option<u32>, episode: Option<u32>) -> String {
    let raw = match (season, episode) {
        (Some(season), Some(episode)) => format!("{imdb_id}.{season}.{episode}"),
        _ => imdb_id.to_string(),
    };
    STANDARD.encode(raw)
}

/// Decode a media bundle. Season and episode that are missing, zero or not
/// numbers come back as `None`.
///
/// # Errors
///
/// Returns [`ScrapeError::Decode`] if the bundle is not base64 or not UTF-8.
pub fn decode_media_bundle(bundle: &str) -> Result<MediaBundle> {
    let bytes = STANDARD.decode(bundle.trim())?;
    let raw = String::from_utf8(bytes).map_err(|e| ScrapeError::Decode(e.to_string()))?;

    let mut parts = raw.split('.');
    let imdb_id = parts.next().unwrap_or_default().to_string();
    let number = |part: Option<&str>| part.and_then(|p| p.parse::<u32>().ok()).filter(|n| *n > 0);
    let season = number(parts.next());
    let episode = number(parts.next());

    Ok(MediaBundle {
        imdb_id,
        season,
        episode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_episode() {
        assert_eq!(MediaRequest::movie("Heat", 1995, "949").kind(), MediaKind::Movie);
        assert_eq!(
            MediaRequest::show("The Office", 2005, "2316", 2, 3).kind(),
            MediaKind::Show
        );
    }

    #[test]
    fn bundle_for_show() {
        let bundle = encode_media_bundle("tt0386676", Some(2), Some(3));
        let decoded = decode_media_bundle(&bundle).unwrap();
        assert_eq!(decoded.imdb_id, "tt0386676");
        assert_eq!(decoded.season, Some(2));
        assert_eq!(decoded.episode, Some(3));
    }

    #[test]
    fn bundle_for_movie_has_no_episode() {
        let decoded = decode_media_bundle(&encode_media_bundle("tt0113277", None, None)).unwrap();
        assert_eq!(decoded.imdb_id, "tt0113277");
        assert_eq!(decoded.season, None);
        assert_eq!(decoded.episode, None);
    }

    #[test]
    fn bundle_ignores_non_numeric_parts() {
        let bundle = STANDARD.encode("tt1.x.0");
        let decoded = decode_media_bundle(&bundle).unwrap();
        assert_eq!(decoded.season, None);
        assert_eq!(decoded.episode, None);
    }

    #[test]
    fn bundle_rejects_garbage() {
        assert!(decode_media_bundle("***").is_err());
    }

    #[test]
    fn caption_bundle_needs_imdb() {
        let movie = MediaRequest::movie("Heat", 1995, "949");
        assert!(movie.caption_bundle().is_none());
        let movie = movie.with_imdb_id("tt0113277");
        assert_eq!(
            movie.caption_bundle().as_deref(),
            Some(STANDARD.encode("tt0113277").as_str())
        );
    }

    #[test]
    fn serializes_kind_lowercase() {
        assert_eq!(serde_json::to_string(&MediaKind::Show).unwrap(), "\"show\"");
    }
}
