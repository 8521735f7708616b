//! Subtitle tracks attached to streams.
//!
//! Site scrapers attach the captions they find; the [`CaptionAggregator`]
//! adds more from external subtitle backends. Every caption that leaves the
//! crate carries a normalized language code (see [`language`]).

pub mod aggregator;
pub mod backends;
pub mod language;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

pub use aggregator::{CaptionAggregator, CaptionBackend, CaptionQuery, SubtitleDescriptor};
pub use backends::{OpenSubtitlesBackend, WyzieBackend};
pub use language::{label_to_language_code, normalize_site_label};

/// Subtitle file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaptionFormat {
    #[default]
    Srt,
    Vtt,
}

impl CaptionFormat {
    /// Map a format label to a caption format. Anything that isn't `vtt`
    /// is served as `srt`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("vtt") {
            Self::Vtt
        } else {
            Self::Srt
        }
    }

    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
        }
    }
}

/// Which backend supplied a caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionOrigin {
    /// Scraped from the provider site itself.
    Site,
    Wyzie,
    OpenSubtitles,
}

/// A subtitle track reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caption {
    pub id: String,
    pub url: String,
    #[serde(rename = "type")]
    pub format: CaptionFormat,
    /// ISO 639-1 code, optionally with a region (`pt-br`).
    pub language: String,
    /// `false` when the URL can be fetched directly without proxying.
    pub has_cors_restrictions: bool,
    pub origin: CaptionOrigin,
}

impl Caption {
    /// Caption scraped from a provider site. `label` is normalized; returns
    /// `None` when it can't be mapped to a language code.
    #[must_use]
    pub fn from_site(
        id: impl Into<String>,
        url: impl Into<String>,
        format: CaptionFormat,
        label: &str,
    ) -> Option<Self> {
        Some(Self {
            id: id.into(),
            url: url.into(),
            format,
            language: label_to_language_code(label)?,
            has_cors_restrictions: false,
            origin: CaptionOrigin::Site,
        })
    }
}

/// Re-normalize every caption's language, dropping the ones that can't be
/// mapped. Codes that are already normalized come back unchanged.
#[must_use]
pub fn normalize_languages(captions: Vec<Caption>) -> Vec<Caption> {
    captions
        .into_iter()
        .filter_map(|mut caption| {
            caption.language = label_to_language_code(&caption.language)?;
            Some(caption)
        })
        .collect()
}

/// Keep the first caption for every URL, preserving order.
#[must_use]
pub fn dedupe_by_url(captions: Vec<Caption>) -> Vec<Caption> {
    let mut seen = HashSet::new();
    captions
        .into_iter()
        .filter(|c| seen.insert(c.url.clone()))
        .collect()
}
