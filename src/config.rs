//! Configuration loaded from `~/.config/reelfetch/config.toml`.
//!
//! Every key is optional; a missing file means defaults.
//!
//! ```toml
//! proxy_url = "https://proxy.example.net"
//! fetch_proxy_url = "https://simple-proxy.example.net"
//! request_timeout_secs = 20
//! profile = "firefox"
//! disabled_providers = ["vidlink"]
//!
//! [captions]
//! enabled = true
//! wyzie_timeout_ms = 2000
//! opensubtitles_timeout_ms = 5000
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::captions::backends::{OPENSUBTITLES_BASE_URL, WYZIE_BASE_URL};
use crate::captions::{CaptionAggregator, OpenSubtitlesBackend, WyzieBackend};
use crate::fetch::profile::{
    chrome_profile, firefox_profile, mobile_safari_profile, random_profile, BrowserProfile,
};
use crate::fetch::{Fetcher, ProxiedTransport, ReqwestTransport, Transport};
use crate::proxy::ProxyCodec;
use crate::runner::Runner;
use crate::stream::providers::default_registry;

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the stream proxy service that serves `m3u8-proxy` URLs.
    pub proxy_url: String,
    /// Simple fetch proxy for provider requests. Unset means direct.
    pub fetch_proxy_url: Option<String>,
    pub request_timeout_secs: u64,
    /// Browser profile for outbound headers: `chrome`, `firefox`, `safari`
    /// or `random`.
    pub profile: String,
    /// Provider ids never offered to the runner.
    pub disabled_providers: Vec<String>,
    pub captions: CaptionsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_url: "http://localhost:3000".to_string(),
            fetch_proxy_url: None,
            request_timeout_secs: 30,
            profile: "chrome".to_string(),
            disabled_providers: Vec::new(),
            captions: CaptionsConfig::default(),
        }
    }
}

/// External caption lookup settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionsConfig {
    pub enabled: bool,
    pub wyzie_url: String,
    pub wyzie_timeout_ms: u64,
    pub opensubtitles_url: String,
    pub opensubtitles_timeout_ms: u64,
}

impl Default for CaptionsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            wyzie_url: WYZIE_BASE_URL.to_string(),
            wyzie_timeout_ms: 2000,
            opensubtitles_url: OPENSUBTITLES_BASE_URL.to_string(),
            opensubtitles_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Load from the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load from `path`, falling back to defaults if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("invalid TOML in {}", path.display()))
    }

    #[must_use]
    pub fn browser_profile(&self) -> BrowserProfile {
        match self.profile.as_str() {
            "firefox" => firefox_profile(),
            "safari" => mobile_safari_profile(),
            "random" => random_profile(),
            _ => chrome_profile(),
        }
    }

    /// Direct fetcher and provider fetcher. The latter goes through
    /// `fetch_proxy_url` when one is set.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client can't be built or the proxy URL is invalid.
    pub fn fetchers(&self) -> Result<(Fetcher, Fetcher)> {
        let direct: Arc<dyn Transport> = Arc::new(
            ReqwestTransport::with_profile(
                self.browser_profile(),
                Duration::from_secs(self.request_timeout_secs),
            )
            .context("failed to build HTTP client")?,
        );

        let proxied: Arc<dyn Transport> = match &self.fetch_proxy_url {
            Some(url) => Arc::new(
                ProxiedTransport::new(direct.clone(), url)
                    .with_context(|| format!("invalid fetch proxy {url}"))?,
            ),
            None => direct.clone(),
        };

        Ok((Fetcher::new(proxied), Fetcher::new(direct)))
    }

    /// Caption aggregator with both backends under their configured budgets.
    /// OpenSubtitles goes through `proxied`, Wyzie is called `direct`.
    #[must_use]
    pub fn caption_aggregator(&self, proxied: &Fetcher, direct: &Fetcher) -> CaptionAggregator {
        let c = &self.captions;
        CaptionAggregator::new()
            .with_backend(
                Arc::new(WyzieBackend::new(direct.clone(), &c.wyzie_url)),
                Duration::from_millis(c.wyzie_timeout_ms),
            )
            .with_backend(
                Arc::new(OpenSubtitlesBackend::new(
                    proxied.clone(),
                    &c.opensubtitles_url,
                )),
                Duration::from_millis(c.opensubtitles_timeout_ms),
            )
    }

    /// Runner over the shipped providers.
    ///
    /// # Errors
    ///
    /// Fails on an invalid proxy URL or an HTTP client that can't be built.
    pub fn runner(&self) -> Result<Runner> {
        let (proxied, direct) = self.fetchers()?;
        let proxy = ProxyCodec::new(&self.proxy_url)
            .with_context(|| format!("invalid proxy_url {}", self.proxy_url))?;
        let registry = default_registry(&self.disabled_providers)?;

        let aggregator = self
            .captions
            .enabled
            .then(|| Arc::new(self.caption_aggregator(&proxied, &direct)));

        let mut runner = Runner::new(Arc::new(registry), proxied, direct, proxy);
        if let Some(aggregator) = aggregator {
            runner = runner.with_captions(aggregator);
        }
        Ok(runner)
    }
}

/// Return the path to the config file.
#[must_use]
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reelfetch")
        .join("config.toml")
}
