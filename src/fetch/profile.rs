//! Browser identities presented to provider sites.
//!
//! Provider sites and caption backends tend to reject requests that do not
//! look like they come from a browser. Each [`Transport`](super::Transport)
//! picks a profile once and sends its headers as defaults; per-request
//! headers always win.

use rand::seq::SliceRandom;
use rand::Rng;

use super::HeaderList;

/// Browser identity sent as default request headers.
#[derive(Debug, Clone)]
pub struct BrowserProfile {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    /// Empty for browsers that don't send client hints.
    pub sec_ch_ua: String,
    pub sec_ch_ua_mobile: String,
    pub sec_ch_ua_platform: String,
}

/// Real Chrome versions (major, full)
const CHROME_VERSIONS: &[(&str, &str)] = &[
    ("136", "136.0.0.0"),
    ("135", "135.0.0.0"),
    ("134", "134.0.0.0"),
    ("133", "133.0.0.0"),
];

const FIREFOX_VERSIONS: &[&str] = &["138.0", "137.0", "136.0"];

/// iOS Safari (os version, safari version)
const IOS_VERSIONS: &[(&str, &str)] = &[("18_0", "18.0"), ("17_6", "17.6"), ("17_5", "17.5")];

/// Accept header used for API-style requests (JSON endpoints, playlists).
const API_ACCEPT: &str = "application/json, text/plain, */*";

#[derive(Debug, Clone, Copy)]
enum Platform {
    MacOS,
    Windows,
    Linux,
}

impl Platform {
    fn random() -> Self {
        let roll: f32 = rand::thread_rng().gen();
        // Windows 65%, macOS 20%, Linux 15%
        if roll < 0.65 {
            Platform::Windows
        } else if roll < 0.85 {
            Platform::MacOS
        } else {
            Platform::Linux
        }
    }

    fn os_string(self) -> &'static str {
        match self {
            Platform::MacOS => "Macintosh; Intel Mac OS X 10_15_7",
            Platform::Windows => "Windows NT 10.0; Win64; x64",
            Platform::Linux => "X11; Linux x86_64",
        }
    }

    fn sec_ch_platform(self) -> &'static str {
        match self {
            Platform::MacOS => "\"macOS\"",
            Platform::Windows => "\"Windows\"",
            Platform::Linux => "\"Linux\"",
        }
    }
}

/// Desktop Chrome with client hints.
#[must_use]
pub fn chrome_profile() -> BrowserProfile {
    let mut rng = rand::thread_rng();
    let platform = Platform::random();
    let (major, full) = CHROME_VERSIONS
        .choose(&mut rng)
        .copied()
        .unwrap_or(CHROME_VERSIONS[0]);

    BrowserProfile {
        user_agent: format!(
            "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{full} Safari/537.36",
            platform.os_string()
        ),
        accept: API_ACCEPT.to_string(),
        accept_language: random_accept_language(),
        sec_ch_ua: format!(
            "\"Google Chrome\";v=\"{major}\", \"Chromium\";v=\"{major}\", \"Not_A Brand\";v=\"24\""
        ),
        sec_ch_ua_mobile: "?0".to_string(),
        sec_ch_ua_platform: platform.sec_ch_platform().to_string(),
    }
}

/// Desktop Firefox; no client hints.
#[must_use]
pub fn firefox_profile() -> BrowserProfile {
    let mut rng = rand::thread_rng();
    let platform = Platform::random();
    let version = FIREFOX_VERSIONS
        .choose(&mut rng)
        .copied()
        .unwrap_or(FIREFOX_VERSIONS[0]);

    BrowserProfile {
        user_agent: format!(
            "Mozilla/5.0 ({}; rv:{version}) Gecko/20100101 Firefox/{version}",
            platform.os_string()
        ),
        accept: API_ACCEPT.to_string(),
        accept_language: random_accept_language(),
        sec_ch_ua: String::new(),
        sec_ch_ua_mobile: String::new(),
        sec_ch_ua_platform: String::new(),
    }
}

/// iPhone Safari. Some sites only serve mobile players to it.
#[must_use]
pub fn mobile_safari_profile() -> BrowserProfile {
    let mut rng = rand::thread_rng();
    let (os, version) = IOS_VERSIONS
        .choose(&mut rng)
        .copied()
        .unwrap_or(IOS_VERSIONS[0]);

    BrowserProfile {
        user_agent: format!(
            "Mozilla/5.0 (iPhone; CPU iPhone OS {os} like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{version} Mobile/15E148 Safari/604.1"
        ),
        accept: API_ACCEPT.to_string(),
        accept_language: random_accept_language(),
        sec_ch_ua: String::new(),
        sec_ch_ua_mobile: String::new(),
        sec_ch_ua_platform: String::new(),
    }
}

/// Desktop profile weighted by market share (Chrome 80%, Firefox 20%).
#[must_use]
pub fn random_profile() -> BrowserProfile {
    let roll: f32 = rand::thread_rng().gen();
    if roll < 0.8 {
        chrome_profile()
    } else {
        firefox_profile()
    }
}

fn random_accept_language() -> String {
    let languages = [
        "en-US,en;q=0.9",
        "en-GB,en;q=0.9",
        "en-US,en;q=0.9,es;q=0.8",
        "en-US,en;q=0.9,fr;q=0.8",
    ];
    languages
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(languages[0])
        .to_string()
}

impl BrowserProfile {
    /// Headers this profile contributes, lowercase names.
    #[must_use]
    pub fn to_headers(&self) -> HeaderList {
        let mut headers = HeaderList::new();
        headers.insert("user-agent".into(), self.user_agent.clone());
        headers.insert("accept".into(), self.accept.clone());
        headers.insert("accept-language".into(), self.accept_language.clone());

        if !self.sec_ch_ua.is_empty() {
            headers.insert("sec-ch-ua".into(), self.sec_ch_ua.clone());
            headers.insert("sec-ch-ua-mobile".into(), self.sec_ch_ua_mobile.clone());
            headers.insert("sec-ch-ua-platform".into(), self.sec_ch_ua_platform.clone());
        }

        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chrome_sends_client_hints() {
        let profile = chrome_profile();
        assert!(profile.user_agent.contains("Chrome"));
        assert!(profile.to_headers().contains_key("sec-ch-ua"));
    }

    #[test]
    fn firefox_has_no_client_hints() {
        let profile = firefox_profile();
        assert!(profile.user_agent.contains("Firefox"));
        assert!(!profile.to_headers().contains_key("sec-ch-ua"));
    }

    #[test]
    fn mobile_safari_identifies_as_iphone() {
        let profile = mobile_safari_profile();
        assert!(profile.user_agent.contains("iPhone"));
        assert!(profile.user_agent.contains("Mobile/15E148"));
    }

    #[test]
    fn header_names_are_lowercase() {
        let headers = random_profile().to_headers();
        assert!(headers.keys().all(|k| k.chars().all(|c| !c.is_ascii_uppercase())));
        assert!(headers.contains_key("user-agent"));
    }
}
