//! Shipped source sites and players.

pub mod soapertv;
pub mod vidlink;
pub mod vidlink_proxy;
pub mod vidsrc;
pub mod vidsrcvip;

use std::sync::Arc;

pub use soapertv::SoaperTvSourcerer;
pub use vidlink::VidLinkSourcerer;
pub use vidlink_proxy::VidLinkProxyEmbed;
pub use vidsrc::VidSrcEmbed;
pub use vidsrcvip::VidSrcVipSourcerer;

use crate::error::Result;
use crate::registry::{Registry, RegistryBuilder};

/// Builder with every shipped provider registered.
#[must_use]
pub fn default_builder() -> RegistryBuilder {
    Registry::builder()
        .sourcerer(Arc::new(VidSrcVipSourcerer))
        .sourcerer(Arc::new(SoaperTvSourcerer))
        .sourcerer(Arc::new(VidLinkSourcerer))
        .embed(Arc::new(VidLinkProxyEmbed))
        .embed(Arc::new(VidSrcEmbed::comet()))
        .embed(Arc::new(VidSrcEmbed::pulsar()))
        .embed(Arc::new(VidSrcEmbed::nova()))
}

/// Registry of the shipped providers, minus `disabled` ids.
pub fn default_registry(disabled: &[String]) -> Result<Registry> {
    default_builder().disable_all(disabled.iter().cloned()).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;

    #[test]
    fn shipped_providers_are_ranked() {
        let registry = default_registry(&[]).unwrap();
        let movies: Vec<_> = registry
            .ranked_sourcerers(MediaKind::Movie)
            .iter()
            .map(|s| s.id())
            .collect();
        assert_eq!(movies, ["vidsrcvip", "soapertv", "vidlink"]);

        let shows: Vec<_> = registry
            .ranked_sourcerers(MediaKind::Show)
            .iter()
            .map(|s| s.id())
            .collect();
        assert_eq!(shows, ["vidsrcvip", "soapertv"]);

        for id in vidsrcvip::EMBED_IDS {
            assert!(registry.embed_for(id).is_ok(), "{id} must be registered");
        }
        assert!(registry.embed_for("vidlink-proxy").is_ok());
    }

    #[test]
    fn disabled_ids_are_skipped() {
        let registry = default_registry(&["vidsrcvip".to_string()]).unwrap();
        let movies: Vec<_> = registry
            .ranked_sourcerers(MediaKind::Movie)
            .iter()
            .map(|s| s.id())
            .collect();
        assert_eq!(movies, ["soapertv", "vidlink"]);
    }
}
