//! Provider registry and ranking.
//!
//! Built once at startup and read-only afterwards. Ranks only decide the
//! order providers are tried in; equal ranks keep registration order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, ScrapeError};
use crate::media::MediaKind;
use crate::stream::{CapabilityFlag, Embed, Sourcerer};

/// Collects providers before they are frozen into a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    sourcerers: Vec<Arc<dyn Sourcerer>>,
    embeds: Vec<Arc<dyn Embed>>,
    disabled: HashSet<String>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn sourcerer(mut self, sourcerer: Arc<dyn Sourcerer>) -> Self {
        self.sourcerers.push(sourcerer);
        self
    }

    #[must_use]
    pub fn embed(mut self, embed: Arc<dyn Embed>) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Keep a provider registered but never offer it.
    #[must_use]
    pub fn disable(mut self, id: impl Into<String>) -> Self {
        self.disabled.insert(id.into());
        self
    }

    #[must_use]
    pub fn disable_all<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Freeze the registry.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::DuplicateId`] when two providers share an id. Sourcerer
    /// and embed ids live in one namespace.
    pub fn build(self) -> Result<Registry> {
        let mut seen = HashSet::new();
        let ids = self
            .sourcerers
            .iter()
            .map(|s| s.id())
            .chain(self.embeds.iter().map(|e| e.id()));
        for id in ids {
            if !seen.insert(id) {
                return Err(ScrapeError::DuplicateId(id.to_string()));
            }
        }

        let sourcerer_index = self
            .sourcerers
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id(), i))
            .collect();
        let embed_index = self
            .embeds
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id(), i))
            .collect();

        debug!(
            sourcerers = self.sourcerers.len(),
            embeds = self.embeds.len(),
            disabled = self.disabled.len(),
            "registry built"
        );

        Ok(Registry {
            sourcerers: self.sourcerers,
            embeds: self.embeds,
            sourcerer_index,
            embed_index,
            disabled: self.disabled,
        })
    }
}

/// Sourcerers and embeds by id, in registration order.
pub struct Registry {
    sourcerers: Vec<Arc<dyn Sourcerer>>,
    embeds: Vec<Arc<dyn Embed>>,
    sourcerer_index: HashMap<&'static str, usize>,
    embed_index: HashMap<&'static str, usize>,
    disabled: HashSet<String>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("sourcerers", &self.sourcerers.iter().map(|s| s.id()).collect::<Vec<_>>())
            .field("embeds", &self.embeds.iter().map(|e| e.id()).collect::<Vec<_>>())
            .field("disabled", &self.disabled)
            .finish()
    }
}

impl Registry {
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// `false` if the provider disables itself or was disabled by id.
    #[must_use]
    pub fn is_enabled(&self, id: &str) -> bool {
        if self.disabled.contains(id) {
            return false;
        }
        if let Some(&i) = self.sourcerer_index.get(id) {
            return !self.sourcerers[i].disabled();
        }
        if let Some(&i) = self.embed_index.get(id) {
            return !self.embeds[i].disabled();
        }
        false
    }

    /// Enabled sourcerers for `kind`, best rank first.
    #[must_use]
    pub fn ranked_sourcerers(&self, kind: MediaKind) -> Vec<Arc<dyn Sourcerer>> {
        self.ranked_sourcerers_with(kind, &[])
    }

    /// Like [`ranked_sourcerers`](Self::ranked_sourcerers), keeping only
    /// sourcerers that carry every flag in `required`.
    #[must_use]
    pub fn ranked_sourcerers_with(
        &self,
        kind: MediaKind,
        required: &[CapabilityFlag],
    ) -> Vec<Arc<dyn Sourcerer>> {
        let mut ranked: Vec<_> = self
            .sourcerers
            .iter()
            .filter(|s| self.is_enabled(s.id()) && s.supports(kind))
            .filter(|s| required.iter().all(|flag| s.flags().contains(flag)))
            .cloned()
            .collect();
        // Stable sort: ties keep registration order.
        ranked.sort_by_key(|s| std::cmp::Reverse(s.rank()));
        ranked
    }

    /// Enabled embeds, best rank first.
    #[must_use]
    pub fn ranked_embeds(&self) -> Vec<Arc<dyn Embed>> {
        let mut ranked: Vec<_> = self
            .embeds
            .iter()
            .filter(|e| self.is_enabled(e.id()))
            .cloned()
            .collect();
        ranked.sort_by_key(|e| std::cmp::Reverse(e.rank()));
        ranked
    }

    /// Enabled embed by id.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::UnknownEmbed`] when no enabled embed has this id.
    pub fn embed_for(&self, id: &str) -> Result<Arc<dyn Embed>> {
        self.embed_index
            .get(id)
            .filter(|_| self.is_enabled(id))
            .map(|&i| self.embeds[i].clone())
            .ok_or_else(|| ScrapeError::UnknownEmbed(id.to_string()))
    }

    /// Enabled sourcerer by id.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::UnknownSource`] when no enabled sourcerer has this id.
    pub fn sourcerer(&self, id: &str) -> Result<Arc<dyn Sourcerer>> {
        self.sourcerer_index
            .get(id)
            .filter(|_| self.is_enabled(id))
            .map(|&i| self.sourcerers[i].clone())
            .ok_or_else(|| ScrapeError::UnknownSource(id.to_string()))
    }

    /// Every registered sourcerer, enabled or not, in registration order.
    pub fn sourcerers(&self) -> impl Iterator<Item = &Arc<dyn Sourcerer>> {
        self.sourcerers.iter()
    }

    /// Every registered embed, enabled or not, in registration order.
    pub fn embeds(&self) -> impl Iterator<Item = &Arc<dyn Embed>> {
        self.embeds.iter()
    }
}
