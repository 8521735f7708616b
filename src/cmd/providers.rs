use anyhow::Result;
use serde::Serialize;

use reelfetch::stream::providers::default_registry;
use reelfetch::{CapabilityFlag, Config, Embed, MediaKind, Registry, Sourcerer};

use super::output::print_json;
use crate::OutputFormat;

#[derive(Serialize)]
struct ProviderRow {
    kind: &'static str,
    id: &'static str,
    name: &'static str,
    rank: i32,
    enabled: bool,
    flags: Vec<CapabilityFlag>,
    media: Vec<MediaKind>,
}

pub fn cmd_providers(config: &Config, format: OutputFormat) -> Result<()> {
    let registry = default_registry(&config.disabled_providers)?;
    let rows = rows(&registry);

    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Text => {
            for row in &rows {
                let state = if row.enabled { "" } else { " (disabled)" };
                println!(
                    "{:>6} {:<7} {:<16} {}{state}",
                    row.rank, row.kind, row.id, row.name
                );
            }
        }
    }
    Ok(())
}

fn rows(registry: &Registry) -> Vec<ProviderRow> {
    let mut sources: Vec<_> = registry
        .sourcerers()
        .map(|s| ProviderRow {
            kind: "source",
            id: s.id(),
            name: s.name(),
            rank: s.rank(),
            enabled: registry.is_enabled(s.id()),
            flags: s.flags().to_vec(),
            media: [MediaKind::Movie, MediaKind::Show]
                .into_iter()
                .filter(|kind| s.supports(*kind))
                .collect(),
        })
        .collect();
    sources.sort_by_key(|r| std::cmp::Reverse(r.rank));

    let mut embeds: Vec<_> = registry
        .embeds()
        .map(|e| ProviderRow {
            kind: "embed",
            id: e.id(),
            name: e.name(),
            rank: e.rank(),
            enabled: registry.is_enabled(e.id()),
            flags: Vec::new(),
            media: Vec::new(),
        })
        .collect();
    embeds.sort_by_key(|r| std::cmp::Reverse(r.rank));

    sources.extend(embeds);
    sources
}
