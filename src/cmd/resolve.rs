use std::sync::Arc;

use anyhow::{Context, Result};

use reelfetch::{Config, MediaRequest, RunEvent, SourcererOutput};

use super::output::{print_json, print_stream};
use crate::OutputFormat;

pub async fn cmd_resolve(
    config: &Config,
    media: &MediaRequest,
    source: Option<&str>,
    events: bool,
    format: OutputFormat,
) -> Result<()> {
    let mut runner = config.runner()?;
    if events {
        runner = runner.with_events(Arc::new(|event: RunEvent| {
            if let Ok(line) = serde_json::to_string(&event) {
                eprintln!("{line}");
            }
        }));
    }

    if let Some(id) = source {
        let output = runner
            .run_source(id, media)
            .await
            .with_context(|| format!("source {id} failed"))?;
        return match format {
            OutputFormat::Json => print_json(&output),
            OutputFormat::Text => {
                print_source_output(id, &output);
                Ok(())
            }
        };
    }

    let found = runner.run(media).await?;
    match format {
        OutputFormat::Json => print_json(&found)?,
        OutputFormat::Text => {
            match &found.embed_id {
                Some(embed) => println!("🎬 Resolved via {} → {embed}", found.source_id),
                None => println!("🎬 Resolved via {}", found.source_id),
            }
            print_stream(&found.stream);
        }
    }
    Ok(())
}

fn print_source_output(id: &str, output: &SourcererOutput) {
    match output {
        SourcererOutput::Embeds(embeds) => {
            println!("🔗 {id}: {} embeds", embeds.len());
            for embed in embeds {
                println!("   {} {}", embed.embed_id, embed.url);
            }
        }
        SourcererOutput::Streams(streams) => {
            println!("🎬 {id}: {} streams", streams.len());
            for stream in streams {
                print_stream(stream);
            }
        }
    }
}
