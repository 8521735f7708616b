use anyhow::Result;

use reelfetch::encode_media_bundle;
use reelfetch::Config;

use super::output::{print_captions, print_json};
use crate::OutputFormat;

pub async fn cmd_captions(
    config: &Config,
    imdb_id: &str,
    tmdb_id: Option<&str>,
    season: Option<u32>,
    episode: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    let (proxied, direct) = config.fetchers()?;
    let aggregator = config.caption_aggregator(&proxied, &direct);
    let bundle = encode_media_bundle(imdb_id, season, episode);

    let captions = aggregator.augment(Vec::new(), &bundle, tmdb_id).await;

    match format {
        OutputFormat::Json => print_json(&captions)?,
        OutputFormat::Text => {
            println!("💬 {imdb_id}");
            print_captions(&captions);
        }
    }
    Ok(())
}
