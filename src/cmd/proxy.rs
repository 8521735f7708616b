use anyhow::{bail, Context, Result};

use reelfetch::fetch::HeaderList;
use reelfetch::{proxy, Config, ProxyCodec};

use super::output::print_json;
use crate::OutputFormat;

pub fn cmd_proxy_url(config: &Config, url: &str, headers: &[String], depth: u8) -> Result<()> {
    if depth == 0 {
        bail!("depth must be at least 1");
    }
    let codec = ProxyCodec::new(&config.proxy_url)
        .with_context(|| format!("invalid proxy URL {}", config.proxy_url))?;
    let headers = parse_headers(headers)?;

    let mut wrapped = codec.wrap(url, &headers);
    for _ in 1..depth {
        wrapped = codec.rewrap(&wrapped, &headers);
    }
    println!("{}", wrapped.url);
    Ok(())
}

pub fn cmd_proxy_decode(url: &str, format: OutputFormat) -> Result<()> {
    let decoded = proxy::decode(url).context("not a stream proxy URL")?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "target": decoded.target,
            "headers": decoded.headers,
        }))?,
        OutputFormat::Text => {
            println!("🎯 {}", decoded.target);
            for (name, value) in &decoded.headers {
                println!("   {name}: {value}");
            }
        }
    }
    Ok(())
}

/// `"Name: value"` pairs into a header list.
fn parse_headers(raw: &[String]) -> Result<HeaderList> {
    raw.iter()
        .map(|line| {
            let (name, value) = line
                .split_once(':')
                .with_context(|| format!("header must be \"Name: value\": {line}"))?;
            Ok((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}
