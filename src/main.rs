//! `reelfetch` CLI - resolve movies and episodes into playable streams

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use reelfetch::{Config, MediaRequest};

#[derive(Parser)]
#[command(name = "reelfetch")]
#[command(about = "Resolve movies and episodes into playable streams")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/reelfetch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Stream proxy base URL, overrides `proxy_url` from the config
    #[arg(long, global = true)]
    proxy: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a movie or episode to a playable stream
    Resolve {
        /// TMDB id
        tmdb_id: String,

        /// Title, used by providers that search by name
        #[arg(long, default_value = "")]
        title: String,

        /// Release year
        #[arg(long, default_value_t = 0)]
        year: u16,

        /// IMDB id (tt…), enables external captions
        #[arg(long)]
        imdb: Option<String>,

        /// Season number (shows only)
        #[arg(long, requires = "episode")]
        season: Option<u32>,

        /// Episode number (shows only)
        #[arg(long, requires = "season")]
        episode: Option<u32>,

        /// Run only this source and print its raw output
        #[arg(long)]
        source: Option<String>,

        /// Provider ids to skip, on top of the config
        #[arg(long = "disable", value_delimiter = ',')]
        disabled: Vec<String>,

        /// Skip external caption lookups
        #[arg(long)]
        no_captions: bool,

        /// Print progress events to stderr as JSON lines
        #[arg(long)]
        events: bool,

        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// List registered sources and embeds, best rank first
    Providers {
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Look up external captions for an IMDB id
    Captions {
        /// IMDB id (tt…)
        imdb_id: String,

        /// TMDB id, used when a backend has no IMDB match
        #[arg(long)]
        tmdb: Option<String>,

        #[arg(long, requires = "episode")]
        season: Option<u32>,

        #[arg(long, requires = "season")]
        episode: Option<u32>,

        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Encode a URL and headers as a stream proxy URL
    ProxyUrl {
        /// Target URL
        url: String,

        /// Header to replay, as "Name: value" (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Wrap this many times
        #[arg(long, default_value_t = 1)]
        depth: u8,
    },

    /// Show the target and headers inside a stream proxy URL
    ProxyDecode {
        /// Proxy URL
        url: String,

        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reelfetch=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(proxy) = cli.proxy {
        config.proxy_url = proxy;
    }

    match cli.command {
        Commands::Resolve {
            tmdb_id,
            title,
            year,
            imdb,
            season,
            episode,
            source,
            disabled,
            no_captions,
            events,
            format,
        } => {
            let mut media = match season.zip(episode) {
                Some((season, episode)) => {
                    MediaRequest::show(title, year, tmdb_id, season, episode)
                }
                None => MediaRequest::movie(title, year, tmdb_id),
            };
            if let Some(imdb) = imdb {
                media = media.with_imdb_id(imdb);
            }
            config.disabled_providers.extend(disabled);
            if no_captions {
                config.captions.enabled = false;
            }
            cmd::resolve::cmd_resolve(&config, &media, source.as_deref(), events, format).await?;
        }
        Commands::Providers { format } => {
            cmd::providers::cmd_providers(&config, format)?;
        }
        Commands::Captions {
            imdb_id,
            tmdb,
            season,
            episode,
            format,
        } => {
            cmd::captions::cmd_captions(&config, &imdb_id, tmdb.as_deref(), season, episode, format)
                .await?;
        }
        Commands::ProxyUrl {
            url,
            headers,
            depth,
        } => {
            cmd::proxy::cmd_proxy_url(&config, &url, &headers, depth)?;
        }
        Commands::ProxyDecode { url, format } => {
            cmd::proxy::cmd_proxy_decode(&url, format)?;
        }
    }

    Ok(())
}
