//! Discovery Sync - weekly music recommendations into your media server.
//!
//! Fetches recommended tracks, resolves them against a media server library
//! (Subsonic, Jellyfin, Emby, Plex or MPD), acquires the missing ones and
//! reconciles a playlist in the target library.

pub mod acquire;
pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod recommend;
pub mod reconcile;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Config is loaded first so its `debug` flag can set the log level
    let (config, source) = config::load(args.config.as_deref())?;

    let level = if args.debug || config.debug {
        "discovery_sync=debug"
    } else {
        "discovery_sync=info"
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    match source {
        config::ConfigSource::NoConfigDir => tracing::warn!("{}", source),
        _ => tracing::info!("{}", source),
    }

    cli::run_command(&args, config)
}
