//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `sync`: One full recommendation-to-playlist run
//! - `tools`: External tool and API key checks

mod sync;
mod tools;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::config::{Config, Discovery, System};

pub use sync::cmd_sync;
pub use tools::cmd_check_tools;

/// Discovery Sync CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to the OS config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings that override the config file
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Media server family
    #[arg(long, env = "EXPLO_SYSTEM", global = true, value_enum)]
    pub system: Option<System>,

    /// Media server URL
    #[arg(long, env = "SYSTEM_URL", global = true)]
    pub url: Option<String>,

    /// Media server API key or token
    #[arg(long, env = "API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Media server username
    #[arg(long, env = "SYSTEM_USERNAME", global = true)]
    pub username: Option<String>,

    /// Media server password
    #[arg(long, env = "SYSTEM_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// YouTube Data API key
    #[arg(long, env = "YOUTUBE_API_KEY", global = true, hide_env_values = true)]
    pub youtube_api_key: Option<String>,

    /// Directory acquired tracks are written to
    #[arg(long, env = "DOWNLOAD_DIR", global = true)]
    pub download_dir: Option<PathBuf>,

    /// ListenBrainz user to fetch recommendations for
    #[arg(long, env = "LISTENBRAINZ_USER", global = true)]
    pub listenbrainz_user: Option<String>,

    /// Recommendation mode: playlist, test or api
    #[arg(long, env = "LISTENBRAINZ_DISCOVERY", global = true, value_enum)]
    pub discovery: Option<Discovery>,
}

impl Overrides {
    /// Apply every override that was given on the command line or environment.
    pub fn apply(&self, config: &mut Config) {
        if let Some(system) = self.system {
            config.system = Some(system);
        }
        if let Some(ref url) = self.url {
            config.backend.url = url.clone();
        }
        if let Some(ref key) = self.api_key {
            config.backend.api_key = Some(key.clone());
        }
        if let Some(ref user) = self.username {
            config.backend.user = Some(user.clone());
        }
        if let Some(ref password) = self.password {
            config.backend.password = Some(password.clone());
        }
        if let Some(ref key) = self.youtube_api_key {
            config.youtube.api_key = Some(key.clone());
        }
        if let Some(ref dir) = self.download_dir {
            config.youtube.download_dir = dir.clone();
        }
        if let Some(ref user) = self.listenbrainz_user {
            config.listenbrainz.user = Some(user.clone());
        }
        if let Some(discovery) = self.discovery {
            config.listenbrainz.discovery = discovery;
        }
    }
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Sync this week's recommendations into a playlist
    Sync {
        /// Read tracks from a JSON file instead of ListenBrainz
        #[arg(long)]
        tracks: Option<PathBuf>,
        /// Keep previous playlists and downloads
        #[arg(
            long,
            env = "PERSIST",
            num_args = 0..=1,
            default_missing_value = "true"
        )]
        persist: Option<bool>,
        /// Replace the previous playlist and clear old downloads
        #[arg(long)]
        no_persist: bool,
        /// Dry run - only report which tracks would be acquired
        #[arg(long)]
        dry_run: bool,
    },
    /// Check that yt-dlp and ffmpeg are installed and keys are configured
    CheckTools,
}

/// Run the specified CLI command against `config`.
pub fn run_command(cli: &Cli, mut config: Config) -> anyhow::Result<()> {
    cli.overrides.apply(&mut config);

    let rt = Runtime::new()?;

    match &cli.command {
        Commands::Sync {
            tracks,
            persist,
            no_persist,
            dry_run,
        } => {
            if *no_persist {
                config.playlist.persist = false;
            } else if let Some(persist) = persist {
                config.playlist.persist = *persist;
            }
            cmd_sync(&rt, &config, tracks.as_deref(), *dry_run)
        }
        Commands::CheckTools => cmd_check_tools(&rt, &config),
    }
}
