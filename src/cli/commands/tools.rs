//! The check-tools command.

use tokio::runtime::Runtime;

use crate::acquire::{Ffmpeg, YtDlp};
use crate::config::Config;

/// Check external tools and API keys
pub fn cmd_check_tools(rt: &Runtime, config: &Config) -> anyhow::Result<()> {
    println!("Checking acquisition tools...\n");

    let ytdlp = YtDlp::new(&config.youtube.ytdlp_path);
    match rt.block_on(ytdlp.version()) {
        Ok(version) => println!("✓ yt-dlp: {}", version),
        Err(e) => {
            println!("✗ yt-dlp: NOT FOUND ({})", e);
            println!("  Install: https://github.com/yt-dlp/yt-dlp#installation");
        }
    }

    let ffmpeg = Ffmpeg::new(&config.youtube.ffmpeg_path);
    match rt.block_on(ffmpeg.version()) {
        Ok(version) => println!("✓ ffmpeg: {}", version),
        Err(e) => {
            println!("✗ ffmpeg: NOT FOUND ({})", e);
            println!("  Windows: winget install Gyan.FFmpeg");
            println!("  macOS:   brew install ffmpeg");
            println!("  Linux:   apt install ffmpeg");
        }
    }

    println!();
    println!("API Keys:");
    print_key("YOUTUBE_API_KEY", config.youtube.api_key.as_deref());
    print_key("API_KEY", config.backend.api_key.as_deref());
    match config.listenbrainz.user.as_deref() {
        Some(user) if !user.is_empty() => println!("✓ LISTENBRAINZ_USER: {}", user),
        _ => println!("✗ LISTENBRAINZ_USER: not set"),
    }

    Ok(())
}

fn print_key(name: &str, value: Option<&str>) {
    if value.is_some_and(|v| !v.is_empty()) {
        println!("✓ {}: set", name);
    } else {
        println!("✗ {}: not set", name);
    }
}
