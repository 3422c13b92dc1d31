use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vidfetch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch video metadata and media through yt-dlp")]
#[command(after_help = "PRESETS:
   mp4       MP4 - Best Quality
   mp4-720   MP4 - 720p
   mp4-480   MP4 - 480p
   mp3       MP3 - Audio Only (converted, 192 kbps)
   audio     Audio Only (best audio, no conversion)
")]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log to stderr; repeat for more detail
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show metadata for a video
    Info {
        url: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List the videos of a playlist or channel
    Playlist {
        url: String,
        #[arg(long)]
        json: bool,
        /// Stop after this many entries
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Download a video
    Download {
        url: String,
        /// Preset label or short name; defaults to the configured preset
        #[arg(short, long)]
        preset: Option<String>,
        /// Output file name (yt-dlp template syntax) inside the download directory
        #[arg(short, long)]
        output: Option<String>,
        /// Download directory
        #[arg(short = 'd', long)]
        dir: Option<PathBuf>,
    },
    /// List the available presets
    Presets,
    /// Exit successfully if yt-dlp can extract the URL
    Validate { url: String },
    /// List the sites yt-dlp supports
    Extractors,
    /// Check that yt-dlp and ffmpeg are available
    Check,
    /// Locate or write the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print where the config file is read from
    Path,
    /// Write a commented config file holding the current values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
