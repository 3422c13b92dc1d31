mod cli;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands, ConfigAction};
use std::io::Write;
use std::process::exit;
use std::time::{Duration, Instant};
use vidfetch::model::VideoInfo;
use vidfetch::model::download::{DownloadRequest, ProgressState, ProgressStatus};
use vidfetch::model::preset::FormatPreset;
use vidfetch::model::settings::Settings;
use vidfetch::sys::config::Config;
use vidfetch::sys::{deps, download, logging, yt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::get_config_path);
    let (config, config_error) = match Config::load_from(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    let mut settings = Settings::from_config(config.clone());

    let log_file = settings
        .enable_logging
        .then(|| settings.log_path.clone().unwrap_or_else(Config::default_log_path));
    logging::init_logger(log_file, logging::verbosity_level(cli.verbose))?;

    // Config problems are only reported now that the logger is installed
    if let Some(e) = config_error {
        log::warn!("{:#}, using defaults", e);
    }
    for warning in config.warnings() {
        log::warn!("{}", warning);
    }

    match cli.command {
        Commands::Info { url, json } => {
            let info = yt::get_video_info(&url, &settings).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                print_video(&info);
            }
        }
        Commands::Playlist { url, json, limit } => {
            let videos = yt::get_playlist_info(&url, limit, &settings).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&videos)?);
            } else {
                println!("Found {} videos", videos.len());
                for (i, video) in videos.iter().enumerate() {
                    println!(
                        "{:>4}. {}  [{}]  {}",
                        i + 1,
                        video.title,
                        yt::format_duration(video.duration),
                        video.url
                    );
                }
            }
        }
        Commands::Download { url, preset, output, dir } => {
            let preset = match preset {
                Some(name) => name.parse::<FormatPreset>()?,
                None => settings.default_preset,
            };
            if let Some(dir) = dir {
                settings.download_directory = dir;
            }

            let status = deps::check_dependencies(&settings)?;
            log::info!("yt-dlp version: {}", status.yt_dlp_version);
            if preset.needs_audio_extraction() && !status.ffmpeg_installed {
                bail!("{} needs ffmpeg to convert audio, but it was not found", preset);
            }

            let request = DownloadRequest {
                url,
                preset,
                output_filename: output,
            };
            println!("Downloading as {} into {}", preset, settings.download_directory.display());

            let mut renderer = ProgressRenderer::new();
            let path = download::download(&request, &settings, |p| renderer.render(&p)).await?;
            println!("Download completed: {}", path.display());
        }
        Commands::Presets => {
            for preset in FormatPreset::ALL {
                println!(
                    "{:<9} {:<20} {:<48} {}",
                    preset.slug(),
                    preset.label(),
                    preset.selector(),
                    if preset.needs_audio_extraction() { "-> mp3" } else { "" }
                );
            }
        }
        Commands::Validate { url } => {
            if yt::validate_url(&url, &settings).await {
                println!("OK: {}", url);
            } else {
                eprintln!("Not extractable: {}", url);
                exit(1);
            }
        }
        Commands::Extractors => {
            for name in yt::list_extractors(&settings).await? {
                println!("{}", name);
            }
        }
        Commands::Check => {
            let status = deps::check_dependencies(&settings)?;
            println!("yt-dlp version: {}", status.yt_dlp_version);
            if status.ffmpeg_installed {
                println!("ffmpeg: found");
            } else {
                println!("WARNING: ffmpeg not found. MP3 downloads and format merging will not work.");
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Path => println!("{}", config_path.display()),
            ConfigAction::Init { force } => {
                if config_path.exists() && !force {
                    bail!("{} already exists, pass --force to overwrite it", config_path.display());
                }
                config.save_to(&config_path)?;
                println!("Wrote {}", config_path.display());
            }
        },
    }

    Ok(())
}

fn print_video(video: &VideoInfo) {
    println!("{}", video.title);
    println!("  Uploader: {}", video.uploader);
    if video.duration > 0 {
        println!("  Duration: {}", yt::format_duration(video.duration));
    }
    if video.view_count > 0 {
        println!("  Views:    {}", video.view_count);
    }
    if !video.upload_date.is_empty() {
        println!("  Uploaded: {}", video.upload_date);
    }
    if !video.thumbnail.is_empty() {
        println!("  Thumbnail: {}", video.thumbnail);
    }
    println!("  Formats:  {}", video.formats.len());
    if !video.description.is_empty() {
        let description: String = video.description.chars().take(500).collect();
        let ellipsis = if video.description.chars().count() > 500 { "..." } else { "" };
        println!();
        println!("{}{}", description, ellipsis);
    }
}

/// Draws a single updating progress line on stderr.
struct ProgressRenderer {
    last_draw: Option<Instant>,
    min_interval: Duration,
}

impl ProgressRenderer {
    fn new() -> Self {
        Self {
            last_draw: None,
            min_interval: Duration::from_millis(100),
        }
    }

    fn render(&mut self, progress: &ProgressState) {
        let mut stderr = std::io::stderr();
        match &progress.status {
            ProgressStatus::Downloading => {
                // The engine can emit many events per second; redraw at most every min_interval
                if self.last_draw.is_some_and(|t| t.elapsed() < self.min_interval) {
                    return;
                }
                self.last_draw = Some(Instant::now());
                let _ = write!(
                    stderr,
                    "\r{:>6.1}%  {:>12}  ETA {:<8}",
                    progress.percentage,
                    progress.speed.as_deref().unwrap_or("--"),
                    progress.eta.as_deref().unwrap_or("--:--"),
                );
                let _ = stderr.flush();
            }
            ProgressStatus::Finished => {
                self.last_draw = None;
                let _ = writeln!(stderr, "\r{:>6.1}%  done{:30}", progress.percentage, "");
            }
            ProgressStatus::Error => {
                let _ = writeln!(
                    stderr,
                    "\nError: {}",
                    progress.error_message.as_deref().unwrap_or("Unknown error")
                );
            }
            ProgressStatus::Other(_) => log::debug!("Engine status: {}", progress.status.as_str()),
        }
    }
}
