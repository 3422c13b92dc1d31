use crate::model::preset::FormatPreset;
use crate::sys::config::Config;
use std::path::PathBuf;

/// Effective runtime settings, resolved from the config file and CLI flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub enable_logging: bool,
    pub use_custom_paths: bool,

    pub download_directory: PathBuf,
    pub output_template: String,
    pub default_preset: FormatPreset,

    // Resolved paths (either from system or config depending on use_custom_paths)
    pub ytdlp_path: String,
    pub ffmpeg_path: String,

    pub log_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_logging: false,
            use_custom_paths: false,
            download_directory: PathBuf::from("./downloads"),
            output_template: "%(title)s.%(ext)s".to_string(),
            default_preset: FormatPreset::default(),
            ytdlp_path: "yt-dlp".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            log_path: None,
        }
    }
}

impl Settings {
    pub fn from_config(config: Config) -> Self {
        let mut settings = Self::default();

        settings.enable_logging = config.logging.enabled;
        settings.log_path = config
            .logging
            .path
            .map(|p| Config::expand_tilde(&p.to_string_lossy()));

        settings.download_directory = Config::expand_tilde(&config.download_directory);
        if !config.output_template.trim().is_empty() {
            settings.output_template = config.output_template;
        }

        // Config::warnings reports presets that do not parse
        if let Ok(preset) = config.default_preset.parse::<FormatPreset>() {
            settings.default_preset = preset;
        }

        // Custom paths are recorded either way; only the *_cmd helpers check the flag
        settings.use_custom_paths = config.executables.enabled;
        if let Some(p) = config.executables.ytdlp {
            settings.ytdlp_path = Config::expand_tilde(&p).to_string_lossy().to_string();
        }
        if let Some(p) = config.executables.ffmpeg {
            settings.ffmpeg_path = Config::expand_tilde(&p).to_string_lossy().to_string();
        }

        settings
    }

    pub fn ytdlp_cmd(&self) -> &str {
        if self.use_custom_paths {
            &self.ytdlp_path
        } else {
            "yt-dlp"
        }
    }

    pub fn ffmpeg_cmd(&self) -> &str {
        if self.use_custom_paths {
            &self.ffmpeg_path
        } else {
            "ffmpeg"
        }
    }

    /// The ffmpeg location to hand to the engine, if it differs from PATH lookup.
    pub fn ffmpeg_location(&self) -> Option<&str> {
        if self.use_custom_paths && self.ffmpeg_path != "ffmpeg" {
            Some(&self.ffmpeg_path)
        } else {
            None
        }
    }
}
