use crate::model::preset::FormatPreset;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_download_directory")]
    pub download_directory: String,
    #[serde(default = "default_output_template")]
    pub output_template: String,
    #[serde(default = "default_preset")]
    pub default_preset: String,
    #[serde(default)]
    pub executables: ExecutablesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutablesConfig {
    #[serde(default)]
    pub enabled: bool,
    pub ytdlp: Option<String>,
    pub ffmpeg: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enabled: bool,
    pub path: Option<PathBuf>,
}

fn default_output_template() -> String { "%(title)s.%(ext)s".to_string() }
fn default_preset() -> String { "mp4".to_string() }
fn default_download_directory() -> String {
    directories::UserDirs::new()
        .map(|user_dirs| {
            user_dirs
                .download_dir()
                .map(|p| p.join("vidfetch"))
                .unwrap_or_else(|| user_dirs.home_dir().join("Downloads").join("vidfetch"))
        })
        .unwrap_or_else(|| PathBuf::from("./downloads"))
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_directory: default_download_directory(),
            output_template: default_output_template(),
            default_preset: default_preset(),
            executables: ExecutablesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn get_config_path() -> PathBuf {
        ProjectDirs::from("com", "vidfetch", "vidfetch")
            .map(|proj_dirs| proj_dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| home_dir().join(".vidfetch").join("config.toml"))
    }

    pub fn default_log_path() -> PathBuf {
        ProjectDirs::from("com", "vidfetch", "vidfetch")
            .map(|proj_dirs| proj_dirs.data_local_dir().join("vidfetch.log"))
            .unwrap_or_else(|| home_dir().join(".vidfetch").join("vidfetch.log"))
    }

    /// Reads the config at `path`. A missing file gives the defaults; an
    /// unreadable or invalid one is an error, which callers report once
    /// logging is up before carrying on with the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Values that parse but cannot be used as written.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Err(e) = self.default_preset.parse::<FormatPreset>() {
            warnings.push(format!("{}, falling back to {}", e, FormatPreset::default()));
        }
        if self.output_template.trim().is_empty() {
            warnings.push("Empty output_template, using %(title)s.%(ext)s".to_string());
        }
        warnings
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut content = String::from("# vidfetch configuration\n\n");

        content.push_str("# The directory where videos and audio will be downloaded.\n");
        content.push_str(&format!("download_directory = {}\n\n", toml_string(&self.download_directory)));

        content.push_str("# Output file name template, in yt-dlp's output template syntax.\n");
        content.push_str(&format!("output_template = {}\n\n", toml_string(&self.output_template)));

        content.push_str("# Preset used when none is given on the command line.\n");
        content.push_str("# Options: \"mp4\", \"mp4-720\", \"mp4-480\", \"mp3\", \"audio\"\n");
        content.push_str(&format!("default_preset = {}\n\n", toml_string(&self.default_preset)));

        content.push_str("[executables]\n");
        content.push_str("# Use the paths below instead of looking the tools up in PATH.\n");
        content.push_str(&format!("enabled = {}\n", self.executables.enabled));
        if let Some(p) = &self.executables.ytdlp {
            content.push_str(&format!("ytdlp = {}\n", toml_string(p)));
        }
        if let Some(p) = &self.executables.ffmpeg {
            content.push_str(&format!("ffmpeg = {}\n", toml_string(p)));
        }

        content.push_str("\n[logging]\n");
        content.push_str(&format!("enabled = {}\n", self.logging.enabled));
        if let Some(p) = &self.logging.path {
            content.push_str(&format!("path = {}\n", toml_string(&p.to_string_lossy())));
        }

        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn expand_tilde(path: &str) -> PathBuf {
        match path.strip_prefix("~/") {
            Some(rest) => home_dir().join(rest),
            None if path == "~" => home_dir(),
            None => PathBuf::from(path),
        }
    }
}

fn home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn toml_string(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let config: Config = toml::from_str("download_directory = \"/tmp/media\"\n").unwrap();
        assert_eq!(config.download_directory, "/tmp/media");
        assert_eq!(config.output_template, "%(title)s.%(ext)s");
        assert_eq!(config.default_preset, "mp4");
        assert!(!config.executables.enabled);
        assert!(!config.logging.enabled);
    }

    #[test]
    fn sections_parse() {
        let src = r#"
            default_preset = "mp3"

            [executables]
            enabled = true
            ytdlp = "/opt/yt-dlp"

            [logging]
            enabled = true
            path = "/var/log/vidfetch.log"
        "#;
        let config: Config = toml::from_str(src).unwrap();
        assert_eq!(config.default_preset, "mp3");
        assert!(config.executables.enabled);
        assert_eq!(config.executables.ytdlp.as_deref(), Some("/opt/yt-dlp"));
        assert!(config.executables.ffmpeg.is_none());
        assert_eq!(config.logging.path, Some(PathBuf::from("/var/log/vidfetch.log")));
    }

    #[test]
    fn saved_file_loads_back() {
        let dir = std::env::temp_dir().join(format!("vidfetch-config-{}", std::process::id()));
        let path = dir.join("config.toml");

        let mut config = Config::default();
        config.download_directory = "C:\\Users\\me\\Videos \"x\"".to_string();
        config.default_preset = "mp4-720".to_string();
        config.executables.ffmpeg = Some("/usr/local/bin/ffmpeg".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.download_directory, config.download_directory);
        assert_eq!(loaded.default_preset, "mp4-720");
        assert_eq!(loaded.executables.ffmpeg.as_deref(), Some("/usr/local/bin/ffmpeg"));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn invalid_file_is_reported() {
        let dir = std::env::temp_dir().join(format!("vidfetch-bad-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "download_directory = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid config"));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("vidfetch-no-such-dir").join("config.toml");
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.output_template, default_output_template());
        assert_eq!(loaded.default_preset, "mp4");
    }

    #[test]
    fn unusable_values_are_warned_about() {
        assert!(Config::default().warnings().is_empty());

        let mut config = Config::default();
        config.default_preset = "8k-hdr".to_string();
        config.output_template = " ".to_string();
        let warnings = config.warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("8k-hdr"));
        assert!(warnings[0].contains("MP4 - Best Quality"));
    }

    #[test]
    fn tilde_expands_to_home() {
        assert_eq!(Config::expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(Config::expand_tilde("~/bin/yt-dlp"), home_dir().join("bin/yt-dlp"));
    }
}
