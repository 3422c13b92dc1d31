use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target bitrate for the MP3 post-processing step.
pub const MP3_BITRATE_KBPS: u32 = 192;

/// The fixed set of quality choices offered to users.
///
/// Selector strings are in the engine's own format mini-language and are
/// passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FormatPreset {
    #[default]
    Mp4Best,
    Mp4Max720,
    Mp4Max480,
    Mp3Audio,
    AudioOnly,
}

impl FormatPreset {
    pub const ALL: [FormatPreset; 5] = [
        FormatPreset::Mp4Best,
        FormatPreset::Mp4Max720,
        FormatPreset::Mp4Max480,
        FormatPreset::Mp3Audio,
        FormatPreset::AudioOnly,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Mp4Best => "MP4 - Best Quality",
            Self::Mp4Max720 => "MP4 - 720p",
            Self::Mp4Max480 => "MP4 - 480p",
            Self::Mp3Audio => "MP3 - Audio Only",
            Self::AudioOnly => "Audio Only",
        }
    }

    /// Short name accepted on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Mp4Best => "mp4",
            Self::Mp4Max720 => "mp4-720",
            Self::Mp4Max480 => "mp4-480",
            Self::Mp3Audio => "mp3",
            Self::AudioOnly => "audio",
        }
    }

    pub fn selector(self) -> &'static str {
        match self {
            Self::Mp4Best => "best[ext=mp4]/best",
            Self::Mp4Max720 => "best[height<=720][ext=mp4]/best[height<=720]",
            Self::Mp4Max480 => "best[height<=480][ext=mp4]/best[height<=480]",
            Self::Mp3Audio => "bestaudio[ext=m4a]/bestaudio/best",
            Self::AudioOnly => "bestaudio/best",
        }
    }

    /// Whether the caller must ask the engine to convert the result to MP3.
    pub fn needs_audio_extraction(self) -> bool {
        matches!(self, Self::Mp3Audio)
    }

    /// Looks a preset up by label or slug and returns its selector and
    /// audio extraction flag.
    pub fn resolve(name: &str) -> Result<(&'static str, bool)> {
        let preset: FormatPreset = name.parse()?;
        Ok((preset.selector(), preset.needs_audio_extraction()))
    }
}

impl FromStr for FormatPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(name) || p.slug().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::UnknownPreset(s.to_string()))
    }
}

impl fmt::Display for FormatPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
