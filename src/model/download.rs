use crate::model::preset::FormatPreset;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressStatus {
    Downloading,
    Finished,
    Error,
    /// Any status the engine sends that we have no meaning for
    Other(String),
}

impl ProgressStatus {
    pub fn from_engine(status: &str) -> Self {
        match status {
            "downloading" => Self::Downloading,
            "finished" => Self::Finished,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Downloading => "downloading",
            Self::Finished => "finished",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }
}

/// Snapshot of a single engine progress event.
///
/// Every event produces a fresh value; nothing carries over from the
/// previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    pub status: ProgressStatus,
    pub percentage: f64, // 0.0 to 100.0
    pub speed: Option<String>,
    pub eta: Option<String>,
    pub filename: Option<String>,
    pub error_message: Option<String>,
}

impl ProgressState {
    pub fn new(status: ProgressStatus) -> Self {
        Self {
            status,
            percentage: 0.0,
            speed: None,
            eta: None,
            filename: None,
            error_message: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == ProgressStatus::Finished
    }
}

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub preset: FormatPreset,
    /// Overrides the configured output template when set
    pub output_filename: Option<String>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, preset: FormatPreset) -> Self {
        Self {
            url: url.into(),
            preset,
            output_filename: None,
        }
    }
}
