use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The engine could not turn the URL into metadata.
    #[error("Failed to extract video info: {0}")]
    ExtractionFailure(String),

    /// Extraction worked but the download step did not.
    #[error("Download failed: {0}")]
    DownloadFailure(String),

    /// A playlist or channel URL resolved to zero entries.
    #[error("No videos found in playlist/channel: {0}")]
    EmptyPlaylist(String),

    #[error("Unknown format preset: {0}")]
    UnknownPreset(String),
}

pub type Result<T> = std::result::Result<T, Error>;
