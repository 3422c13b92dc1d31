use serde::{Deserialize, Serialize};

pub mod download;
pub mod preset;
pub mod settings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration: u64, // seconds
    pub uploader: String,
    pub upload_date: String, // YYYYMMDD as the engine reports it
    pub view_count: u64,
    pub thumbnail: String,
    #[serde(default)]
    pub formats: Vec<FormatDescriptor>,
    /// The URL this record was extracted from
    pub url: String,
}

impl Default for VideoInfo {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: "Unknown Title".to_string(),
            description: String::new(),
            duration: 0,
            uploader: "Unknown".to_string(),
            upload_date: String::new(),
            view_count: 0,
            thumbnail: String::new(),
            formats: Vec::new(),
            url: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    pub format_id: String,
    pub ext: String,
    pub quality: Option<f64>,
    pub filesize: Option<u64>,
    pub format_note: String, // e.g. "720p" or "medium"
}
