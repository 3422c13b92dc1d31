use crate::model::download::{ProgressState, ProgressStatus};
use serde_json::Value;

/// Projects a raw engine progress event into a [`ProgressState`].
///
/// Never fails: missing keys and unexpected types fall back to defaults,
/// since progress display must not abort a download.
pub fn project(raw: &Value) -> ProgressState {
    let status = ProgressStatus::from_engine(raw["status"].as_str().unwrap_or_default());
    let mut progress = ProgressState::new(status);

    match progress.status {
        ProgressStatus::Downloading => {
            progress.percentage = download_percentage(raw);
            progress.speed = string_field(raw, "_speed_str");
            progress.eta = string_field(raw, "_eta_str");
            progress.filename = string_field(raw, "filename");
        }
        ProgressStatus::Finished => {
            progress.percentage = 100.0;
            progress.filename = string_field(raw, "filename");
        }
        ProgressStatus::Error => {
            progress.error_message = Some(match &raw["error"] {
                Value::Null => "Unknown error".to_string(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        }
        ProgressStatus::Other(_) => {}
    }

    progress
}

/// Feeds engine events to one observer. Build one per download.
pub struct ProgressProjector<F>
where
    F: FnMut(ProgressState),
{
    observer: F,
}

impl<F> ProgressProjector<F>
where
    F: FnMut(ProgressState),
{
    pub fn new(observer: F) -> Self {
        Self { observer }
    }

    pub fn on_engine_event(&mut self, raw: &Value) {
        let progress = project(raw);
        (self.observer)(progress);
    }
}

fn download_percentage(raw: &Value) -> f64 {
    let total = raw["total_bytes"].as_f64().filter(|t| *t > 0.0);
    let pct = match total {
        Some(total) => raw["downloaded_bytes"].as_f64().unwrap_or(0.0) / total * 100.0,
        None => raw["_percent_str"]
            .as_str()
            .map(parse_percent_str)
            .unwrap_or(0.0),
    };
    pct.clamp(0.0, 100.0)
}

/// Parses strings like `" 53.2%"`, including ones wrapped in terminal color
/// codes. Anything unparsable is 0.0.
pub fn parse_percent_str(s: &str) -> f64 {
    let cleaned = console::strip_ansi_codes(s);
    cleaned
        .trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw[key]
        .as_str()
        .map(|s| console::strip_ansi_codes(s).trim().to_string())
}
