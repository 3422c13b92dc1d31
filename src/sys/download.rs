use crate::error::{Error, Result};
use crate::model::download::{DownloadRequest, ProgressState};
use crate::model::preset::MP3_BITRATE_KBPS;
use crate::model::settings::Settings;
use crate::sys::progress::ProgressProjector;
use crate::sys::yt::{build_base_command, engine_error_message};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Marks stdout lines carrying a JSON progress-hook event.
pub const PROGRESS_PREFIX: &str = "[vidfetch:progress] ";
/// Marks the stdout line carrying the final media path.
pub const FILEPATH_PREFIX: &str = "[vidfetch:filepath] ";

#[derive(Debug, PartialEq)]
pub enum EngineLine {
    Progress(Value),
    Filepath(String),
    /// A progress line whose JSON did not parse
    Malformed(String),
    Other(String),
}

pub fn classify_line(line: &str) -> EngineLine {
    if let Some(rest) = line.strip_prefix(PROGRESS_PREFIX) {
        match serde_json::from_str::<Value>(rest) {
            Ok(val) => EngineLine::Progress(val),
            Err(_) => EngineLine::Malformed(rest.to_string()),
        }
    } else if let Some(path) = line.strip_prefix(FILEPATH_PREFIX) {
        EngineLine::Filepath(path.trim_end().to_string())
    } else {
        EngineLine::Other(line.to_string())
    }
}

pub fn output_template(request: &DownloadRequest, settings: &Settings) -> String {
    let name = request
        .output_filename
        .as_deref()
        .unwrap_or(&settings.output_template);
    settings.download_directory.join(name).to_string_lossy().to_string()
}

pub fn download_args(request: &DownloadRequest, settings: &Settings) -> Vec<String> {
    let mut args = vec![
        "-f".to_string(),
        request.preset.selector().to_string(),
        "-o".to_string(),
        output_template(request, settings),
        "--no-playlist".to_string(),
        "--newline".to_string(),
        "--progress".to_string(),
        "--progress-template".to_string(),
        format!("download:{}%(progress)j", PROGRESS_PREFIX),
        "--print".to_string(),
        format!("after_move:{}%(filepath)s", FILEPATH_PREFIX),
        "--no-simulate".to_string(),
    ];

    if request.preset.needs_audio_extraction() {
        args.push("--extract-audio".to_string());
        args.push("--audio-format".to_string());
        args.push("mp3".to_string());
        args.push("--audio-quality".to_string());
        args.push(format!("{}K", MP3_BITRATE_KBPS));
    }

    if let Some(ffmpeg) = settings.ffmpeg_location() {
        args.push("--ffmpeg-location".to_string());
        args.push(ffmpeg.to_string());
    }

    args.push("--".to_string());
    args.push(request.url.clone());
    args
}

/// Runs the engine for one download, handing every progress event to
/// `observer` as it arrives. Returns the path of the finished file.
pub async fn download<F>(request: &DownloadRequest, settings: &Settings, observer: F) -> Result<PathBuf>
where
    F: FnMut(ProgressState),
{
    tokio::fs::create_dir_all(&settings.download_directory)
        .await
        .map_err(|e| Error::DownloadFailure(format!("Failed to create download dir: {}", e)))?;

    let mut cmd = build_base_command(settings);
    cmd.args(download_args(request, settings));
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    log::info!("Starting download of {} as {}", request.url, request.preset);
    log::debug!("Download command: {:?}", cmd);

    let mut child = cmd.spawn().map_err(|e| {
        log::error!("Failed to spawn yt-dlp for download: {}", e);
        Error::DownloadFailure(format!("Failed to spawn yt-dlp: {}", e))
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::DownloadFailure("Failed to take stdout".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| Error::DownloadFailure("Failed to take stderr".to_string()))?;

    // Drain stderr on its own so a chatty engine never blocks on a full pipe
    let stderr_task = tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        let mut collected = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            log::debug!("yt-dlp stderr: {}", line);
            collected.push(line);
        }
        collected
    });

    let mut projector = ProgressProjector::new(observer);
    let mut final_path: Option<PathBuf> = None;
    let mut last_filename: Option<String> = None;

    let mut lines = BufReader::new(stdout).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| Error::DownloadFailure(format!("Failed to read yt-dlp output: {}", e)))?
    {
        match classify_line(&line) {
            EngineLine::Progress(raw) => {
                if let Some(name) = raw["filename"].as_str() {
                    last_filename = Some(name.to_string());
                }
                projector.on_engine_event(&raw);
            }
            EngineLine::Filepath(path) => final_path = Some(PathBuf::from(path)),
            EngineLine::Malformed(rest) => log::warn!("Unparsable progress event: {}", rest),
            EngineLine::Other(line) => log::debug!("yt-dlp: {}", line),
        }
    }

    let status = child
        .wait()
        .await
        .map_err(|e| Error::DownloadFailure(format!("Failed to wait for download process: {}", e)))?;
    let stderr_lines = stderr_task.await.unwrap_or_default();

    if !status.success() {
        let msg = if stderr_lines.iter().all(|l| l.trim().is_empty()) {
            format!("yt-dlp exited with code {:?}", status.code())
        } else {
            engine_error_message(stderr_lines.join("\n").as_bytes())
        };
        log::error!("Download of {} failed: {}", request.url, msg);
        projector.on_engine_event(&json!({"status": "error", "error": msg}));
        return Err(Error::DownloadFailure(msg));
    }

    let path = final_path
        .or_else(|| last_filename.map(PathBuf::from))
        .unwrap_or_else(|| settings.download_directory.clone());
    log::info!("Finished download of {} to {}", request.url, path.display());
    Ok(path)
}
