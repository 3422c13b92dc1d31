use crate::error::{Error, Result};
use crate::model::settings::Settings;
use crate::model::{FormatDescriptor, VideoInfo};
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;

/// A `yt-dlp` command using the configured executable.
pub fn build_base_command(settings: &Settings) -> Command {
    let mut cmd = Command::new(settings.ytdlp_cmd());
    cmd.stdin(Stdio::null());
    cmd.kill_on_drop(true);
    cmd
}

/// Extracts metadata for a single video. Playlist and channel URLs resolve
/// to their first entry.
pub async fn get_video_info(url: &str, settings: &Settings) -> Result<VideoInfo> {
    log::info!("Extracting video info for {}", url);
    let val = dump_json(url, &["--playlist-items", "1"], settings).await?;
    let entry = first_entry(val, url)?;
    Ok(video_info_from_value(&entry, url))
}

/// Lists the entries of a playlist or channel without resolving each one.
/// A plain video URL yields a single full record.
pub async fn get_playlist_info(
    url: &str,
    limit: Option<u32>,
    settings: &Settings,
) -> Result<Vec<VideoInfo>> {
    log::info!("Extracting playlist info for {}", url);
    let limit_str = limit.map(|l| l.to_string());
    let mut args = vec!["--flat-playlist"];
    if let Some(end) = &limit_str {
        args.push("--playlist-end");
        args.push(end);
    }

    let val = dump_json(url, &args, settings).await?;
    if val.get("entries").is_none() {
        return Ok(vec![get_video_info(url, settings).await?]);
    }
    playlist_entries(&val, url)
}

/// True when the engine can extract the URL.
pub async fn validate_url(url: &str, settings: &Settings) -> bool {
    match dump_json(url, &["--playlist-items", "1"], settings).await {
        Ok(_) => true,
        Err(e) => {
            log::debug!("URL {} did not validate: {}", url, e);
            false
        }
    }
}

pub async fn list_extractors(settings: &Settings) -> Result<Vec<String>> {
    let output = build_base_command(settings)
        .arg("--list-extractors")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| Error::ExtractionFailure(format!("Failed to spawn yt-dlp: {}", e)))?;

    if !output.status.success() {
        return Err(Error::ExtractionFailure(engine_error_message(&output.stderr)));
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Arguments for a JSON extraction. The URL goes after `--` so one that
/// starts with a dash is never read as an option.
pub fn extraction_args(url: &str, extra_args: &[&str]) -> Vec<String> {
    let mut args = vec!["--dump-single-json".to_string(), "--no-warnings".to_string()];
    args.extend(extra_args.iter().map(|a| a.to_string()));
    args.push("--".to_string());
    args.push(url.to_string());
    args
}

async fn dump_json(url: &str, extra_args: &[&str], settings: &Settings) -> Result<Value> {
    let mut cmd = build_base_command(settings);
    cmd.args(extraction_args(url, extra_args))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    log::debug!("Extraction command: {:?}", cmd);

    let output = cmd.output().await.map_err(|e| {
        log::error!("Failed to spawn yt-dlp for extraction: {}", e);
        Error::ExtractionFailure(format!("Failed to spawn yt-dlp: {}", e))
    })?;

    if !output.status.success() {
        let msg = engine_error_message(&output.stderr);
        log::error!("yt-dlp extraction failed for {}: {}", url, msg);
        return Err(Error::ExtractionFailure(msg));
    }

    serde_json::from_slice(&output.stdout)
        .map_err(|e| Error::ExtractionFailure(format!("Failed to parse yt-dlp JSON: {}", e)))
}

/// Unwraps a multi-item result to its first entry.
pub fn first_entry(val: Value, url: &str) -> Result<Value> {
    match val.get("entries") {
        None => Ok(val),
        Some(entries) => entries
            .as_array()
            .and_then(|list| list.iter().find(|e| e.is_object()))
            .cloned()
            .ok_or_else(|| Error::EmptyPlaylist(url.to_string())),
    }
}

pub fn video_info_from_value(val: &Value, url: &str) -> VideoInfo {
    let formats = val["formats"]
        .as_array()
        .map(|list| list.iter().map(format_from_value).collect())
        .unwrap_or_default();

    VideoInfo {
        id: str_or(val, "id", ""),
        title: str_or(val, "title", "Unknown Title"),
        description: str_or(val, "description", ""),
        duration: val["duration"].as_f64().unwrap_or(0.0) as u64,
        uploader: str_or(val, "uploader", "Unknown"),
        upload_date: str_or(val, "upload_date", ""),
        view_count: val["view_count"].as_u64().unwrap_or(0),
        thumbnail: str_or(val, "thumbnail", ""),
        formats,
        url: url.to_string(),
    }
}

/// Builds records for the entries of a flat playlist extraction.
pub fn playlist_entries(val: &Value, url: &str) -> Result<Vec<VideoInfo>> {
    let videos: Vec<VideoInfo> = val["entries"]
        .as_array()
        .map(|list| list.iter().filter(|e| e.is_object()).map(flat_entry).collect())
        .unwrap_or_default();

    if videos.is_empty() {
        return Err(Error::EmptyPlaylist(url.to_string()));
    }
    Ok(videos)
}

fn flat_entry(entry: &Value) -> VideoInfo {
    let id = str_or(entry, "id", "");
    let url = entry["webpage_url"]
        .as_str()
        .or_else(|| {
            entry["url"]
                .as_str()
                .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
        })
        .map(|u| u.to_string())
        .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", id));

    // Flat extraction carries no description, upload date, views or formats
    VideoInfo {
        title: str_or(entry, "title", "Unknown Title"),
        duration: entry["duration"].as_f64().unwrap_or(0.0) as u64,
        uploader: str_or(entry, "uploader", "Unknown"),
        thumbnail: entry["thumbnail"]
            .as_str()
            .or_else(|| {
                entry["thumbnails"]
                    .as_array()
                    .and_then(|arr| arr.iter().max_by_key(|t| t["width"].as_u64().unwrap_or(0)))
                    .and_then(|t| t["url"].as_str())
            })
            .unwrap_or("")
            .to_string(),
        id,
        url,
        ..VideoInfo::default()
    }
}

fn format_from_value(f: &Value) -> FormatDescriptor {
    FormatDescriptor {
        format_id: str_or(f, "format_id", ""),
        ext: str_or(f, "ext", ""),
        quality: f["quality"].as_f64(),
        filesize: f["filesize"]
            .as_u64()
            .or_else(|| f["filesize_approx"].as_u64())
            .or_else(|| f["filesize"].as_f64().map(|v| v as u64))
            .or_else(|| f["filesize_approx"].as_f64().map(|v| v as u64)),
        format_note: str_or(f, "format_note", ""),
    }
}

fn str_or(val: &Value, key: &str, default: &str) -> String {
    val[key].as_str().unwrap_or(default).to_string()
}

/// Picks the most useful line out of the engine's stderr.
pub fn engine_error_message(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    text.lines()
        .find_map(|l| l.trim().strip_prefix("ERROR:").map(|m| m.trim().to_string()))
        .or_else(|| {
            text.lines()
                .rev()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Unknown error".to_string())
}

pub fn format_duration(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    #[test]
    fn video_info_fields() {
        let val = json!({
            "id": "dQw4w9WgXcQ",
            "title": "Never Gonna Give You Up",
            "description": "Official video",
            "duration": 212.0,
            "uploader": "Rick Astley",
            "upload_date": "20091025",
            "view_count": 1_500_000_000u64,
            "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg",
            "formats": [
                {"format_id": "18", "ext": "mp4", "quality": 1, "filesize": 12345, "format_note": "360p"},
                {"format_id": "251", "ext": "webm", "quality": -1, "filesize_approx": 3400.5, "format_note": "medium"},
                {"format_id": "sb0", "ext": "mhtml"}
            ]
        });

        let info = video_info_from_value(&val, URL);
        assert_eq!(info.id, "dQw4w9WgXcQ");
        assert_eq!(info.duration, 212);
        assert_eq!(info.view_count, 1_500_000_000);
        assert_eq!(info.url, URL);
        assert_eq!(info.formats.len(), 3);
        assert_eq!(info.formats[0].filesize, Some(12345));
        assert_eq!(info.formats[0].quality, Some(1.0));
        assert_eq!(info.formats[1].filesize, Some(3400));
        assert_eq!(info.formats[2].filesize, None);
        assert_eq!(info.formats[2].format_note, "");
    }

    #[test]
    fn missing_fields_get_defaults() {
        let info = video_info_from_value(&json!({"id": "x"}), URL);
        assert_eq!(info.title, "Unknown Title");
        assert_eq!(info.uploader, "Unknown");
        assert_eq!(info.duration, 0);
        assert!(info.formats.is_empty());
    }

    #[test]
    fn first_entry_of_playlist() {
        let val = json!({"_type": "playlist", "entries": [null, {"id": "a"}, {"id": "b"}]});
        let entry = first_entry(val, URL).unwrap();
        assert_eq!(entry["id"], "a");
    }

    #[test]
    fn single_video_passes_through() {
        let entry = first_entry(json!({"id": "solo"}), URL).unwrap();
        assert_eq!(entry["id"], "solo");
    }

    #[test]
    fn empty_playlist_is_an_error() {
        let err = first_entry(json!({"entries": []}), URL).unwrap_err();
        assert!(matches!(err, Error::EmptyPlaylist(_)));

        let err = playlist_entries(&json!({"entries": [null]}), URL).unwrap_err();
        assert!(matches!(err, Error::EmptyPlaylist(u) if u == URL));
    }

    #[test]
    fn flat_entries_get_urls() {
        let val = json!({
            "entries": [
                {"id": "abc", "title": "One", "url": "abc", "duration": 61},
                {"id": "def", "title": "Two", "url": "https://www.youtube.com/watch?v=def"},
                {"id": "ghi", "webpage_url": "https://youtu.be/ghi",
                 "thumbnails": [{"url": "small", "width": 120}, {"url": "big", "width": 1280}]}
            ]
        });
        let videos = playlist_entries(&val, URL).unwrap();
        assert_eq!(videos.len(), 3);
        assert_eq!(videos[0].url, "https://www.youtube.com/watch?v=abc");
        assert_eq!(videos[0].duration, 61);
        assert_eq!(videos[1].url, "https://www.youtube.com/watch?v=def");
        assert_eq!(videos[2].url, "https://youtu.be/ghi");
        assert_eq!(videos[2].thumbnail, "big");
        assert_eq!(videos[2].title, "Unknown Title");
        assert!(videos.iter().all(|v| v.description.is_empty() && v.formats.is_empty()));
    }

    #[test]
    fn error_message_prefers_error_line() {
        let stderr = b"WARNING: something\nERROR: [youtube] xyz: Video unavailable\nmore\n";
        assert_eq!(engine_error_message(stderr), "[youtube] xyz: Video unavailable");
        assert_eq!(engine_error_message(b"boom\n\n"), "boom");
        assert_eq!(engine_error_message(b""), "Unknown error");
    }

    #[test]
    fn url_follows_option_terminator() {
        let args = extraction_args("--batch-file=/etc/passwd", &["--flat-playlist"]);
        assert_eq!(args[0], "--dump-single-json");
        assert_eq!(args[2], "--flat-playlist");
        assert_eq!(&args[args.len() - 2..], ["--", "--batch-file=/etc/passwd"]);
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(59), "00:59");
        assert_eq!(format_duration(212), "03:32");
        assert_eq!(format_duration(3725), "1:02:05");
    }

    /// Writes a shell stand-in for `yt-dlp` and settings that point at it.
    #[cfg(unix)]
    fn fake_engine(name: &str, body: &str) -> (std::path::PathBuf, Settings) {
        use std::os::unix::fs::PermissionsExt;

        let dir = std::env::temp_dir().join(format!("vidfetch-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let script = dir.join("yt-dlp");
        std::fs::write(&script, format!("#!/bin/sh\n{}", body)).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let settings = Settings {
            download_directory: dir.clone(),
            use_custom_paths: true,
            ytdlp_path: script.to_string_lossy().to_string(),
            ..Settings::default()
        };
        (dir, settings)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn engine_error_line_becomes_extraction_failure() {
        let (dir, settings) = fake_engine(
            "info-error",
            "echo 'WARNING: slow' >&2\necho 'ERROR: [youtube] xyz: Private video' >&2\nexit 1\n",
        );

        let err = get_video_info(URL, &settings).await.unwrap_err();
        assert!(matches!(&err, Error::ExtractionFailure(m) if m == "[youtube] xyz: Private video"));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn engine_sees_url_after_terminator() {
        // Echo argv back as the error so the ordering is observable
        let (dir, settings) = fake_engine("argv", "echo \"ERROR: $*\" >&2\nexit 1\n");

        let err = get_video_info("-U", &settings).await.unwrap_err();
        match err {
            Error::ExtractionFailure(m) => assert!(m.ends_with("--playlist-items 1 -- -U"), "{}", m),
            other => panic!("unexpected {:?}", other),
        }

        let _ = std::fs::remove_dir_all(dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn validate_follows_engine_exit_status() {
        let (ok_dir, ok) = fake_engine("validate-ok", "echo '{\"id\": \"x\"}'\n");
        assert!(validate_url(URL, &ok).await);

        let (bad_dir, bad) = fake_engine("validate-bad", "echo 'ERROR: Unsupported URL' >&2\nexit 1\n");
        assert!(!validate_url("https://example.com/nothing", &bad).await);

        let _ = std::fs::remove_dir_all(ok_dir);
        let _ = std::fs::remove_dir_all(bad_dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn extractors_are_listed_one_per_line() {
        let (dir, settings) = fake_engine("extractors", "printf 'youtube\\n\\nvimeo\\n  twitch:vod  \\n'\n");

        let names = list_extractors(&settings).await.unwrap();
        assert_eq!(names, ["youtube", "vimeo", "twitch:vod"]);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn playlist_of_single_video_delegates_to_info() {
        let (dir, settings) = fake_engine(
            "playlist-single",
            "echo '{\"id\": \"solo\", \"title\": \"Only one\", \"duration\": 30, \"formats\": [{\"format_id\": \"18\"}]}'\n",
        );

        let videos = get_playlist_info(URL, Some(5), &settings).await.unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].id, "solo");
        assert_eq!(videos[0].title, "Only one");
        assert_eq!(videos[0].formats.len(), 1);
        assert_eq!(videos[0].url, URL);

        let _ = std::fs::remove_dir_all(dir);
    }
}
