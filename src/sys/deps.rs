use crate::model::settings::Settings;
use anyhow::{Context, Result, bail};
use std::process::Command;

pub struct DependencyStatus {
    pub yt_dlp_version: String,
    pub ffmpeg_installed: bool,
}

pub fn check_dependencies(settings: &Settings) -> Result<DependencyStatus> {
    let version = check_yt_dlp(settings.ytdlp_cmd())?;
    let ffmpeg = check_ffmpeg(settings.ffmpeg_cmd());

    Ok(DependencyStatus {
        yt_dlp_version: version,
        ffmpeg_installed: ffmpeg,
    })
}

fn check_yt_dlp(cmd: &str) -> Result<String> {
    let output = Command::new(cmd)
        .arg("--version")
        .output()
        .with_context(|| format!("Failed to execute {}. Is it installed and in your PATH?", cmd))?;

    if !output.status.success() {
        bail!("{} --version failed with status: {}", cmd, output.status);
    }

    let version_str = String::from_utf8(output.stdout)?.trim().to_string();
    Ok(version_str)
}

fn check_ffmpeg(cmd: &str) -> bool {
    // ffmpeg prints its version with -version, single dash
    match Command::new(cmd).arg("-version").output() {
        Ok(o) => o.status.success(),
        Err(_) => false,
    }
}
