//! CLI-backed implementations of the acquisition capabilities: `yt-dlp`
//! for fetching audio and `ffmpeg` for chunk splitting.

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::Context;

use crate::acquire::{AudioFetcher, AudioSplitter, FetchStrategy, FetchedAudio};

#[derive(Debug, Clone)]
pub struct YtDlp {
    bin: PathBuf,
    cookies_path: Option<PathBuf>,
}

impl Default for YtDlp {
    fn default() -> Self {
        YtDlp {
            bin: PathBuf::from("yt-dlp"),
            cookies_path: None,
        }
    }
}

impl YtDlp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_cookies(cookies_path: Option<PathBuf>) -> Self {
        YtDlp {
            cookies_path,
            ..Self::default()
        }
    }

    pub fn with_binary(mut self, bin: impl Into<PathBuf>) -> Self {
        self.bin = bin.into();
        self
    }

    fn base_command(&self, strategy: &FetchStrategy) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("--no-warnings").arg("--no-playlist");
        if let Some(client) = strategy.player_client {
            cmd.arg("--extractor-args")
                .arg(format!("youtube:player_client={client}"));
        }
        if let Some(user_agent) = strategy.user_agent {
            cmd.arg("--user-agent").arg(user_agent);
        }
        if let Some(cookies) = &self.cookies_path {
            cmd.arg("--cookies").arg(cookies);
        }
        cmd
    }

    fn probe_title(&self, url: &str, strategy: &FetchStrategy) -> anyhow::Result<String> {
        let output = self
            .base_command(strategy)
            .args(["--print", "title", "--skip-download"])
            .arg(url)
            .output()
            .context("Failed to spawn yt-dlp")?;

        if !output.status.success() {
            anyhow::bail!(
                "yt-dlp metadata probe failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let title = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if title.is_empty() {
            anyhow::bail!("yt-dlp returned an empty title");
        }
        Ok(title)
    }
}

impl AudioFetcher for YtDlp {
    #[tracing::instrument(skip(self, strategy), fields(strategy = strategy.name))]
    fn fetch(
        &self,
        url: &str,
        strategy: &FetchStrategy,
        output: &Path,
    ) -> anyhow::Result<FetchedAudio> {
        let title = self.probe_title(url, strategy)?;

        // templated so yt-dlp's extract-audio postprocessor lands on the
        // canonical .mp3 path
        let template = output.with_extension("%(ext)s");
        let result = self
            .base_command(strategy)
            .args(["-f", strategy.format])
            .args(["-x", "--audio-format", "mp3"])
            .arg("-o")
            .arg(&template)
            .arg(url)
            .output()
            .context("Failed to spawn yt-dlp")?;

        if !result.status.success() {
            anyhow::bail!(
                "yt-dlp download failed: {}",
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }

        if !output.exists() {
            anyhow::bail!("yt-dlp did not produce expected file: {}", output.display());
        }

        Ok(FetchedAudio {
            path: output.to_path_buf(),
            title: Some(title),
        })
    }
}

#[derive(Debug, Clone)]
pub struct FfmpegCli {
    bin: PathBuf,
}

impl Default for FfmpegCli {
    fn default() -> Self {
        FfmpegCli {
            bin: PathBuf::from("ffmpeg"),
        }
    }
}

impl FfmpegCli {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioSplitter for FfmpegCli {
    fn split_audio_to_chunks(
        &self,
        input: &Path,
        chunk_duration_seconds: u16,
        output_template: PathBuf,
    ) -> anyhow::Result<()> {
        let result = Command::new(&self.bin)
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .arg("-i")
            .arg(input)
            .args(["-f", "segment", "-segment_time"])
            .arg(chunk_duration_seconds.to_string())
            .args(["-c", "copy"])
            .arg(&output_template)
            .output()
            .context("Failed to spawn ffmpeg")?;

        if !result.status.success() {
            anyhow::bail!(
                "ffmpeg chunk split failed: {}",
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }

        Ok(())
    }
}
