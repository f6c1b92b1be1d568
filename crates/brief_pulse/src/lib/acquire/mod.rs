//! # Audio Acquisition
//!
//! Acquisition is the most expensive, most failure-prone and most
//! rate-limited stage, so it is built around two rules: never re-fetch what
//! already exists on disk, and never give up after one client identity.
//! An ordered list of [`FetchStrategy`] values is tried by a single loop
//! that accumulates every failure into the final error.

pub mod ytdlp;

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;

use crate::{checkpoint::artifact_is_valid, error::Error};

static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/(?:shorts|embed|live)/)([A-Za-z0-9_-]{6,})",
    )
    .unwrap()
});

/// Stable identifier of the source video, extracted from its URL. Canonical
/// artifact paths derive from this, never from the (mutable) title.
pub fn extract_video_id(url: &str) -> Result<String, Error> {
    VIDEO_ID_RE
        .captures(url)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(Error::Parse("video id from source url"))
}

/// One download attempt configuration: client identity plus format
/// preference. Strategies only differ in how they present themselves to the
/// source, not in what they produce.
#[derive(Debug, Clone)]
pub struct FetchStrategy {
    pub name: &'static str,
    pub format: &'static str,
    pub player_client: Option<&'static str>,
    pub user_agent: Option<&'static str>,
}

impl FetchStrategy {
    /// Default fallback order: a cookie-assisted web client first, then the
    /// mobile client identities, then a quality-sacrificing last resort.
    pub fn defaults() -> Vec<FetchStrategy> {
        vec![
            FetchStrategy {
                name: "web",
                format: "bestaudio/best",
                player_client: Some("web,android"),
                user_agent: Some(
                    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
                ),
            },
            FetchStrategy {
                name: "android",
                format: "bestaudio/best",
                player_client: Some("android"),
                user_agent: Some(
                    "com.google.android.youtube/17.31.35 (Linux; U; Android 11) gzip",
                ),
            },
            FetchStrategy {
                name: "ios",
                format: "bestaudio/best",
                player_client: Some("ios"),
                user_agent: Some(
                    "com.google.ios.youtube/17.31.4 (iPhone; CPU iPhone OS 15_6 like Mac OS X)",
                ),
            },
            FetchStrategy {
                name: "last-resort",
                format: "worst",
                player_client: None,
                user_agent: None,
            },
        ]
    }
}

#[derive(Debug, Clone)]
pub struct FetchedAudio {
    pub path: PathBuf,
    /// `None` when the download was short-circuited by an existing file; the
    /// job record keeps whatever title an earlier run stored.
    pub title: Option<String>,
}

pub trait AudioFetcher {
    /// Attempt one download with one strategy, producing the audio file at
    /// exactly `output`.
    fn fetch(
        &self,
        url: &str,
        strategy: &FetchStrategy,
        output: &Path,
    ) -> anyhow::Result<FetchedAudio>;
}

/// Split an audio file into fixed-duration chunk files.
pub trait AudioSplitter {
    fn split_audio_to_chunks(
        &self,
        input: &Path,
        chunk_duration_seconds: u16,
        output_template: PathBuf,
    ) -> anyhow::Result<()>;
}

/// Run the strategy chain for `url`, writing the audio to `output`.
///
/// Short-circuits when `output` already exists non-empty. Otherwise each
/// strategy is attempted in order; the first success wins, and exhaustion
/// yields [`Error::Acquisition`] carrying every strategy's failure reason.
#[tracing::instrument(skip(fetcher, strategies))]
pub fn acquire<F: AudioFetcher>(
    fetcher: &F,
    url: &str,
    strategies: &[FetchStrategy],
    output: &Path,
) -> Result<FetchedAudio, Error> {
    if artifact_is_valid(output) {
        tracing::debug!(path = %output.display(), "Audio already exists, skipping download");
        return Ok(FetchedAudio {
            path: output.to_path_buf(),
            title: None,
        });
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut failures = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        tracing::info!(strategy = strategy.name, "Attempting download strategy");
        match fetcher.fetch(url, strategy, output) {
            Ok(audio) => return Ok(audio),
            Err(e) => {
                tracing::warn!(
                    strategy = strategy.name,
                    error = ?e,
                    "Download strategy failed"
                );
                failures.push(format!("{}: {:#}", strategy.name, e));
            }
        }
    }

    Err(Error::Acquisition {
        url: url.to_string(),
        causes: failures.join("\n"),
    })
}
