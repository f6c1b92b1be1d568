//! # Checkpoint Validation
//!
//! The durable record of what a job has completed lives in the job store;
//! this module decides what that record is worth. Before every resume
//! decision each stage marked done is re-validated against its expected
//! artifacts on disk, and stages whose artifacts went missing are reset.
//! That self-healing pass is what makes the pipeline safe against partial
//! writes, crashes and manually deleted files.

use std::path::{Path, PathBuf};

use brief_datastore::{JobStore, Stage};

/// Canonical artifact layout for one job, derived from the source's stable
/// video id. Titles are never part of a path.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    workdir: PathBuf,
    video_id: String,
}

impl ArtifactPaths {
    pub fn new(workdir: impl Into<PathBuf>, video_id: impl Into<String>) -> Self {
        ArtifactPaths {
            workdir: workdir.into(),
            video_id: video_id.into(),
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn audio(&self) -> PathBuf {
        self.workdir
            .join("audio")
            .join(format!("{}.mp3", self.video_id))
    }

    /// Directory holding ffmpeg-split transcription chunks.
    pub fn audio_chunks_dir(&self) -> PathBuf {
        self.workdir.join("audio").join(&self.video_id)
    }

    pub fn srt(&self) -> PathBuf {
        self.workdir
            .join("transcripts")
            .join(format!("{}.srt", self.video_id))
    }

    pub fn transcript(&self) -> PathBuf {
        self.workdir
            .join("transcripts")
            .join(format!("{}.txt", self.video_id))
    }

    pub fn report(&self) -> PathBuf {
        self.workdir
            .join("reports")
            .join(format!("{}.html", self.video_id))
    }

    /// Every artifact a stage must leave behind to count as done.
    pub fn for_stage(&self, stage: Stage) -> Vec<PathBuf> {
        match stage {
            Stage::Download => vec![self.audio()],
            Stage::Transcribe => vec![self.srt(), self.transcript()],
            Stage::Report => vec![self.report()],
        }
    }
}

/// A checkpoint artifact counts only if it exists and is non-empty; a
/// zero-byte file is what a crashed partial write leaves behind.
pub fn artifact_is_valid(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

fn stage_is_valid(paths: &ArtifactPaths, stage: Stage) -> bool {
    paths.for_stage(stage).iter().all(|p| artifact_is_valid(p))
}

/// Validate every stage of a job and return the first one that must run,
/// or `None` when the job is fully complete and must not be reprocessed.
///
/// Stages marked done whose artifacts fail validation are reset in the
/// store before this returns. Without intervening mutation the result is
/// stable across repeated calls.
#[tracing::instrument(skip(store, paths))]
pub async fn next_stage<J: JobStore + Sync>(
    store: &J,
    job_id: i64,
    paths: &ArtifactPaths,
) -> anyhow::Result<Option<Stage>> {
    let rows = store.checkpoints(job_id).await?;

    let mut first_invalid = None;
    for stage in Stage::ALL {
        let marked_done = rows
            .iter()
            .find(|c| c.stage == stage)
            .is_some_and(|c| c.done);
        let valid = marked_done && stage_is_valid(paths, stage);

        if marked_done && !valid {
            tracing::warn!(
                job_id,
                %stage,
                "Checkpoint artifact missing or empty, resetting stage"
            );
            store.reset_checkpoint(job_id, stage).await?;
        }
        if !valid && first_invalid.is_none() {
            first_invalid = Some(stage);
        }
    }

    Ok(first_invalid)
}
