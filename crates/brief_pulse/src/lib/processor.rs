use std::path::PathBuf;

use anyhow::Context;
use brief_datastore::{Job, JobStatus, JobStore, Stage};

use crate::{
    acquire::{self, AudioFetcher, FetchStrategy},
    analyze,
    checkpoint::{self, ArtifactPaths},
    error::Error,
    report,
    subtitle::{self, MergeConfig},
    AudioInput, Summarizer, Transcriber,
};

pub mod builder;

#[derive(Debug)]
pub struct ChunkingConfig {
    pub chunk_duration_seconds: u16,
}

// The core checkpointed video briefing processor
pub struct JobProcessor<J, F, T, S>
where
    J: JobStore + Send + Sync + 'static,
    F: AudioFetcher + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
{
    workdir: PathBuf,
    store: J,
    fetcher: F,
    transcriber: T,
    summarizer: S,
    strategies: Vec<FetchStrategy>,
    merge_config: MergeConfig,
    chunking_config: Option<ChunkingConfig>,
}

impl<J, F, T, S> JobProcessor<J, F, T, S>
where
    J: JobStore + Send + Sync + 'static,
    F: AudioFetcher + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
{
    /// Register a job for `source_url`, or return the existing one.
    pub async fn submit(&self, source_url: &str) -> anyhow::Result<Job> {
        self.store.insert_job(source_url).await
    }

    /// Drive a job through `download → transcribe → report`.
    ///
    /// Stages already valid per checkpoint validation are skipped, so a
    /// re-run after a crash or failure resumes exactly where work stopped.
    /// A job whose three checkpoints are all valid is a no-op. Stage
    /// failures persist `failed` plus the message and propagate; the stage
    /// that failed is the one the next attempt starts at.
    #[tracing::instrument(skip(self))]
    pub async fn process(&self, job_id: i64) -> anyhow::Result<()> {
        let job = self
            .store
            .get_job(job_id)
            .await?
            .with_context(|| format!("No job with id {job_id}"))?;

        let video_id = acquire::extract_video_id(&job.source_url)?;
        let paths = ArtifactPaths::new(&self.workdir, video_id);

        if checkpoint::next_stage(&self.store, job_id, &paths)
            .await?
            .is_none()
        {
            tracing::info!(job_id, "All stages already valid, nothing to do");
            if job.status != JobStatus::Completed {
                self.store
                    .update_status(job_id, JobStatus::Completed, None)
                    .await?;
            }
            return Ok(());
        }

        self.store
            .update_status(job_id, JobStatus::Processing, None)
            .await?;

        match self.run_stages(&job, &paths).await {
            Ok(()) => {
                self.store
                    .update_report_filename(job_id, &paths.report().display().to_string())
                    .await?;
                self.store
                    .update_status(job_id, JobStatus::Completed, None)
                    .await?;
                tracing::info!(job_id, "Job completed");
                Ok(())
            }
            Err(e) => {
                let message = format!("{e:#}");
                tracing::error!(job_id, error = %message, "Job failed");
                if let Err(store_err) = self
                    .store
                    .update_status(job_id, JobStatus::Failed, Some(&message))
                    .await
                {
                    tracing::error!(job_id, error = ?store_err, "Failed to persist job failure");
                }
                Err(e)
            }
        }
    }

    async fn run_stages(&self, job: &Job, paths: &ArtifactPaths) -> anyhow::Result<()> {
        let mut previous = None;
        while let Some(stage) = checkpoint::next_stage(&self.store, job.id, paths).await? {
            // a stage that "succeeded" without leaving valid artifacts would
            // otherwise spin forever
            if previous == Some(stage) {
                anyhow::bail!("stage {stage} completed without producing valid artifacts");
            }
            previous = Some(stage);

            tracing::info!(job_id = job.id, %stage, "Running stage");
            let artifact = match stage {
                Stage::Download => self.run_download(job, paths).await?,
                Stage::Transcribe => self.run_transcribe(paths).await?,
                Stage::Report => self.run_report(job, paths).await?,
            };

            self.store
                .set_checkpoint(job.id, stage, true, Some(&artifact))
                .await?;
        }
        Ok(())
    }

    /// Download stage: run the acquisition chain, store the title when the
    /// fetch actually observed one.
    #[tracing::instrument(skip_all, fields(job_id = job.id))]
    async fn run_download(&self, job: &Job, paths: &ArtifactPaths) -> anyhow::Result<String> {
        let audio =
            acquire::acquire(&self.fetcher, &job.source_url, &self.strategies, &paths.audio())?;

        if let Some(title) = &audio.title {
            self.store.update_title(job.id, title).await?;
        }

        Ok(audio.path.display().to_string())
    }

    /// Transcribe stage: recognizer output through the merge engine, then
    /// persist the SRT + plain-text transcript pair.
    #[tracing::instrument(skip_all)]
    async fn run_transcribe(&self, paths: &ArtifactPaths) -> anyhow::Result<String> {
        let audio_input = match &self.chunking_config {
            Some(config) => AudioInput::Chunked {
                chunk_duration_seconds: config.chunk_duration_seconds,
                chunks_dir_path: paths.audio_chunks_dir(),
                file_path: paths.audio(),
            },
            None => AudioInput::File(paths.audio()),
        };

        let response = self
            .transcriber
            .transcribe(audio_input)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to transcribe audio: {e:?}"))?;

        let raw = response
            .segments
            .filter(|segments| !segments.is_empty())
            .ok_or_else(|| Error::Transcription("recognizer returned no segments".into()))?;

        let merged = subtitle::merge(&raw, &self.merge_config);
        if merged.is_empty() {
            return Err(Error::Transcription("no non-empty segments after merge".into()).into());
        }

        let srt_path = paths.srt();
        if let Some(parent) = srt_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&srt_path, subtitle::to_srt(&merged))?;
        std::fs::write(paths.transcript(), subtitle::plain_text(&merged))?;

        Ok(srt_path.display().to_string())
    }

    /// Report stage: consumes only the persisted transcribe artifacts, so a
    /// resumed job needs nothing from earlier in-memory state.
    #[tracing::instrument(skip_all, fields(job_id = job.id))]
    async fn run_report(&self, job: &Job, paths: &ArtifactPaths) -> anyhow::Result<String> {
        let transcript = std::fs::read_to_string(paths.transcript())?;
        let segments = subtitle::parse_srt(&std::fs::read_to_string(paths.srt())?);

        let analysis = analyze::analyze_all(&self.summarizer, &transcript, &segments).await;

        // the download stage may have stored a title after our snapshot
        let title = self
            .store
            .get_job(job.id)
            .await?
            .and_then(|j| j.title)
            .unwrap_or_else(|| paths.video_id().to_string());

        let html = report::render_report(&title, &job.source_url, &analysis, &segments);

        let report_path = paths.report();
        if let Some(parent) = report_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&report_path, html)?;

        Ok(report_path.display().to_string())
    }
}
