use std::future::Future;

pub mod sqlite;

use crate::{Checkpoint, Job, JobStatus, Stage};

pub trait JobStore {
    /// Insert a new pending job for `source_url`, or return the existing job
    /// if the URL was submitted before.
    fn insert_job(&self, source_url: &str) -> impl Future<Output = anyhow::Result<Job>> + Send;

    fn get_job(&self, job_id: i64) -> impl Future<Output = anyhow::Result<Option<Job>>> + Send;

    fn get_job_by_url(
        &self,
        source_url: &str,
    ) -> impl Future<Output = anyhow::Result<Option<Job>>> + Send;

    fn list_jobs(&self) -> impl Future<Output = anyhow::Result<Vec<Job>>> + Send;

    /// Update lifecycle status. `Completed` also stamps `completed_at`.
    fn update_status(
        &self,
        job_id: i64,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn update_title(
        &self,
        job_id: i64,
        title: &str,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn update_report_filename(
        &self,
        job_id: i64,
        filename: &str,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn checkpoints(
        &self,
        job_id: i64,
    ) -> impl Future<Output = anyhow::Result<Vec<Checkpoint>>> + Send;

    /// Upsert the checkpoint row for `(job_id, stage)` in a single statement.
    fn set_checkpoint(
        &self,
        job_id: i64,
        stage: Stage,
        done: bool,
        artifact_path: Option<&str>,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Clear a stage's completion flag and artifact path.
    fn reset_checkpoint(
        &self,
        job_id: i64,
        stage: Stage,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

impl<T: JobStore + Send + Sync> JobStore for &T {
    async fn insert_job(&self, source_url: &str) -> anyhow::Result<Job> {
        (**self).insert_job(source_url).await
    }

    async fn get_job(&self, job_id: i64) -> anyhow::Result<Option<Job>> {
        (**self).get_job(job_id).await
    }

    async fn get_job_by_url(&self, source_url: &str) -> anyhow::Result<Option<Job>> {
        (**self).get_job_by_url(source_url).await
    }

    async fn list_jobs(&self) -> anyhow::Result<Vec<Job>> {
        (**self).list_jobs().await
    }

    async fn update_status(
        &self,
        job_id: i64,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> anyhow::Result<()> {
        (**self).update_status(job_id, status, error_message).await
    }

    async fn update_title(&self, job_id: i64, title: &str) -> anyhow::Result<()> {
        (**self).update_title(job_id, title).await
    }

    async fn update_report_filename(&self, job_id: i64, filename: &str) -> anyhow::Result<()> {
        (**self).update_report_filename(job_id, filename).await
    }

    async fn checkpoints(&self, job_id: i64) -> anyhow::Result<Vec<Checkpoint>> {
        (**self).checkpoints(job_id).await
    }

    async fn set_checkpoint(
        &self,
        job_id: i64,
        stage: Stage,
        done: bool,
        artifact_path: Option<&str>,
    ) -> anyhow::Result<()> {
        (**self)
            .set_checkpoint(job_id, stage, done, artifact_path)
            .await
    }

    async fn reset_checkpoint(&self, job_id: i64, stage: Stage) -> anyhow::Result<()> {
        (**self).reset_checkpoint(job_id, stage).await
    }
}
