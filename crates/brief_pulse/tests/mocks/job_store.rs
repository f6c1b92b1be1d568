use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use brief_datastore::{Checkpoint, Job, JobStatus, JobStore, Stage};

/// In-memory JobStore with the same per-job upsert semantics as the sqlite
/// implementation.
#[derive(Clone, Default)]
pub struct MockJobStore {
    pub jobs: Arc<Mutex<HashMap<i64, Job>>>,
    pub checkpoints: Arc<Mutex<HashMap<(i64, Stage), Checkpoint>>>,
    next_id: Arc<Mutex<i64>>,
    pub fail_with: Option<String>,
}

impl MockJobStore {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn job(&self, job_id: i64) -> Option<Job> {
        self.jobs.lock().unwrap().get(&job_id).cloned()
    }

    pub fn checkpoint(&self, job_id: i64, stage: Stage) -> Option<Checkpoint> {
        self.checkpoints
            .lock()
            .unwrap()
            .get(&(job_id, stage))
            .cloned()
    }

    fn check_failure(&self) -> anyhow::Result<()> {
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(())
    }
}

impl JobStore for MockJobStore {
    async fn insert_job(&self, source_url: &str) -> anyhow::Result<Job> {
        self.check_failure()?;
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(existing) = jobs.values().find(|j| j.source_url == source_url) {
            return Ok(existing.clone());
        }
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let job = Job {
            id: *next_id,
            source_url: source_url.to_string(),
            ..Default::default()
        };
        jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get_job(&self, job_id: i64) -> anyhow::Result<Option<Job>> {
        self.check_failure()?;
        Ok(self.jobs.lock().unwrap().get(&job_id).cloned())
    }

    async fn get_job_by_url(&self, source_url: &str) -> anyhow::Result<Option<Job>> {
        self.check_failure()?;
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .values()
            .find(|j| j.source_url == source_url)
            .cloned())
    }

    async fn list_jobs(&self) -> anyhow::Result<Vec<Job>> {
        self.check_failure()?;
        Ok(self.jobs.lock().unwrap().values().cloned().collect())
    }

    async fn update_status(
        &self,
        job_id: i64,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> anyhow::Result<()> {
        self.check_failure()?;
        if let Some(job) = self.jobs.lock().unwrap().get_mut(&job_id) {
            job.status = status;
            job.error_message = error_message.map(String::from);
        }
        Ok(())
    }

    async fn update_title(&self, job_id: i64, title: &str) -> anyhow::Result<()> {
        self.check_failure()?;
        if let Some(job) = self.jobs.lock().unwrap().get_mut(&job_id) {
            job.title = Some(title.to_string());
        }
        Ok(())
    }

    async fn update_report_filename(&self, job_id: i64, filename: &str) -> anyhow::Result<()> {
        self.check_failure()?;
        if let Some(job) = self.jobs.lock().unwrap().get_mut(&job_id) {
            job.report_filename = Some(filename.to_string());
        }
        Ok(())
    }

    async fn checkpoints(&self, job_id: i64) -> anyhow::Result<Vec<Checkpoint>> {
        self.check_failure()?;
        Ok(self
            .checkpoints
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn set_checkpoint(
        &self,
        job_id: i64,
        stage: Stage,
        done: bool,
        artifact_path: Option<&str>,
    ) -> anyhow::Result<()> {
        self.check_failure()?;
        self.checkpoints.lock().unwrap().insert(
            (job_id, stage),
            Checkpoint {
                job_id,
                stage,
                done,
                artifact_path: artifact_path.map(String::from),
            },
        );
        Ok(())
    }

    async fn reset_checkpoint(&self, job_id: i64, stage: Stage) -> anyhow::Result<()> {
        self.check_failure()?;
        if let Some(cp) = self.checkpoints.lock().unwrap().get_mut(&(job_id, stage)) {
            cp.done = false;
            cp.artifact_path = None;
        }
        Ok(())
    }
}
