use std::str::FromStr;

use anyhow::Context;
use chrono::NaiveDateTime;
use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::{datastore::JobStore, Checkpoint, Job, JobStatus, Stage};

static MIGRATOR: Migrator = sqlx::migrate!();

#[derive(Debug, Clone)]
pub struct SqliteJobStore {
    pub pool: SqlitePool,
}

impl SqliteJobStore {
    /// Establish the connection pool and run pending migrations.
    pub async fn init(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid sqlite database url")?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .inspect_err(
                |e| tracing::error!(error = ?e, "Failed to establish connection to database"),
            )
            .context("Failed to connect to sqlite database")?;

        MIGRATOR
            .run(&pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to run database migrations"))
            .context("Failed to run database migrations")?;

        Ok(SqliteJobStore { pool })
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: i64,
    source_url: String,
    title: Option<String>,
    status: String,
    error_message: Option<String>,
    report_filename: Option<String>,
    created_at: Option<NaiveDateTime>,
    completed_at: Option<NaiveDateTime>,
}

impl TryFrom<JobRow> for Job {
    type Error = anyhow::Error;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(Job {
            id: row.id,
            source_url: row.source_url,
            title: row.title,
            status: row.status.parse()?,
            error_message: row.error_message,
            report_filename: row.report_filename,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CheckpointRow {
    job_id: i64,
    stage: String,
    done: bool,
    artifact_path: Option<String>,
}

impl TryFrom<CheckpointRow> for Checkpoint {
    type Error = anyhow::Error;

    fn try_from(row: CheckpointRow) -> Result<Self, Self::Error> {
        Ok(Checkpoint {
            job_id: row.job_id,
            stage: row.stage.parse()?,
            done: row.done,
            artifact_path: row.artifact_path,
        })
    }
}

const JOB_COLUMNS: &str =
    "id, source_url, title, status, error_message, report_filename, created_at, completed_at";

impl JobStore for SqliteJobStore {
    async fn insert_job(&self, source_url: &str) -> anyhow::Result<Job> {
        sqlx::query("INSERT INTO jobs (source_url) VALUES ($1) ON CONFLICT (source_url) DO NOTHING")
            .bind(source_url)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, source_url, "Failed to insert job"))
            .context("Failed to insert job")?;

        self.get_job_by_url(source_url)
            .await?
            .context("Job missing immediately after insert")
    }

    async fn get_job(&self, job_id: i64) -> anyhow::Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, job_id, "Failed to fetch job"))
        .context("Failed to fetch job")?;

        row.map(Job::try_from).transpose()
    }

    async fn get_job_by_url(&self, source_url: &str) -> anyhow::Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE source_url = $1"
        ))
        .bind(source_url)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, source_url, "Failed to fetch job by url"))
        .context("Failed to fetch job by url")?;

        row.map(Job::try_from).transpose()
    }

    async fn list_jobs(&self) -> anyhow::Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, "Failed to list jobs"))
        .context("Failed to list jobs")?;

        rows.into_iter().map(Job::try_from).collect()
    }

    async fn update_status(
        &self,
        job_id: i64,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> anyhow::Result<()> {
        let query = if status == JobStatus::Completed {
            "UPDATE jobs SET status = $1, error_message = $2, completed_at = CURRENT_TIMESTAMP \
             WHERE id = $3"
        } else {
            "UPDATE jobs SET status = $1, error_message = $2 WHERE id = $3"
        };

        sqlx::query(query)
            .bind(status.as_str())
            .bind(error_message)
            .bind(job_id)
            .execute(&self.pool)
            .await
            .inspect_err(
                |e| tracing::error!(error = ?e, job_id, %status, "Failed to update job status"),
            )
            .context("Failed to update job status")?;

        Ok(())
    }

    async fn update_title(&self, job_id: i64, title: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE jobs SET title = $1 WHERE id = $2")
            .bind(title)
            .bind(job_id)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, job_id, "Failed to update job title"))
            .context("Failed to update job title")?;

        Ok(())
    }

    async fn update_report_filename(&self, job_id: i64, filename: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE jobs SET report_filename = $1 WHERE id = $2")
            .bind(filename)
            .bind(job_id)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, job_id, "Failed to update report filename"))
            .context("Failed to update report filename")?;

        Ok(())
    }

    async fn checkpoints(&self, job_id: i64) -> anyhow::Result<Vec<Checkpoint>> {
        let rows = sqlx::query_as::<_, CheckpointRow>(
            "SELECT job_id, stage, done, artifact_path FROM stage_checkpoints WHERE job_id = $1",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, job_id, "Failed to fetch checkpoints"))
        .context("Failed to fetch checkpoints")?;

        rows.into_iter().map(Checkpoint::try_from).collect()
    }

    async fn set_checkpoint(
        &self,
        job_id: i64,
        stage: Stage,
        done: bool,
        artifact_path: Option<&str>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stage_checkpoints (job_id, stage, done, artifact_path)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (job_id, stage)
            DO UPDATE SET done = excluded.done, artifact_path = excluded.artifact_path
            "#,
        )
        .bind(job_id)
        .bind(stage.as_str())
        .bind(done)
        .bind(artifact_path)
        .execute(&self.pool)
        .await
        .inspect_err(
            |e| tracing::error!(error = ?e, job_id, %stage, "Failed to set checkpoint"),
        )
        .context("Failed to set checkpoint")?;

        Ok(())
    }

    async fn reset_checkpoint(&self, job_id: i64, stage: Stage) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE stage_checkpoints SET done = 0, artifact_path = NULL \
             WHERE job_id = $1 AND stage = $2",
        )
        .bind(job_id)
        .bind(stage.as_str())
        .execute(&self.pool)
        .await
        .inspect_err(
            |e| tracing::error!(error = ?e, job_id, %stage, "Failed to reset checkpoint"),
        )
        .context("Failed to reset checkpoint")?;

        Ok(())
    }
}
