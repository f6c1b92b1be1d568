use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;

/// One processing run for one source URL.
///
/// Created when a URL is submitted, mutated through every pipeline stage and
/// terminal at [`JobStatus::Completed`] or [`JobStatus::Failed`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Job {
    pub id: i64,
    pub source_url: String,
    pub title: Option<String>,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub report_filename: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
}

/// Job lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(UnknownVariant {
                kind: "job status",
                value: other.to_string(),
            }),
        }
    }
}

/// Pipeline stages, in the fixed order the orchestrator runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Download,
    Transcribe,
    Report,
}

impl Stage {
    /// Fixed execution order. Resume decisions walk this array front to back.
    pub const ALL: [Stage; 3] = [Stage::Download, Stage::Transcribe, Stage::Report];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Download => "download",
            Stage::Transcribe => "transcribe",
            Stage::Report => "report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "download" => Ok(Stage::Download),
            "transcribe" => Ok(Stage::Transcribe),
            "report" => Ok(Stage::Report),
            other => Err(UnknownVariant {
                kind: "stage",
                value: other.to_string(),
            }),
        }
    }
}

/// Per-stage completion record tied to a job.
///
/// `done` is only trusted after artifact validation; the pipeline resets it
/// whenever the referenced file is missing or empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub job_id: i64,
    pub stage: Stage,
    pub done: bool,
    pub artifact_path: Option<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}
