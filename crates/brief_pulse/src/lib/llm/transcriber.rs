use std::{fmt::Debug, future::Future, path::PathBuf};

use serde::Deserialize;

pub trait Transcriber {
    const TRANSCRIBER_MODEL: &'static str;

    type Error: Debug;

    fn transcribe(
        &self,
        audio_input: AudioInput,
    ) -> impl Future<Output = Result<TranscribeResponse, Self::Error>> + Send;
}

#[derive(Debug, Clone)]
pub enum AudioInput {
    /// Split the source file into fixed-duration chunks before transcribing.
    /// Needed when the source exceeds the transcription API's upload limit.
    Chunked {
        chunk_duration_seconds: u16,
        chunks_dir_path: PathBuf,
        file_path: PathBuf,
    },
    File(PathBuf),
}

#[derive(Debug, Deserialize)]
pub struct TranscribeResponse {
    pub duration: f64,
    pub text: String,
    pub segments: Option<Vec<TranscribeSegment>>,
}

/// A raw recognizer segment, chopped at pause boundaries rather than sentence
/// boundaries. The merge engine turns these into sentence-scale units.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TranscribeSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}
