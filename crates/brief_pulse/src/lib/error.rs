#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Every download strategy failed. `causes` carries one line per strategy
    /// so no earlier failure is ever silently dropped.
    #[error("all download strategies failed for {url}:\n{causes}")]
    Acquisition { url: String, causes: String },

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("content analysis failed: {0}")]
    Analysis(String),

    #[error("failed to parse {0}")]
    Parse(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
