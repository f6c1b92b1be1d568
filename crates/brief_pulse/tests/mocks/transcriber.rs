use std::sync::{Arc, Mutex};

use brief_pulse::{AudioInput, TranscribeResponse, TranscribeSegment, Transcriber};

#[derive(Clone)]
pub struct MockTranscriber {
    pub segments: Vec<TranscribeSegment>,
    pub calls: Arc<Mutex<Vec<AudioInput>>>,
    pub fail_with: Option<String>,
}

impl MockTranscriber {
    /// Three choppy fragments that the merge engine folds into one sentence.
    pub fn choppy_greeting() -> Self {
        Self::with_segments(vec![
            TranscribeSegment {
                start: 0.0,
                end: 1.5,
                text: "Hi".into(),
            },
            TranscribeSegment {
                start: 1.6,
                end: 4.0,
                text: "there, how".into(),
            },
            TranscribeSegment {
                start: 4.2,
                end: 9.0,
                text: "are you today?".into(),
            },
        ])
    }

    pub fn with_segments(segments: Vec<TranscribeSegment>) -> Self {
        Self {
            segments,
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            segments: Vec::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(msg.to_string()),
        }
    }
}

impl Transcriber for MockTranscriber {
    const TRANSCRIBER_MODEL: &'static str = "mock-whisper";
    type Error = anyhow::Error;

    async fn transcribe(&self, audio_input: AudioInput) -> Result<TranscribeResponse, Self::Error> {
        self.calls.lock().unwrap().push(audio_input);
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        let text = self
            .segments
            .iter()
            .map(|s| s.text.trim())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(TranscribeResponse {
            duration: self.segments.last().map(|s| s.end).unwrap_or(0.0),
            text,
            segments: Some(self.segments.clone()),
        })
    }
}
