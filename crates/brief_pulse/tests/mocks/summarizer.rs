use std::sync::{Arc, Mutex};

use brief_pulse::Summarizer;

#[derive(Clone)]
pub struct MockSummarizer {
    pub response: String,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl MockSummarizer {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    /// A well-formed analysis whose quote points back at the greeting
    /// segment produced by `MockTranscriber::choppy_greeting`.
    pub fn greeting_analysis() -> Self {
        Self::new(
            r#"{
                "summary": "A short greeting exchange.",
                "key_points": [
                    {
                        "point": "Opening greeting",
                        "explanation": "The speaker opens with a friendly greeting.",
                        "quote": "how are you today?"
                    }
                ]
            }"#,
        )
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            response: String::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(msg.to_string()),
        }
    }
}

impl Summarizer for MockSummarizer {
    const CONTEXT_WINDOW_LIMIT: usize = 128_000;
    const SUMMARIZER_MODEL: &'static str = "mock-gpt";
    type Error = anyhow::Error;

    async fn complete(&self, prompt: &str) -> Result<String, Self::Error> {
        self.calls.lock().unwrap().push(prompt.to_string());
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self.response.clone())
    }
}
