use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use brief_pulse::acquire::{AudioFetcher, FetchStrategy, FetchedAudio};

#[derive(Clone, Default)]
pub struct MockFetcher {
    /// strategy names attempted, in order
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl MockFetcher {
    pub fn failing(msg: &str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(msg.to_string()),
        }
    }
}

impl AudioFetcher for MockFetcher {
    fn fetch(
        &self,
        _url: &str,
        strategy: &FetchStrategy,
        output: &Path,
    ) -> anyhow::Result<FetchedAudio> {
        self.calls.lock().unwrap().push(strategy.name.to_string());
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        std::fs::write(output, b"fake mp3 bytes")?;
        Ok(FetchedAudio {
            path: output.to_path_buf(),
            title: Some("Mock Video Title".to_string()),
        })
    }
}
