use std::sync::{Arc, Mutex};
use youtube_agent::TranscriptFetcher;

#[derive(Clone)]
pub struct MockTranscriptFetcher {
    pub chunks: Vec<String>,
    pub calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    pub fail_with: Option<String>,
}

impl MockTranscriptFetcher {
    pub fn new(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn empty() -> Self {
        Self::new(&[])
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Self::empty()
        }
    }
}

impl TranscriptFetcher for MockTranscriptFetcher {
    type Error = anyhow::Error;

    async fn fetch(&self, video_ref: &str, languages: &[String]) -> Result<Vec<String>, Self::Error> {
        self.calls
            .lock()
            .unwrap()
            .push((video_ref.to_string(), languages.to_vec()));
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self.chunks.clone())
    }
}
