use std::sync::{Arc, Mutex};
use step_store::Step;
use youtube_agent::subscription::PendingFeed;

#[derive(Clone, Default)]
pub struct MockPendingFeed {
    pub pending: Arc<Mutex<Vec<Step>>>,
    pub calls: Arc<Mutex<Vec<Option<String>>>>,
    pub fail_with: Arc<Mutex<Option<String>>>,
}

impl MockPendingFeed {
    pub fn with_pending(steps: Vec<Step>) -> Self {
        let feed = Self::default();
        feed.set_pending(steps);
        feed
    }

    pub fn set_pending(&self, steps: Vec<Step>) {
        *self.pending.lock().unwrap() = steps;
    }

    /// Fails the next poll only.
    pub fn fail_next(&self, msg: &str) {
        *self.fail_with.lock().unwrap() = Some(msg.to_string());
    }
}

impl PendingFeed for MockPendingFeed {
    async fn pending_steps(&self, did: Option<&str>) -> anyhow::Result<Vec<Step>> {
        self.calls.lock().unwrap().push(did.map(String::from));
        if let Some(msg) = self.fail_with.lock().unwrap().take() {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self
            .pending
            .lock()
            .unwrap()
            .iter()
            .filter(|s| did.map_or(true, |did| s.did == did))
            .cloned()
            .collect())
    }
}
