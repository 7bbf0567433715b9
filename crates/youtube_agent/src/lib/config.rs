use std::time::Duration;

use step_store::Environment;

use crate::{
    error::Error,
    subscription::{Scope, SubscribeOptions},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One event runs fetch, summarize and report in a single pass.
    Single,
    /// Jobs are split into `init`, `transcript` and `summarize` steps.
    Staged,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub nvm_api_key: String,
    pub openai_api_key: String,
    pub environment: Environment,
    /// Agent DID listened to in staged mode.
    pub did: Option<String>,
    pub languages: Vec<String>,
    pub poll_interval: Duration,
    pub summarizer_model: Option<String>,
}

impl AgentConfig {
    pub fn subscribe_options(&self, mode: Mode) -> Result<SubscribeOptions, Error> {
        match mode {
            Mode::Single => Ok(SubscribeOptions {
                scope: Scope::Account,
                redeliver_pending: true,
                poll_interval: self.poll_interval,
            }),
            Mode::Staged => {
                let did = self
                    .did
                    .as_deref()
                    .map(str::trim)
                    .filter(|did| !did.is_empty())
                    .ok_or(Error::Config("DID is required in staged mode"))?;

                Ok(SubscribeOptions {
                    scope: Scope::Agents(vec![did.to_string()]),
                    redeliver_pending: false,
                    poll_interval: self.poll_interval,
                })
            }
        }
    }
}
