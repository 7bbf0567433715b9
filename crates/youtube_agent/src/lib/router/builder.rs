use step_store::StepStore;

use crate::{config::AgentConfig, SingleStepAgent, StageRouter, Summarizer, TranscriptFetcher};

pub struct AgentBuilder<S = (), F = (), Z = ()> {
    store: S,
    fetcher: F,
    summarizer: Z,
    languages: Vec<String>,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            store: (),
            fetcher: (),
            summarizer: (),
            languages: vec!["en".to_string()],
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new().languages(config.languages.clone())
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, F, Z> AgentBuilder<S, F, Z> {
    pub fn store<S2: StepStore>(self, store: S2) -> AgentBuilder<S2, F, Z> {
        AgentBuilder {
            store,
            fetcher: self.fetcher,
            summarizer: self.summarizer,
            languages: self.languages,
        }
    }

    pub fn fetcher<F2: TranscriptFetcher>(self, fetcher: F2) -> AgentBuilder<S, F2, Z> {
        AgentBuilder {
            store: self.store,
            fetcher,
            summarizer: self.summarizer,
            languages: self.languages,
        }
    }

    pub fn summarizer<Z2: Summarizer>(self, summarizer: Z2) -> AgentBuilder<S, F, Z2> {
        AgentBuilder {
            store: self.store,
            fetcher: self.fetcher,
            summarizer,
            languages: self.languages,
        }
    }

    /// Transcript language preferences, most preferred first. An empty list
    /// keeps the current preferences.
    pub fn languages(mut self, languages: Vec<String>) -> Self {
        if !languages.is_empty() {
            self.languages = languages;
        }
        self
    }
}

impl<S, F, Z> AgentBuilder<S, F, Z>
where
    S: StepStore,
    F: TranscriptFetcher,
    Z: Summarizer,
{
    pub fn build_router(self) -> StageRouter<S, F, Z> {
        StageRouter {
            store: self.store,
            fetcher: self.fetcher,
            summarizer: self.summarizer,
            languages: self.languages,
        }
    }

    pub fn build_single(self) -> SingleStepAgent<S, F, Z> {
        SingleStepAgent::new(self.build_router())
    }
}
