use std::{fmt::Debug, future::Future};

use serde::Deserialize;

pub trait Summarizer {
    /// Character budget for a single request, roughly a quarter of the
    /// model's token window.
    const CONTEXT_WINDOW_LIMIT: usize = 48_000;
    const SUMMARIZER_MODEL: &'static str;

    type Error: Debug;

    fn summarize(&self, content: &str)
        -> impl Future<Output = Result<SummaryResponse, Self::Error>>;
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}
