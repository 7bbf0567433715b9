use std::{fmt, str::FromStr};

use step_store::{generate_step_id, LogLevel, Step, StepDef, StepPatch, StepStatus, StepStore};

use crate::{
    dispatch::{StepEvent, StepHandler, StepOutcome},
    error::Error,
    report, Summarizer, TranscriptFetcher,
};

pub mod builder;

/// Where a `summarize` step gets its text from.
enum Source {
    Text(String),
    /// The predecessor has not reached a terminal status yet.
    Waiting(StepStatus),
    Missing,
}

/// The stages of a multi-step job, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Init,
    Transcript,
    Summarize,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Transcript => "transcript",
            Stage::Summarize => "summarize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(Stage::Init),
            "transcript" => Ok(Stage::Transcript),
            "summarize" => Ok(Stage::Summarize),
            other => Err(Error::UnknownStage(other.to_string())),
        }
    }
}

/// Routes a step to the handler of its stage.
///
/// An `init` step fans out into a `transcript` step and a waiting
/// `summarize` step chained behind it. Each later stage does its own work
/// and reports the result back to the store.
#[derive(Debug)]
pub struct StageRouter<S, F, Z>
where
    S: StepStore,
    F: TranscriptFetcher,
    Z: Summarizer,
{
    pub(crate) store: S,
    pub(crate) fetcher: F,
    pub(crate) summarizer: Z,
    pub(crate) languages: Vec<String>,
}

impl<S, F, Z> StageRouter<S, F, Z>
where
    S: StepStore,
    F: TranscriptFetcher,
    Z: Summarizer,
{
    const TRANSCRIPT_ORDER: i64 = 2;
    const SUMMARIZE_ORDER: i64 = 3;

    pub fn store(&self) -> &S {
        &self.store
    }

    #[tracing::instrument(skip(self), fields(step_id = %event.step_id, task_id = %event.task_id))]
    pub async fn handle(&self, event: &StepEvent) -> Result<StepOutcome, Error> {
        let step = self.store.get_step(&event.step_id).await?;

        if !step.is_pending() {
            tracing::info!(status = %step.step_status, "Step is not pending, skipping");
            return Ok(StepOutcome::Skipped(step.step_status));
        }

        let stage = match step.name.parse::<Stage>() {
            Ok(stage) => stage,
            Err(e) => return report::fail(&self.store, &step, e.to_string()).await,
        };

        tracing::info!(%stage, "Handling step");
        match stage {
            Stage::Init => self.init(&step).await,
            Stage::Transcript => self.transcript(&step).await,
            Stage::Summarize => self.summarize(&step).await,
        }
    }

    /// Creates the `transcript` and `summarize` successors in one batch, then
    /// completes the `init` step with its input passed through.
    async fn init(&self, step: &Step) -> Result<StepOutcome, Error> {
        let transcript_step_id = generate_step_id();

        let successors = [
            StepDef {
                task_id: step.task_id.clone(),
                step_id: transcript_step_id.clone(),
                name: Stage::Transcript.to_string(),
                predecessor: step.step_id.clone(),
                input_query: step.input_query.clone(),
                is_last: false,
                is_waiting: None,
                order: Self::TRANSCRIPT_ORDER,
            },
            StepDef {
                task_id: step.task_id.clone(),
                step_id: generate_step_id(),
                name: Stage::Summarize.to_string(),
                predecessor: transcript_step_id,
                input_query: String::new(),
                is_last: true,
                is_waiting: Some(true),
                order: Self::SUMMARIZE_ORDER,
            },
        ];

        self.store
            .create_steps(&step.did, &step.task_id, &successors)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to create successor steps"))?;

        let patch = StepPatch {
            input_query: Some(step.input_query.clone()),
            ..StepPatch::completed(step, step.input_query.clone(), false)
        };
        self.store
            .update_step(&step.did, &step.task_id, &step.step_id, &patch)
            .await?;

        tracing::info!("Init step completed, successors created");
        Ok(StepOutcome::Completed)
    }

    async fn transcript(&self, step: &Step) -> Result<StepOutcome, Error> {
        match self.fetch_transcript(step).await {
            Ok(text) => report::complete(&self.store, step, text, false).await,
            Err(reason) => report::fail(&self.store, step, reason).await,
        }
    }

    async fn summarize(&self, step: &Step) -> Result<StepOutcome, Error> {
        let source = match self.summarize_source(step).await? {
            Source::Text(text) => text,
            Source::Waiting(status) => {
                tracing::info!(
                    predecessor = ?step.predecessor,
                    %status,
                    is_waiting = step.is_waiting,
                    "Predecessor still running, deferring summarize step"
                );
                return Ok(StepOutcome::Deferred);
            }
            Source::Missing => {
                let reason = format!("No transcript available to summarize for {}", step.step_id);
                return report::fail(&self.store, step, reason).await;
            }
        };

        match self.summarize_text(step, &source).await {
            Ok(summary) => report::complete(&self.store, step, summary, true).await,
            Err(reason) => report::fail(&self.store, step, reason).await,
        }
    }

    /// Text to summarize: the step's own `input_query`, or else the output of
    /// its completed predecessor.
    async fn summarize_source(&self, step: &Step) -> Result<Source, Error> {
        if !step.input_query.trim().is_empty() {
            return Ok(Source::Text(step.input_query.clone()));
        }

        let Some(predecessor_id) = step
            .predecessor
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
        else {
            return Ok(Source::Missing);
        };

        tracing::debug!(predecessor_id, "Reading transcript from predecessor step");
        let predecessor = self.store.get_step(predecessor_id).await?;
        match predecessor.step_status {
            StepStatus::Completed => Ok(predecessor
                .output
                .filter(|o| !o.trim().is_empty())
                .map_or(Source::Missing, Source::Text)),
            StepStatus::Failed => {
                tracing::warn!(predecessor_id, "Predecessor step failed");
                Ok(Source::Missing)
            }
            status => Ok(Source::Waiting(status)),
        }
    }

    /// Fetches the transcript for the video referenced by `step.input_query`
    /// and joins its chunks in order.
    pub(crate) async fn fetch_transcript(&self, step: &Step) -> Result<String, String> {
        report::notice(
            &self.store,
            step,
            LogLevel::Info,
            format!("Fetching transcript for {}", step.input_query),
        )
        .await;

        let chunks = self
            .fetcher
            .fetch(&step.input_query, &self.languages)
            .await
            .map_err(|e| format!("Failed to fetch transcript: {e:?}"))?;

        let text = chunks.concat();
        if text.trim().is_empty() {
            return Err(format!("No transcript available for {}", step.input_query));
        }

        report::notice(
            &self.store,
            step,
            LogLevel::Info,
            format!("Transcript fetched ({} characters)", text.len()),
        )
        .await;

        Ok(text)
    }

    pub(crate) async fn summarize_text(&self, step: &Step, text: &str) -> Result<String, String> {
        report::notice(&self.store, step, LogLevel::Info, "Summarizing transcript").await;

        let response = self
            .summarizer
            .summarize(text)
            .await
            .map_err(|e| format!("Failed to summarize transcript: {e:?}"))?;

        report::notice(&self.store, step, LogLevel::Info, "Summary ready").await;
        Ok(response.summary)
    }
}

impl<S, F, Z> StepHandler for StageRouter<S, F, Z>
where
    S: StepStore,
    F: TranscriptFetcher,
    Z: Summarizer,
{
    async fn handle(&self, event: &StepEvent) -> Result<StepOutcome, Error> {
        StageRouter::handle(self, event).await
    }
}
