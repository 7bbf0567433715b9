use step_store::StepStore;

use crate::{
    dispatch::{StepEvent, StepHandler, StepOutcome},
    error::Error,
    report,
    router::StageRouter,
    Summarizer, TranscriptFetcher,
};

/// Handles a whole job in one step: fetch the transcript of the video in
/// `input_query`, summarize it and complete the step with the summary.
#[derive(Debug)]
pub struct SingleStepAgent<S, F, Z>
where
    S: StepStore,
    F: TranscriptFetcher,
    Z: Summarizer,
{
    inner: StageRouter<S, F, Z>,
}

impl<S, F, Z> SingleStepAgent<S, F, Z>
where
    S: StepStore,
    F: TranscriptFetcher,
    Z: Summarizer,
{
    pub(crate) fn new(inner: StageRouter<S, F, Z>) -> Self {
        Self { inner }
    }

    pub fn store(&self) -> &S {
        self.inner.store()
    }

    #[tracing::instrument(skip(self), fields(step_id = %event.step_id, task_id = %event.task_id))]
    pub async fn handle(&self, event: &StepEvent) -> Result<StepOutcome, Error> {
        let store = &self.inner.store;
        let step = store.get_step(&event.step_id).await?;

        if !step.is_pending() {
            tracing::info!(status = %step.step_status, "Step is not pending, skipping");
            return Ok(StepOutcome::Skipped(step.step_status));
        }

        let transcript = match self.inner.fetch_transcript(&step).await {
            Ok(text) => text,
            Err(reason) => return report::fail(store, &step, reason).await,
        };

        match self.inner.summarize_text(&step, &transcript).await {
            Ok(summary) => report::complete(store, &step, summary, true).await,
            Err(reason) => report::fail(store, &step, reason).await,
        }
    }
}

impl<S, F, Z> StepHandler for SingleStepAgent<S, F, Z>
where
    S: StepStore,
    F: TranscriptFetcher,
    Z: Summarizer,
{
    async fn handle(&self, event: &StepEvent) -> Result<StepOutcome, Error> {
        SingleStepAgent::handle(self, event).await
    }
}
