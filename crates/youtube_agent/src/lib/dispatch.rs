use std::future::Future;

use serde::{Deserialize, Serialize};
use step_store::{Step, StepStatus};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{error::Error, subscription::Redelivery};

/// Notification that a step changed and may need processing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepEvent {
    pub did: String,
    pub task_id: String,
    pub step_id: String,
}

impl From<&Step> for StepEvent {
    fn from(step: &Step) -> Self {
        Self {
            did: step.did.clone(),
            task_id: step.task_id.clone(),
            step_id: step.step_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The step was no longer pending; nothing was written.
    Skipped(StepStatus),
    /// The step is still pending and waits on another step; nothing was
    /// written.
    Deferred,
    Completed,
    Failed(String),
}

impl StepOutcome {
    /// Whether the step still needs another delivery.
    pub fn is_unsettled(&self) -> bool {
        matches!(self, StepOutcome::Deferred)
    }
}

pub trait StepHandler {
    fn handle(&self, event: &StepEvent) -> impl Future<Output = Result<StepOutcome, Error>>;
}

/// Feeds step events to a handler, one at a time, in arrival order.
pub struct Dispatcher<H> {
    handler: H,
    redelivery: Option<Redelivery>,
}

impl<H: StepHandler> Dispatcher<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            redelivery: None,
        }
    }

    /// Hands steps that are still pending after their handler returned
    /// (deferred, or failed with an error) back to the subscriber behind
    /// `redelivery`, so a later poll delivers them again.
    pub fn with_redelivery(mut self, redelivery: Redelivery) -> Self {
        self.redelivery = Some(redelivery);
        self
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Runs until `cancel` fires or every sender is dropped, returning the
    /// number of events whose handler ran to completion.
    ///
    /// Cancellation aborts an in-flight handler; its step stays `Pending`.
    pub async fn run(&self, mut events: mpsc::Receiver<StepEvent>, cancel: CancellationToken) -> usize {
        let mut handled = 0;

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            let span = tracing::info_span!(
                "step_event",
                did = %event.did,
                task_id = %event.task_id,
                step_id = %event.step_id
            );

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::warn!(step_id = %event.step_id, "Cancelled while handling step");
                    break;
                }
                result = self.handler.handle(&event).instrument(span) => result,
            };
            handled += 1;

            if result.as_ref().map_or(true, StepOutcome::is_unsettled) {
                if let Some(redelivery) = &self.redelivery {
                    redelivery.release(&event.step_id);
                }
            }

            match result {
                Ok(outcome) => {
                    tracing::info!(step_id = %event.step_id, ?outcome, "Step event handled")
                }
                Err(e) => {
                    tracing::error!(error = %e, step_id = %event.step_id, "Failed to handle step event")
                }
            }
        }

        tracing::info!(handled, "Dispatcher stopped");
        handled
    }
}
