use std::{
    collections::HashSet,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use anyhow::Context;
use step_store::{NvmStepStore, Step};
use tokio::{sync::mpsc, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::dispatch::StepEvent;

/// Which steps a subscriber listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every agent owned by the account.
    Account,
    /// Only the listed agents, by DID.
    Agents(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct SubscribeOptions {
    pub scope: Scope,
    /// Deliver steps that were already pending when the subscription started.
    pub redeliver_pending: bool,
    pub poll_interval: Duration,
}

/// Listing of currently pending steps.
pub trait PendingFeed {
    /// Pending steps of agent `did`, or of the whole account when `None`.
    fn pending_steps(
        &self,
        did: Option<&str>,
    ) -> impl Future<Output = anyhow::Result<Vec<Step>>> + Send;
}

impl PendingFeed for NvmStepStore {
    async fn pending_steps(&self, did: Option<&str>) -> anyhow::Result<Vec<Step>> {
        Ok(self.list_pending_steps(did).await?)
    }
}

/// Shared record of the step ids a subscriber has delivered.
///
/// Releasing an id makes the next poll deliver that step again if it is
/// still listed as pending.
#[derive(Debug, Clone, Default)]
pub struct Redelivery {
    seen: Arc<Mutex<HashSet<String>>>,
}

impl Redelivery {
    pub fn release(&self, step_id: &str) {
        if self.lock().remove(step_id) {
            tracing::debug!(step_id, "Step released for redelivery");
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Turns periodic listings of pending steps into a stream of step events,
/// delivering each pending step once.
pub struct PollingSubscriber<P> {
    feed: P,
    options: SubscribeOptions,
    seen: Redelivery,
    primed: bool,
}

impl<P: PendingFeed> PollingSubscriber<P> {
    pub fn new(feed: P, options: SubscribeOptions) -> Self {
        Self {
            feed,
            options,
            seen: Redelivery::default(),
            primed: false,
        }
    }

    /// Handle for releasing delivered steps; see [`Redelivery`].
    pub fn redelivery(&self) -> Redelivery {
        self.seen.clone()
    }

    async fn pending(&self) -> anyhow::Result<Vec<Step>> {
        match &self.options.scope {
            Scope::Account => self.feed.pending_steps(None).await,
            Scope::Agents(dids) => {
                let mut steps = Vec::new();
                for did in dids {
                    steps.extend(self.feed.pending_steps(Some(did.as_str())).await?);
                }
                Ok(steps)
            }
        }
    }

    /// Polls the feed once and sends events for newly pending steps,
    /// returning how many were sent.
    pub async fn poll_once(&mut self, events: &mpsc::Sender<StepEvent>) -> anyhow::Result<usize> {
        let steps = self.pending().await?;

        let fresh = {
            let mut seen = self.seen.lock();
            let listed = steps
                .iter()
                .map(|s| s.step_id.as_str())
                .collect::<HashSet<_>>();
            seen.retain(|id| listed.contains(id.as_str()));

            steps
                .iter()
                .filter(|s| seen.insert(s.step_id.clone()))
                .collect::<Vec<_>>()
        };

        let deliver = self.primed || self.options.redeliver_pending;
        self.primed = true;
        if !deliver {
            if !fresh.is_empty() {
                tracing::info!(skipped = fresh.len(), "Ignoring steps pending before subscription");
            }
            return Ok(0);
        }

        let mut sent = 0;
        for step in fresh {
            events
                .send(StepEvent::from(step))
                .await
                .context("Step event receiver dropped")?;
            sent += 1;
        }
        Ok(sent)
    }

    /// Polls every `poll_interval` until `cancel` fires or the receiving side
    /// of `events` is dropped. Failed polls are logged and retried on the next
    /// tick.
    pub async fn run(mut self, events: mpsc::Sender<StepEvent>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.options.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(scope = ?self.options.scope, "Subscribed to step events");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if events.is_closed() {
                break;
            }

            match self.poll_once(&events).await {
                Ok(0) => {}
                Ok(sent) => tracing::debug!(sent, "Delivered step events"),
                Err(e) if events.is_closed() => {
                    tracing::debug!(error = ?e, "Receiver closed during poll");
                    break;
                }
                Err(e) => tracing::warn!(error = ?e, "Failed to poll pending steps"),
            }
        }
        tracing::info!("Subscription stopped");
    }
}
