use std::future::Future;

use crate::{Step, StepDef, StepPatch, TaskLog};

pub mod nevermined;

pub trait StepStore {
    fn get_step(&self, step_id: &str) -> impl Future<Output = anyhow::Result<Step>> + Send;

    /// Creates all `steps` in one request; either every step exists afterwards
    /// or none does.
    fn create_steps(
        &self,
        did: &str,
        task_id: &str,
        steps: &[StepDef],
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn update_step(
        &self,
        did: &str,
        task_id: &str,
        step_id: &str,
        patch: &StepPatch,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Appends a progress notice to the task's log stream.
    fn log_task(&self, entry: &TaskLog) -> impl Future<Output = anyhow::Result<()>> + Send;
}

impl<T: StepStore + Send + Sync> StepStore for &T {
    async fn get_step(&self, step_id: &str) -> anyhow::Result<Step> {
        (**self).get_step(step_id).await
    }

    async fn create_steps(&self, did: &str, task_id: &str, steps: &[StepDef]) -> anyhow::Result<()> {
        (**self).create_steps(did, task_id, steps).await
    }

    async fn update_step(
        &self,
        did: &str,
        task_id: &str,
        step_id: &str,
        patch: &StepPatch,
    ) -> anyhow::Result<()> {
        (**self).update_step(did, task_id, step_id, patch).await
    }

    async fn log_task(&self, entry: &TaskLog) -> anyhow::Result<()> {
        (**self).log_task(entry).await
    }
}
