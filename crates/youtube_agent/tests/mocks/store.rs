use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use step_store::{Step, StepDef, StepPatch, StepStatus, StepStore, TaskLog};
use youtube_agent::subscription::PendingFeed;

#[derive(Clone, Default)]
pub struct MockStepStore {
    pub steps: Arc<Mutex<HashMap<String, Step>>>,
    pub created: Arc<Mutex<Vec<Vec<StepDef>>>>,
    pub updates: Arc<Mutex<Vec<StepPatch>>>,
    pub logs: Arc<Mutex<Vec<TaskLog>>>,
    pub fail_create_with: Option<String>,
    pub fail_logs: bool,
}

impl MockStepStore {
    pub fn with_steps(steps: impl IntoIterator<Item = Step>) -> Self {
        let store = Self::default();
        store.insert(steps);
        store
    }

    pub fn failing_create(self, msg: &str) -> Self {
        Self {
            fail_create_with: Some(msg.to_string()),
            ..self
        }
    }

    pub fn failing_logs(self) -> Self {
        Self {
            fail_logs: true,
            ..self
        }
    }

    pub fn insert(&self, steps: impl IntoIterator<Item = Step>) {
        let mut map = self.steps.lock().unwrap();
        for step in steps {
            map.insert(step.step_id.clone(), step);
        }
    }

    pub fn step(&self, step_id: &str) -> Option<Step> {
        self.steps.lock().unwrap().get(step_id).cloned()
    }

    /// Number of create and update calls issued so far.
    pub fn mutation_count(&self) -> usize {
        self.created.lock().unwrap().len() + self.updates.lock().unwrap().len()
    }

    pub fn last_update(&self) -> Option<StepPatch> {
        self.updates.lock().unwrap().last().cloned()
    }
}

impl StepStore for MockStepStore {
    async fn get_step(&self, step_id: &str) -> anyhow::Result<Step> {
        self.step(step_id)
            .ok_or_else(|| anyhow::anyhow!("step {step_id} not found"))
    }

    async fn create_steps(&self, did: &str, task_id: &str, steps: &[StepDef]) -> anyhow::Result<()> {
        if let Some(ref msg) = self.fail_create_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        self.created.lock().unwrap().push(steps.to_vec());

        let mut map = self.steps.lock().unwrap();
        for def in steps {
            map.insert(
                def.step_id.clone(),
                Step {
                    step_id: def.step_id.clone(),
                    task_id: task_id.to_string(),
                    did: did.to_string(),
                    name: def.name.clone(),
                    step_status: StepStatus::Pending,
                    input_query: def.input_query.clone(),
                    output: None,
                    predecessor: Some(def.predecessor.clone()),
                    is_last: def.is_last,
                    is_waiting: def.is_waiting.unwrap_or(false),
                    order: def.order,
                    created_at: None,
                    updated_at: None,
                },
            );
        }
        Ok(())
    }

    async fn update_step(
        &self,
        _did: &str,
        _task_id: &str,
        step_id: &str,
        patch: &StepPatch,
    ) -> anyhow::Result<()> {
        self.updates.lock().unwrap().push(patch.clone());

        let mut map = self.steps.lock().unwrap();
        let step = map
            .get_mut(step_id)
            .ok_or_else(|| anyhow::anyhow!("step {step_id} not found"))?;
        step.step_status = patch.step_status;
        if let Some(ref output) = patch.output {
            step.output = Some(output.clone());
        }
        if let Some(ref input_query) = patch.input_query {
            step.input_query = input_query.clone();
        }
        if let Some(is_last) = patch.is_last {
            step.is_last = is_last;
        }
        Ok(())
    }

    async fn log_task(&self, entry: &TaskLog) -> anyhow::Result<()> {
        if self.fail_logs {
            return Err(anyhow::anyhow!("log stream unavailable"));
        }
        self.logs.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

impl PendingFeed for MockStepStore {
    /// Pending steps, latest in the pipeline first.
    async fn pending_steps(&self, did: Option<&str>) -> anyhow::Result<Vec<Step>> {
        let mut steps = self
            .steps
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.is_pending() && did.map_or(true, |did| s.did == did))
            .cloned()
            .collect::<Vec<_>>();
        steps.sort_by(|a, b| b.order.cmp(&a.order));
        Ok(steps)
    }
}
