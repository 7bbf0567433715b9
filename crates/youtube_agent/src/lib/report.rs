use step_store::{LogLevel, Step, StepPatch, StepStatus, StepStore, TaskLog};

use crate::{dispatch::StepOutcome, error::Error};

/// Best-effort progress notice; a failed log call never fails the step.
pub(crate) async fn notice<S: StepStore>(
    store: &S,
    step: &Step,
    level: LogLevel,
    message: impl Into<String>,
) {
    let entry = TaskLog::new(&step.task_id, level, message);
    send_log(store, &entry).await;
}

async fn send_log<S: StepStore>(store: &S, entry: &TaskLog) {
    if let Err(e) = store.log_task(entry).await {
        tracing::warn!(error = ?e, task_id = %entry.task_id, "Failed to send task log");
    }
}

pub(crate) async fn complete<S: StepStore>(
    store: &S,
    step: &Step,
    output: String,
    is_last: bool,
) -> Result<StepOutcome, Error> {
    let patch = StepPatch::completed(step, output, is_last);
    store
        .update_step(&step.did, &step.task_id, &step.step_id, &patch)
        .await?;

    tracing::info!(step_id = %step.step_id, is_last, "Step completed");
    Ok(StepOutcome::Completed)
}

pub(crate) async fn fail<S: StepStore>(
    store: &S,
    step: &Step,
    reason: String,
) -> Result<StepOutcome, Error> {
    tracing::error!(step_id = %step.step_id, %reason, "Step failed");

    let entry = TaskLog::new(&step.task_id, LogLevel::Error, &reason).with_status(StepStatus::Failed);
    send_log(store, &entry).await;

    store
        .update_step(&step.did, &step.task_id, &step.step_id, &StepPatch::failed(step))
        .await?;

    Ok(StepOutcome::Failed(reason))
}
