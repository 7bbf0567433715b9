#![allow(dead_code)]

pub mod pending_feed;
pub mod store;
pub mod summarizer;
pub mod transcript_fetcher;

use step_store::{Step, StepStatus};

pub const DID: &str = "did:nv:youtube-agent";
pub const TASK_ID: &str = "task-1";

pub fn step(step_id: &str, name: &str, status: StepStatus, input_query: &str) -> Step {
    Step {
        step_id: step_id.to_string(),
        task_id: TASK_ID.to_string(),
        did: DID.to_string(),
        name: name.to_string(),
        step_status: status,
        input_query: input_query.to_string(),
        output: None,
        predecessor: None,
        is_last: false,
        is_waiting: false,
        order: 1,
        created_at: None,
        updated_at: None,
    }
}
