//! # Step Store
//!
//! Typed access to the remote coordination backend that holds job steps.
//!
//! Steps are grouped into tasks and carry their own status, input, output and
//! ordering metadata. This crate owns the wire shapes of those records and the
//! four operations the agent consumes: reading a step, creating successor
//! steps in one batch, updating a step and appending a task log entry.

mod domain;
mod store;

pub use domain::{generate_step_id, LogLevel, Step, StepDef, StepPatch, StepStatus, TaskLog};
pub use store::nevermined::{Environment, NvmError, NvmStepStore};
pub use store::StepStore;
