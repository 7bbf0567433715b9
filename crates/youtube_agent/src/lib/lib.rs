pub mod config;
pub mod dispatch;
mod error;
mod llm;
mod report;
mod router;
mod single;
pub mod subscription;
pub mod tracing;
pub mod yt;

pub use error::Error;
pub use llm::openai;
pub use llm::summarizer::{Summarizer, SummaryResponse};
pub use router::{builder::AgentBuilder, Stage, StageRouter};
pub use single::SingleStepAgent;
pub use yt::{TranscriptError, TranscriptFetcher};
