#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Step store error: {0:#}")]
    Store(#[from] anyhow::Error),
    #[error("Unknown stage: {0}")]
    UnknownStage(String),
    #[error("Invalid configuration: {0}")]
    Config(&'static str),
}
