use std::{fmt, str::FromStr};

use anyhow::Context;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::{store::StepStore, Step, StepDef, StepPatch, StepStatus, TaskLog};

/// Deployment of the coordination backend the agent talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Local,
    Staging,
    Testing,
    Arbitrum,
    Custom(String),
}

impl Environment {
    pub fn backend_url(&self) -> &str {
        match self {
            Environment::Local => "http://localhost:3001",
            Environment::Staging => "https://one-backend.staging.nevermined.app",
            Environment::Testing => "https://one-backend.testing.nevermined.app",
            Environment::Arbitrum => "https://one-backend.arbitrum.nevermined.app",
            Environment::Custom(url) => url.as_str(),
        }
    }
}

impl FromStr for Environment {
    type Err = NvmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let env = match s.trim() {
            "local" => Environment::Local,
            "staging" | "appStaging" => Environment::Staging,
            "testing" | "appTesting" => Environment::Testing,
            "arbitrum" | "appArbitrum" => Environment::Arbitrum,
            url if url.starts_with("http://") || url.starts_with("https://") => {
                Environment::Custom(url.trim_end_matches('/').to_string())
            }
            other => return Err(NvmError::UnknownEnvironment(other.to_string())),
        };
        Ok(env)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Local => f.write_str("local"),
            Environment::Staging => f.write_str("staging"),
            Environment::Testing => f.write_str("testing"),
            Environment::Arbitrum => f.write_str("arbitrum"),
            Environment::Custom(url) => f.write_str(url),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NvmError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),
}

#[derive(Debug, Clone)]
pub struct NvmStepStore {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
struct CreateStepsBody<'a> {
    steps: &'a [StepDef],
}

#[derive(Deserialize)]
struct StepsPage {
    #[serde(default)]
    steps: Vec<Step>,
}

impl NvmStepStore {
    pub fn new(api_key: impl Into<String>, environment: &Environment) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: environment.backend_url().to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/agents{}", self.base_url, path)
    }

    async fn check(resp: Response) -> Result<Response, NvmError> {
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(NvmError::Api { status, message });
        }
        Ok(resp)
    }

    /// Lists steps currently `Pending`, either for a single agent `did` or
    /// across every agent of the account when `did` is `None`.
    #[tracing::instrument(skip(self))]
    pub async fn list_pending_steps(&self, did: Option<&str>) -> Result<Vec<Step>, NvmError> {
        let url = match did {
            Some(did) => self.url(&format!("/{did}/steps")),
            None => self.url("/steps"),
        };

        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .query(&[("status", StepStatus::Pending.to_string())])
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        let page = Self::check(resp).await?.json::<StepsPage>().await?;
        Ok(page.steps)
    }
}

impl StepStore for NvmStepStore {
    async fn get_step(&self, step_id: &str) -> anyhow::Result<Step> {
        let resp = self
            .client
            .get(self.url(&format!("/step/{step_id}")))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, step_id, "Failed to fetch step"))
            .context("Failed to fetch step")?;

        let step = Self::check(resp)
            .await?
            .json::<Step>()
            .await
            .inspect_err(|e| tracing::error!(error = %e, step_id, "Malformed step payload"))
            .context("Malformed step payload")?;

        Ok(step)
    }

    async fn create_steps(&self, did: &str, task_id: &str, steps: &[StepDef]) -> anyhow::Result<()> {
        let resp = self
            .client
            .post(self.url(&format!("/{did}/tasks/{task_id}/steps")))
            .bearer_auth(&self.api_key)
            .json(&CreateStepsBody { steps })
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, task_id, "Failed to create steps"))
            .context("Failed to create steps")?;

        Self::check(resp)
            .await
            .inspect_err(|e| tracing::error!(error = %e, task_id, "Step creation rejected"))?;

        Ok(())
    }

    async fn update_step(
        &self,
        did: &str,
        task_id: &str,
        step_id: &str,
        patch: &StepPatch,
    ) -> anyhow::Result<()> {
        let resp = self
            .client
            .put(self.url(&format!("/{did}/tasks/{task_id}/step/{step_id}")))
            .bearer_auth(&self.api_key)
            .json(patch)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, step_id, "Failed to update step"))
            .context("Failed to update step")?;

        Self::check(resp)
            .await
            .inspect_err(|e| tracing::error!(error = %e, step_id, "Step update rejected"))?;

        Ok(())
    }

    async fn log_task(&self, entry: &TaskLog) -> anyhow::Result<()> {
        let resp = self
            .client
            .post(self.url(&format!("/tasks/{}/log", entry.task_id)))
            .bearer_auth(&self.api_key)
            .json(entry)
            .send()
            .await
            .context("Failed to send task log")?;

        Self::check(resp).await?;
        Ok(())
    }
}
