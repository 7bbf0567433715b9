use itertools::Itertools;
use reqwest::Client;
use serde::Deserialize;

use crate::{Summarizer, SummaryResponse};

#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenAIError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("No content in completion response")]
    EmptyResponse,
    #[error("Nothing to summarize")]
    EmptyInput,
}

impl OpenAIClient {
    const MAP_PROMPT: &str = include_str!("./prompts/map.txt");
    const COMBINE_PROMPT: &str = include_str!("./prompts/combine.txt");

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".into(),
            model: <Self as Summarizer>::SUMMARIZER_MODEL.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub async fn send_completion_request(
        &self,
        system_prompt: &str,
        user_content: impl Into<String>,
    ) -> Result<CompletionResponse, OpenAIError> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                {
                    "role": "system",
                    "content": system_prompt
                },
                {
                    "role": "user",
                    "content": user_content.into()
                }
            ]
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(OpenAIError::Api { status, message });
        }

        Ok(resp.json::<CompletionResponse>().await?)
    }

    async fn complete(&self, system_prompt: &str, content: &str) -> Result<String, OpenAIError> {
        self.send_completion_request(system_prompt, content)
            .await?
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(OpenAIError::EmptyResponse)
    }

    /// Summarizes each chunk of `content` on its own, then folds the partial
    /// summaries together until a single summary remains.
    #[tracing::instrument(skip_all, fields(len = content.len()))]
    async fn map_reduce(&self, content: &str) -> Result<String, OpenAIError> {
        let chunks = split_text(content, Self::CONTEXT_WINDOW_LIMIT);
        if chunks.is_empty() {
            return Err(OpenAIError::EmptyInput);
        }

        tracing::info!(chunks = chunks.len(), "Summarizing chunks");
        let mut partials = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            partials.push(self.complete(Self::MAP_PROMPT, chunk).await?);
        }

        while partials.len() > 1 {
            let mut groups = pack_partials(&partials, Self::CONTEXT_WINDOW_LIMIT);
            // oversized partials would never shrink otherwise
            if groups.len() == partials.len() {
                groups = vec![partials.iter().join("\n\n")];
            }

            tracing::debug!(partials = partials.len(), groups = groups.len(), "Combining summaries");
            let mut combined = Vec::with_capacity(groups.len());
            for group in &groups {
                combined.push(self.complete(Self::COMBINE_PROMPT, group).await?);
            }
            partials = combined;
        }

        partials.pop().ok_or(OpenAIError::EmptyResponse)
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: CompletionMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    pub content: Option<String>,
}

impl Summarizer for OpenAIClient {
    const SUMMARIZER_MODEL: &'static str = "gpt-4o-mini";
    type Error = OpenAIError;

    async fn summarize(&self, content: &str) -> Result<SummaryResponse, Self::Error> {
        let summary = self
            .map_reduce(content)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to summarize content"))?;

        Ok(SummaryResponse { summary })
    }
}

/// Splits `text` at whitespace into chunks of at most `limit` characters.
/// A single word longer than `limit` becomes its own chunk.
fn split_text(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut size = 0;

    for word in text.split_whitespace() {
        let len = word.chars().count();
        if size > 0 && size + 1 + len > limit {
            chunks.push(std::mem::take(&mut current));
            size = 0;
        }
        if size > 0 {
            current.push(' ');
            size += 1;
        }
        current.push_str(word);
        size += len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Greedily packs consecutive partial summaries into groups of at most
/// `limit` characters.
fn pack_partials(partials: &[String], limit: usize) -> Vec<String> {
    let mut groups: Vec<Vec<&str>> = Vec::new();
    let mut size = 0;

    for partial in partials {
        let len = partial.chars().count();
        match groups.last_mut() {
            Some(group) if size + 2 + len <= limit => {
                group.push(partial.as_str());
                size += 2 + len;
            }
            _ => {
                groups.push(vec![partial.as_str()]);
                size = len;
            }
        }
    }

    groups.into_iter().map(|g| g.join("\n\n")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_text_respects_limit() {
        let chunks = split_text("aa bb cc dd ee", 5);
        assert_eq!(chunks, vec!["aa bb", "cc dd", "ee"]);
        assert!(chunks.iter().all(|c| c.len() <= 5));
    }

    #[test]
    fn test_split_text_keeps_long_words_whole() {
        assert_eq!(split_text("tiny enormousword x", 6), vec!["tiny", "enormousword", "x"]);
    }

    #[test]
    fn test_split_text_counts_characters_not_bytes() {
        // each word is 2 characters but 4 bytes
        let chunks = split_text("éé üü öö", 5);
        assert_eq!(chunks, vec!["éé üü", "öö"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 5));
    }

    #[test]
    fn test_pack_partials_counts_characters_not_bytes() {
        let partials = vec!["ñañ".to_string(), "ñuñ".to_string()];
        assert_eq!(pack_partials(&partials, 8), vec!["ñañ\n\nñuñ"]);
    }

    #[test]
    fn test_split_text_on_blank_input() {
        assert!(split_text("  \n\t ", 100).is_empty());
    }

    #[test]
    fn test_pack_partials_groups_in_order() {
        let partials = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        assert_eq!(pack_partials(&partials, 8), vec!["one\n\ntwo", "three"]);
        assert_eq!(pack_partials(&partials, 100), vec!["one\n\ntwo\n\nthree"]);
    }
}
