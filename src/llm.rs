//! Chat-completion client shared by the relevance and stance stages.
//!
//! Thin wrapper over an OpenAI-compatible endpoint with exponential backoff
//! on rate limits and transient failures. Each retry is logged.

use crate::error::{CuratorError, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Sampling temperature used by both classification stages
const TEMPERATURE: f64 = 0.3;

/// LLM endpoint configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// OpenAI-compatible chat client with retry/backoff.
pub struct ChatClient {
    client: reqwest::Client,
    config: LlmConfig,
    max_retries: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl ChatClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CuratorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            max_retries: 5,
        })
    }

    /// Send one system+user exchange, retrying with exponential backoff.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let mut backoff = Duration::from_millis(500);
        let mut last_err = CuratorError::Config("no attempts made".to_string());

        for attempt in 0..self.max_retries {
            match self.do_complete(system, user).await {
                Ok(content) => return Ok(content),
                Err(CuratorError::RateLimited(secs)) => {
                    let wait = Duration::from_secs(secs).max(backoff);
                    warn!(
                        attempt = attempt + 1,
                        wait_secs = wait.as_secs(),
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(wait).await;
                    backoff *= 2;
                    last_err = CuratorError::RateLimited(secs);
                }
                Err(e) => {
                    warn!(attempt = attempt + 1, error = %e, "Completion failed");
                    last_err = e;
                    if attempt < self.max_retries - 1 {
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                    }
                }
            }
        }

        Err(last_err)
    }

    async fn do_complete(&self, system: &str, user: &str) -> Result<String> {
        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user}
            ],
            "temperature": TEMPERATURE,
        });

        let api_url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        debug!(model = %self.config.model, "Sending chat completion request");

        let response = self
            .client
            .post(&api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request_body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CuratorError::RateLimited(5));
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CuratorError::Api {
                code: status.as_u16() as i32,
                message: format!("LLM API error: {} - {}", status, error_text),
            });
        }

        let api_response: ChatCompletionResponse = response.json().await?;

        Ok(api_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }
}

/// Split a "label on the first line, rationale after a blank line" reply.
///
/// Replies that do not have exactly two blank-line-separated parts yield
/// `None`; callers record those as unparseable rather than guessing.
pub fn split_label_rationale(content: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = content.trim().split("\n\n").collect();
    if parts.len() == 2 {
        Some((
            parts[0].trim().to_lowercase(),
            parts[1].trim().to_string(),
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_label_rationale_two_parts() {
        let (label, rationale) =
            split_label_rationale("Relevant\n\nThe abstract discusses trace decay.").unwrap();
        assert_eq!(label, "relevant");
        assert_eq!(rationale, "The abstract discusses trace decay.");
    }

    #[test]
    fn test_split_label_rationale_rejects_other_shapes() {
        assert!(split_label_rationale("relevant").is_none());
        assert!(split_label_rationale("a\n\nb\n\nc").is_none());
    }
}
