use super::payload::ComfyUIPrompt;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("failed to reach ComfyUI: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Clone, Debug)]
pub enum SubmitOutcome {
    Queued {
        prompt_id: Option<String>,
        response: Value,
    },
    /// ComfyUI answered with something other than 200, usually a
    /// validation error describing the offending node.
    Rejected { status: StatusCode, body: String },
}

impl SubmitOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }
}

pub struct PromptClient {
    client: Client,
    api_url: Url,
}

impl PromptClient {
    pub fn new(api_url: Url) -> Self {
        Self {
            client: Client::new(),
            api_url,
        }
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    #[tracing::instrument(skip_all, fields(seed = prompt.seed))]
    pub async fn queue_prompt(&self, prompt: &ComfyUIPrompt) -> Result<SubmitOutcome, SubmitError> {
        let response = self
            .client
            .post(self.api_url.clone())
            .json(&json!({ "prompt": &prompt.prompt }))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await?;
            tracing::warn!("error queuing workflow: {} - {}", status, body);
            return Ok(SubmitOutcome::Rejected { status, body });
        }

        let body = response.text().await?;
        let response_json = serde_json::from_str::<Value>(&body)
            .map_err(|e| SubmitError::InvalidResponse(format!("{} ({})", e, body)))?;

        let prompt_id = response_json
            .get("prompt_id")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string());

        tracing::info!("workflow queued successfully, response: {}", response_json);

        Ok(SubmitOutcome::Queued {
            prompt_id,
            response: response_json,
        })
    }
}
