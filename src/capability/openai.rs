//! OpenAI-compatible chat-completions client.
//!
//! Thin glue behind the capability trait: reads the file, sends the
//! policy text and source verbatim, and runs the response through the
//! validating parser. No retry and no per-call timeout; a stalled call
//! stalls the scan.

use super::{AnalysisCapability, AnalysisRequest, CapabilityError, parse_findings};
use crate::error::{AuditError, Result};
use crate::findings::Finding;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

const OUTPUT_CONTRACT: &str = "Respond with a JSON array only, no surrounding text: \
[{\"issue\": string, \"severity\": \"CRITICAL\" | \"WARNING\", \"explanation\": string, \
\"recommendation\": string (optional), \"line_hint\": integer (optional)}]. \
Return [] if the file has no security issues.";

pub struct OpenAiCapability {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl OpenAiCapability {
    pub fn new(api_key: String, model: String, endpoint: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key,
            model,
        }
    }

    /// Build a client from `OPENAI_API_KEY`, `AI_AUDIT_MODEL` and
    /// `AI_AUDIT_ENDPOINT`. A missing key is a configuration error.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AuditError::Config("OPENAI_API_KEY is not set".to_string()))?;
        let model = std::env::var("AI_AUDIT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let endpoint = std::env::var("AI_AUDIT_ENDPOINT").ok();
        Ok(Self::new(api_key, model, endpoint))
    }

    fn system_prompt(language: &str, instructions: &str) -> String {
        format!(
            "You are a security auditor reviewing a {language} source file.\n\n{instructions}\n\n{OUTPUT_CONTRACT}"
        )
    }
}

#[async_trait]
impl AnalysisCapability for OpenAiCapability {
    async fn analyze(
        &self,
        request: AnalysisRequest<'_>,
    ) -> std::result::Result<Vec<Finding>, CapabilityError> {
        let source_path = request.repo_root.join(request.file_path);
        let source = tokio::fs::read_to_string(&source_path)
            .await
            .map_err(|e| CapabilityError::FileRead {
                path: source_path.display().to_string(),
                source: e,
            })?;

        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: Self::system_prompt(request.language, request.instructions),
                },
                ChatMessage {
                    role: "user",
                    content: format!("File: {}\n\n```\n{}\n```", request.file_path, source),
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::MalformedResponse(e.to_string()))?;
        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| {
                CapabilityError::MalformedResponse("response carried no choices".to_string())
            })?;

        parse_findings(content, request.file_path)
    }
}
