use async_trait::async_trait;
use nestling_types::{AnalysisConfig, AnalysisError, AnalysisRequest, Credential};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::messages::{ChatRequest, ChatResponse};
use crate::prompt::build_messages;

/// Longest error body excerpt kept in an `Unknown` failure.
const ERROR_BODY_EXCERPT: usize = 200;

/// One network round trip per call, no retries, no side effects.
///
/// Implemented by [`CloudAnalysisClient`]; tests substitute fakes.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
        credential: &Credential,
    ) -> Result<String, AnalysisError>;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for ClientConfig {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: config.request_timeout(),
            max_tokens: Some(config.max_tokens),
            temperature: Some(config.temperature),
        }
    }
}

pub struct CloudAnalysisClient {
    client: Client,
    config: ClientConfig,
}

impl CloudAnalysisClient {
    pub fn new(config: ClientConfig) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AnalysisError::Unknown { message: format!("client build: {}", e) })?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn classify_transport(&self, err: &reqwest::Error) -> AnalysisError {
        if err.is_timeout() {
            AnalysisError::Timeout { duration_secs: self.config.timeout.as_secs() }
        } else if err.is_connect() || err.is_body() {
            AnalysisError::NetworkUnavailable { message: err.to_string() }
        } else if err.is_decode() {
            AnalysisError::MalformedResponse { message: err.to_string() }
        } else {
            AnalysisError::Unknown { message: err.to_string() }
        }
    }
}

fn classify_status(
    status: StatusCode,
    retry_after: Option<u64>,
    body: &str,
    timeout: Duration,
) -> AnalysisError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AnalysisError::AuthenticationFailed { message: format!("{}: {}", status, excerpt(body)) }
        },
        StatusCode::TOO_MANY_REQUESTS => {
            AnalysisError::RemoteRateLimitExceeded { retry_after_secs: retry_after }
        },
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            AnalysisError::Timeout { duration_secs: timeout.as_secs() }
        },
        _ => AnalysisError::Unknown { message: format!("{}: {}", status, excerpt(body)) },
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(ERROR_BODY_EXCERPT).collect()
}

#[async_trait]
impl AnalysisBackend for CloudAnalysisClient {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
        credential: &Credential,
    ) -> Result<String, AnalysisError> {
        let body = ChatRequest {
            model: self.config.model.clone(),
            messages: build_messages(request)?,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: false,
        };

        let resp = self
            .client
            .post(self.completions_url())
            .bearer_auth(credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify_transport(&e))?;

        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok());

        // Reading the body can still fail if the connection drops mid-response.
        let text = resp.text().await.map_err(|e| self.classify_transport(&e))?;

        if !status.is_success() {
            let err = classify_status(status, retry_after, &text, self.config.timeout);
            tracing::warn!(
                "Cloud analysis {} failed | Status: {} | Credential: {}",
                request.kind,
                status,
                credential
            );
            return Err(err);
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| AnalysisError::MalformedResponse { message: e.to_string() })?;

        let content = parsed.first_text().ok_or_else(|| AnalysisError::MalformedResponse {
            message: "response has no message content".to_string(),
        })?;

        tracing::debug!(
            "Cloud analysis {} succeeded | Model: {} | Tokens: {}",
            request.kind,
            parsed.model.as_deref().unwrap_or(&self.config.model),
            parsed.usage.as_ref().map(|u| u.total_tokens).unwrap_or(0)
        );

        Ok(content.to_string())
    }
}
