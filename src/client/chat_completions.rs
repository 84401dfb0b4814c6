use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::{
    error::QuizError,
    retry::{AttemptResponse, CallContext, RetryPolicy},
};

use super::endpoint::{Backend, EndpointConfig};
use super::types::{Generation, ModelClient, Prompt};

const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";
const AZURE_API_KEY_HEADER: &str = "api-key";

/// Chat-completions client whose every HTTP attempt runs through a [`RetryPolicy`].
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    endpoint: EndpointConfig,
    url: Url,
    policy: RetryPolicy,
}

/// A response read to the end inside one attempt.
///
/// Holding the body instead of the live `reqwest::Response` lets faults while
/// reading it count as attempt faults and frees the connection before any wait.
#[derive(Debug)]
struct BufferedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl AttemptResponse for BufferedResponse {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: [ChatRequestMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize, Debug)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ChatResponse {
    id: Option<String>,
    created: Option<i64>,
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl ChatCompletionsClient {
    /// Creates a client for `endpoint`.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Target deployment, credentials and request options
    /// * `policy` - Retry policy wrapped around every HTTP attempt
    ///
    /// # Returns
    ///
    /// * `Result<Self, QuizError>` - The client, `QuizError::Auth` for an empty
    ///   key, or `QuizError::InvalidRequest` for an unusable base URL
    ///
    /// The transport enforces `endpoint.timeout_seconds` per attempt.
    pub fn new(endpoint: EndpointConfig, policy: RetryPolicy) -> Result<Self, QuizError> {
        if endpoint.api_key.expose_secret().is_empty() {
            return Err(QuizError::Auth(format!(
                "Missing {} API key",
                endpoint.backend
            )));
        }
        let url = endpoint.completions_url()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(endpoint.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            url,
            policy,
        })
    }

    /// Endpoint settings this client was built with.
    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// Resolved chat-completions URL, including the Azure `api-version` query.
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn build_body<'a>(&'a self, prompt: &'a Prompt) -> ChatRequest<'a> {
        let model = match self.endpoint.backend {
            Backend::OpenAI => Some(self.endpoint.model.as_str()),
            Backend::AzureOpenAI => None,
        };
        ChatRequest {
            model,
            messages: [
                ChatRequestMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatRequestMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.endpoint.temperature,
            max_tokens: self.endpoint.max_tokens,
        }
    }

    fn request(&self, body: &ChatRequest<'_>, client_request_id: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .post(self.url.clone())
            .header(CLIENT_REQUEST_ID_HEADER, client_request_id)
            .json(body);
        let key = self.endpoint.api_key.expose_secret();
        match self.endpoint.backend {
            Backend::OpenAI => request.bearer_auth(key),
            Backend::AzureOpenAI => request.header(AZURE_API_KEY_HEADER, key),
        }
    }

    fn log_request_payload(&self, client_request_id: &str, body: &ChatRequest<'_>) {
        if !log::log_enabled!(log::Level::Trace) {
            return;
        }
        if let Ok(json) = serde_json::to_string(body) {
            log::trace!("chat request {client_request_id}: {json}");
        }
    }

    /// One attempt: sends the request and reads the whole body.
    async fn send_buffered(
        &self,
        body: &ChatRequest<'_>,
        client_request_id: &str,
    ) -> Result<BufferedResponse, reqwest::Error> {
        let response = self.request(body, client_request_id).send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok(BufferedResponse {
            status,
            headers,
            body,
        })
    }

    fn ensure_success_response(
        &self,
        response: BufferedResponse,
    ) -> Result<BufferedResponse, QuizError> {
        log::debug!("chat completions HTTP status: {}", response.status);
        if response.status.is_success() {
            return Ok(response);
        }
        Err(QuizError::Status {
            status: response.status,
            body: response.body,
        })
    }
}

#[async_trait]
impl ModelClient for ChatCompletionsClient {
    async fn generate(&self, prompt: &Prompt, ctx: &CallContext) -> Result<Generation, QuizError> {
        if ctx.is_cancelled() {
            return Err(QuizError::Cancelled);
        }
        let started = Utc::now();
        let body = self.build_body(prompt);
        let client_request_id = uuid::Uuid::new_v4().to_string();
        self.log_request_payload(&client_request_id, &body);

        let response = self
            .policy
            .execute(ctx, || self.send_buffered(&body, &client_request_id))
            .await?;
        let raw = self.ensure_success_response(response)?.body;
        let parsed: ChatResponse =
            serde_json::from_str(&raw).map_err(|e| QuizError::ResponseFormat {
                message: format!("Failed to decode chat completions response: {e}"),
                raw_response: raw.clone(),
            })?;
        log::debug!(
            "chat completion {} for client request {client_request_id}",
            parsed.id.as_deref().unwrap_or("-")
        );

        // Without a server timestamp the call start is the closest stand-in.
        let created = parsed
            .created
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .unwrap_or(started);
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();
        Ok(Generation {
            text: text.trim().to_string(),
            created,
        })
    }

    fn label(&self) -> String {
        self.endpoint.label()
    }
}
