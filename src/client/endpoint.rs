use std::fmt;
use std::str::FromStr;

use reqwest::Url;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::QuizError;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1/";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_API_VERSION: &str = "2024-02-01";
/// Per-attempt transport timeout, independent of the retry budget.
const DEFAULT_TIMEOUT_SECONDS: u64 = 200;

/// Flavor of chat-completions endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Backend {
    #[serde(rename = "openai", alias = "OpenAI")]
    OpenAI,
    #[default]
    #[serde(rename = "azure_openai", alias = "AzureOpenAI", alias = "azure")]
    AzureOpenAI,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::OpenAI => write!(f, "OpenAI"),
            Backend::AzureOpenAI => write!(f, "AzureOpenAI"),
        }
    }
}

impl FromStr for Backend {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "openai" => Ok(Backend::OpenAI),
            "azureopenai" | "azure" => Ok(Backend::AzureOpenAI),
            other => Err(QuizError::InvalidRequest(format!(
                "unknown backend '{other}'"
            ))),
        }
    }
}

/// Everything needed to reach one model deployment.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub backend: Backend,
    /// Service root. For Azure this is the resource endpoint, for OpenAI the API base.
    pub base_url: String,
    pub model: String,
    /// Azure deployment name; falls back to `model`.
    pub deployment: Option<String>,
    pub api_version: String,
    pub api_key: SecretString,
    pub timeout_seconds: u64,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl EndpointConfig {
    /// OpenAI endpoint with default base URL, model and timeout.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Bearer token sent with every request
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            backend: Backend::OpenAI,
            base_url: OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            deployment: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            api_key: SecretString::new(api_key.into()),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Azure OpenAI endpoint for `deployment` on `endpoint`.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Resource URL, e.g. `https://my-resource.openai.azure.com`
    /// * `deployment` - Model deployment name; also used as the model label
    /// * `api_key` - Value of the `api-key` header
    pub fn azure(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let deployment = deployment.into();
        Self {
            backend: Backend::AzureOpenAI,
            base_url: endpoint.into(),
            model: deployment.clone(),
            deployment: Some(deployment),
            ..Self::openai(api_key)
        }
    }

    /// Azure deployment, or the model name when none is set.
    pub fn deployment_name(&self) -> &str {
        self.deployment.as_deref().unwrap_or(&self.model)
    }

    /// Full URL of the chat-completions operation.
    ///
    /// # Returns
    ///
    /// * `Result<Url, QuizError>` - `{base}/chat/completions` for OpenAI, or
    ///   `{base}/openai/deployments/{deployment}/chat/completions?api-version=..`
    ///   for Azure; `QuizError::InvalidRequest` for an empty or unparsable base
    pub fn completions_url(&self) -> Result<Url, QuizError> {
        let mut base = self.base_url.trim().to_string();
        if base.is_empty() {
            return Err(QuizError::InvalidRequest("missing endpoint base URL".into()));
        }
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|e| QuizError::InvalidRequest(e.to_string()))?;
        match self.backend {
            Backend::OpenAI => base
                .join("chat/completions")
                .map_err(|e| QuizError::InvalidRequest(e.to_string())),
            Backend::AzureOpenAI => {
                let path = format!(
                    "openai/deployments/{}/chat/completions",
                    self.deployment_name()
                );
                let mut url = base
                    .join(&path)
                    .map_err(|e| QuizError::InvalidRequest(e.to_string()))?;
                url.query_pairs_mut()
                    .append_pair("api-version", &self.api_version);
                Ok(url)
            }
        }
    }

    /// `Backend-deployment` label used in result file names.
    pub fn label(&self) -> String {
        format!("{}-{}", self.backend, self.deployment_name())
    }
}
