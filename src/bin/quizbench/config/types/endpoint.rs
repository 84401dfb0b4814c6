use quizbench::Backend;
use serde::{Deserialize, Serialize};

use super::{DEFAULT_SECRET_KEY, DEFAULT_TIMEOUT_SECONDS};

/// `[endpoint]` section. Unset values fall back to the secrets store or library defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointSection {
    pub backend: Backend,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub deployment: Option<String>,
    pub api_version: Option<String>,
    pub api_key: Option<String>,
    pub api_key_env: Option<String>,
    /// Key looked up in the user-secrets store when neither `api_key` nor the env var is set.
    pub secret_key: String,
    pub timeout_seconds: u64,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for EndpointSection {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            base_url: None,
            model: None,
            deployment: None,
            api_version: None,
            api_key: None,
            api_key_env: None,
            secret_key: DEFAULT_SECRET_KEY.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            temperature: None,
            max_tokens: None,
        }
    }
}

impl EndpointSection {
    pub fn api_key_env(&self) -> &str {
        match (&self.api_key_env, self.backend) {
            (Some(name), _) => name,
            (None, Backend::OpenAI) => "OPENAI_API_KEY",
            (None, Backend::AzureOpenAI) => "AZURE_OPENAI_API_KEY",
        }
    }
}
