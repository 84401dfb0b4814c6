use anyhow::anyhow;
use quizbench::secret_store::SecretStore;
use quizbench::{Backend, EndpointConfig};

use crate::config::EndpointSection;

const AZURE_ENDPOINT_SECRET: &str = "AzureOpenAI:Endpoint";
const AZURE_DEPLOYMENT_SECRET: &str = "AzureOpenAI:ModelDeploymentName";

/// Builds the endpoint from config, `env` and the secrets store, in that order of precedence.
pub fn resolve_endpoint<E>(
    section: &EndpointSection,
    store: Option<&SecretStore>,
    env: E,
) -> anyhow::Result<EndpointConfig>
where
    E: Fn(&str) -> Option<String>,
{
    let api_key = resolve_api_key(section, store, &env).ok_or_else(|| {
        anyhow!(
            "no {} API key: set endpoint.api_key, ${} or '{}' in the secrets store",
            section.backend,
            section.api_key_env(),
            section.secret_key
        )
    })?;

    let mut endpoint = match section.backend {
        Backend::OpenAI => {
            let mut endpoint = EndpointConfig::openai(api_key);
            if let Some(base_url) = non_empty(section.base_url.as_ref()) {
                endpoint.base_url = base_url;
            }
            endpoint
        }
        Backend::AzureOpenAI => {
            let base_url = non_empty(section.base_url.as_ref())
                .or_else(|| from_store(store, AZURE_ENDPOINT_SECRET))
                .ok_or_else(|| anyhow!("endpoint.base_url is required for Azure OpenAI"))?;
            let deployment = non_empty(section.deployment.as_ref())
                .or_else(|| non_empty(section.model.as_ref()))
                .or_else(|| from_store(store, AZURE_DEPLOYMENT_SECRET))
                .ok_or_else(|| anyhow!("endpoint.deployment is required for Azure OpenAI"))?;
            EndpointConfig::azure(base_url, deployment, api_key)
        }
    };
    if let Some(model) = non_empty(section.model.as_ref()) {
        endpoint.model = model;
    }
    if let Some(api_version) = non_empty(section.api_version.as_ref()) {
        endpoint.api_version = api_version;
    }
    endpoint.timeout_seconds = section.timeout_seconds;
    endpoint.temperature = section.temperature;
    endpoint.max_tokens = section.max_tokens;
    Ok(endpoint)
}

fn resolve_api_key<E>(section: &EndpointSection, store: Option<&SecretStore>, env: &E) -> Option<String>
where
    E: Fn(&str) -> Option<String>,
{
    non_empty(section.api_key.as_ref())
        .or_else(|| env(section.api_key_env()).filter(|key| !key.trim().is_empty()))
        .or_else(|| from_store(store, &section.secret_key))
}

fn from_store(store: Option<&SecretStore>, key: &str) -> Option<String> {
    non_empty(store?.get(key))
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
