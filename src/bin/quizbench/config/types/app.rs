use serde::{Deserialize, Serialize};

use super::{BatchConfig, EndpointSection, LoggingConfig, RetrySection};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: EndpointSection,
    pub retry: RetrySection,
    pub batch: BatchConfig,
    pub logging: LoggingConfig,
}
