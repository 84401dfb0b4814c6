mod app;
mod batch;
mod endpoint;
mod logging;
mod retry;

const DEFAULT_TIMEOUT_SECONDS: u64 = 200;
const DEFAULT_SECRET_KEY: &str = "AzureOpenAI:APIKey";
const DEFAULT_QUESTION_LIMIT: usize = 100;
const DEFAULT_LOG_ROTATE_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_LOG_ROTATE_KEEP: usize = 5;

pub use app::AppConfig;
pub use batch::BatchConfig;
pub use endpoint::EndpointSection;
pub use logging::LoggingConfig;
pub use retry::RetrySection;
