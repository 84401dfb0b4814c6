#[path = "retry/config.rs"]
mod config;

#[path = "retry/classify.rs"]
mod classify;

#[path = "retry/context.rs"]
mod context;

#[path = "retry/policy.rs"]
mod policy;

pub use classify::{classify, classify_response, retry_after, AttemptResponse, RetryDecision, TransientFault};
pub use config::RetryConfig;
pub use context::{CallContext, RetryCounter};
pub use policy::{RetryPolicy, RETRY_LOG_TARGET};
