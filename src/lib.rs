//! Quiz question generation and answering against a chat-completions endpoint.
//!
//! The crate is built around two pieces:
//!
//! * [`retry`]: a status-aware retry policy that honors server supplied
//!   `Retry-After` hints and counts every retried attempt.
//! * [`dispatcher`]: a bounded-parallel dispatcher that fans work items out
//!   to a [`client::ModelClient`] and aggregates latency statistics.
//!
//! Records are loaded and persisted through [`records`].

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod prompt;
pub mod records;
pub mod retry;
pub mod secret_store;

pub use client::{Backend, ChatCompletionsClient, EndpointConfig, Generation, ModelClient, Prompt};
pub use dispatcher::{BatchReport, Dispatcher, FailurePolicy, ItemFailure, QuestionBatch};
pub use error::QuizError;
pub use records::{GeneratedAnswer, GeneratedQuestion, SourceRecord};
pub use retry::{CallContext, RetryConfig, RetryCounter, RetryDecision, RetryPolicy};
