use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{error::QuizError, retry::CallContext};

/// A fully rendered request to the model: one system and one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Text produced by the model plus the server side creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub created: DateTime<Utc>,
}

/// Anything that can turn a [`Prompt`] into a [`Generation`].
///
/// Implementations are expected to route every physical attempt through a
/// retry policy using the counter and cancellation token in `ctx`.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Sends `prompt` and returns the first completion.
    ///
    /// # Arguments
    ///
    /// * `prompt` - System and user messages for one work item
    /// * `ctx` - Batch retry counter and cancellation token
    ///
    /// # Returns
    ///
    /// * `Result<Generation, QuizError>` - Trimmed text and creation time, or the
    ///   final failure once retries are exhausted or the batch is cancelled
    async fn generate(&self, prompt: &Prompt, ctx: &CallContext) -> Result<Generation, QuizError>;

    /// Short label used in result file names, e.g. `AzureOpenAI-gpt-4o`.
    fn label(&self) -> String {
        "model".to_string()
    }
}
