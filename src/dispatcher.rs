#[path = "dispatcher/types.rs"]
mod types;

#[path = "dispatcher/dispatcher.rs"]
#[allow(clippy::module_inception)]
mod dispatcher;

pub use dispatcher::{Dispatcher, ANSWER_LOG_TARGET, QUESTION_LOG_TARGET};
pub use types::{BatchReport, FailurePolicy, ItemFailure, QuestionBatch};
