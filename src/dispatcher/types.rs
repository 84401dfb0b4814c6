use std::time::Duration;

use crate::{error::QuizError, records::GeneratedQuestion};

/// What the dispatcher does when one work item ends in failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop scheduling, cancel in-flight work and return the first failure.
    #[default]
    Abort,
    /// Record the failure and keep going.
    Continue,
}

/// A work item that did not produce a result.
#[derive(Debug)]
pub struct ItemFailure {
    pub id: String,
    pub error: QuizError,
}

/// Outcome of a question-generation run, in input order.
#[derive(Debug)]
pub struct QuestionBatch {
    pub questions: Vec<GeneratedQuestion>,
    /// Wall-clock time for the whole run, retry waits included.
    pub elapsed: Duration,
    pub retries: u64,
}

/// Aggregate statistics of an answer run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Seconds between server side creation and client side completion, one per success.
    pub samples: Vec<f64>,
    pub failures: Vec<ItemFailure>,
    /// Wall-clock time for the whole run, retry waits included.
    pub elapsed: Duration,
    /// Retried attempts across every item of the run.
    pub retries: u64,
    /// Number of work items scheduled.
    pub attempted: usize,
}

impl BatchReport {
    pub fn total(&self) -> f64 {
        self.samples.iter().sum()
    }

    /// Mean sample; `None` when nothing succeeded.
    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            None
        } else {
            Some(self.total() / self.samples.len() as f64)
        }
    }

    pub fn succeeded(&self) -> usize {
        self.samples.len()
    }
}
