use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    client::ModelClient,
    error::QuizError,
    prompt::{answer_prompt, question_prompt},
    records::{GeneratedAnswer, GeneratedQuestion, SourceRecord},
    retry::CallContext,
};

use super::types::{BatchReport, FailurePolicy, ItemFailure, QuestionBatch};

/// Log target for question-stage progress.
pub const QUESTION_LOG_TARGET: &str = "quizbench::question";
/// Log target for answer-stage progress.
pub const ANSWER_LOG_TARGET: &str = "quizbench::answer";

/// Runs a batch of model calls with at most `concurrency` in flight.
///
/// Every run gets its own retry counter and a cancellation token derived
/// from the dispatcher's token, so runs never share statistics.
pub struct Dispatcher {
    client: Arc<dyn ModelClient>,
    concurrency: usize,
    failure_policy: FailurePolicy,
    cancel: CancellationToken,
}

impl Dispatcher {
    /// Creates a dispatcher sized to the available CPU parallelism.
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            concurrency: default_concurrency(),
            failure_policy: FailurePolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// One call at a time, in input order.
    pub fn sequential(client: Arc<dyn ModelClient>) -> Self {
        Self::new(client).concurrency(1)
    }

    /// Caps the number of in-flight calls. Zero is treated as one.
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Ties every run to `token`; cancelling it stops scheduling and cuts retry waits short.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency
    }

    /// Generates one question per record, preserving input order.
    ///
    /// The first failure cancels outstanding calls and is returned as
    /// [`QuizError::ItemFailed`]; no partial list is produced.
    pub async fn generate_questions(
        &self,
        records: Vec<SourceRecord>,
    ) -> Result<QuestionBatch, QuizError> {
        let ctx = CallContext::child_of(&self.cancel);
        let started = Instant::now();
        let total = records.len();
        log::info!(
            target: QUESTION_LOG_TARGET,
            "Generating questions for {total} records, {} in flight",
            self.concurrency
        );

        let calls = records.into_iter().map(|record| {
            let ctx = &ctx;
            async move {
                log::info!(
                    target: QUESTION_LOG_TARGET,
                    "Generating QUESTION for ID: {} - {}",
                    record.id,
                    record.title
                );
                let prompt = question_prompt(&record.title, &record.text);
                match self.client.generate(&prompt, ctx).await {
                    Ok(generation) => {
                        log::info!(
                            target: QUESTION_LOG_TARGET,
                            "QUESTION for ID: {} - {}",
                            record.id,
                            generation.text
                        );
                        Ok(GeneratedQuestion::from_source(record, generation.text))
                    }
                    Err(err) => Err(QuizError::ItemFailed {
                        id: record.id,
                        source: Box::new(err),
                    }),
                }
            }
        });

        let result = stream::iter(calls)
            .buffered(self.concurrency)
            .try_collect::<Vec<_>>()
            .await;

        match result {
            Ok(questions) => {
                let batch = QuestionBatch {
                    questions,
                    elapsed: started.elapsed(),
                    retries: ctx.retry_count(),
                };
                log::info!(
                    target: QUESTION_LOG_TARGET,
                    "Generated {} questions in {:.2}s with {} retries",
                    batch.questions.len(),
                    batch.elapsed.as_secs_f64(),
                    batch.retries
                );
                Ok(batch)
            }
            Err(err) => {
                ctx.cancel.cancel();
                log::error!(target: QUESTION_LOG_TARGET, "Question generation stopped: {err}");
                Err(self.cancelled_or(err))
            }
        }
    }

    /// Answers every question and aggregates per-item latency.
    ///
    /// Completion order is unspecified. Under [`FailurePolicy::Abort`] the
    /// first failure cancels the run and is returned; under
    /// [`FailurePolicy::Continue`] failures are collected in the report.
    pub async fn answer_questions(
        &self,
        questions: Vec<GeneratedQuestion>,
    ) -> Result<BatchReport, QuizError> {
        let ctx = CallContext::child_of(&self.cancel);
        let started = Instant::now();
        let attempted = questions.len();
        let (samples_tx, mut samples_rx) = mpsc::unbounded_channel::<f64>();
        log::info!(
            target: ANSWER_LOG_TARGET,
            "Answering {attempted} questions, {} in flight",
            self.concurrency
        );

        let calls = questions.into_iter().map(|question| {
            let ctx = &ctx;
            let samples_tx = samples_tx.clone();
            async move {
                match self.answer_one(&question, ctx).await {
                    Ok(answer) => {
                        let _ = samples_tx.send(answer.duration_until(Utc::now()));
                        Ok(())
                    }
                    Err(error) => Err(ItemFailure {
                        id: question.id,
                        error,
                    }),
                }
            }
        });
        let mut outcomes = stream::iter(calls).buffer_unordered(self.concurrency);

        let mut failures = Vec::new();
        while let Some(outcome) = outcomes.next().await {
            let Err(failure) = outcome else {
                continue;
            };
            log::error!(
                target: ANSWER_LOG_TARGET,
                "ANSWER for ID: {} failed: {}",
                failure.id,
                failure.error
            );
            if self.cancel.is_cancelled() {
                return Err(QuizError::Cancelled);
            }
            match self.failure_policy {
                FailurePolicy::Abort => {
                    ctx.cancel.cancel();
                    return Err(QuizError::ItemFailed {
                        id: failure.id,
                        source: Box::new(failure.error),
                    });
                }
                FailurePolicy::Continue => failures.push(failure),
            }
        }
        drop(outcomes);

        let mut samples = Vec::with_capacity(attempted);
        while let Ok(sample) = samples_rx.try_recv() {
            samples.push(sample);
        }

        let report = BatchReport {
            samples,
            failures,
            elapsed: started.elapsed(),
            retries: ctx.retry_count(),
            attempted,
        };
        log::info!(
            target: ANSWER_LOG_TARGET,
            "Answered {} of {} questions in {:.2}s with {} retries",
            report.succeeded(),
            report.attempted,
            report.elapsed.as_secs_f64(),
            report.retries
        );
        Ok(report)
    }

    async fn answer_one(
        &self,
        question: &GeneratedQuestion,
        ctx: &CallContext,
    ) -> Result<GeneratedAnswer, QuizError> {
        log::info!(
            target: QUESTION_LOG_TARGET,
            "Generating ANSWER for ID: {} - {}",
            question.id,
            question.question
        );
        let prompt = answer_prompt(&question.title, &question.text, &question.question);
        let generation = self.client.generate(&prompt, ctx).await?;
        log::info!(
            target: ANSWER_LOG_TARGET,
            "ANSWER for ID: {} - {}",
            question.id,
            generation.text
        );
        Ok(GeneratedAnswer {
            id: question.id.clone(),
            answer: generation.text,
            created: generation.created,
        })
    }

    fn cancelled_or(&self, err: QuizError) -> QuizError {
        if self.cancel.is_cancelled() {
            QuizError::Cancelled
        } else {
            err
        }
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
