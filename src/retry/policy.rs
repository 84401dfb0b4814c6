use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use super::classify::{classify, AttemptResponse, RetryDecision, TransientFault};
use super::config::RetryConfig;
use super::context::CallContext;

/// Log target for retry notices, so the console can color them apart.
pub const RETRY_LOG_TARGET: &str = "quizbench::retry";

/// Response headers that carry a server side correlation id, in lookup order.
const REQUEST_ID_HEADERS: [&str; 3] = ["x-request-id", "apim-request-id", "x-ms-request-id"];

/// Retry policy driven by response status and `Retry-After` hints.
///
/// Stateless apart from the counter carried in the [`CallContext`], so a
/// single instance can wrap every outbound call of a batch.
#[derive(Clone, Debug, Default)]
pub struct RetryPolicy {
    cfg: RetryConfig,
}

impl RetryPolicy {
    pub fn new(cfg: RetryConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.cfg
    }

    /// Runs `op` until it yields a terminal outcome or the attempt budget is spent.
    ///
    /// The final outcome is returned unchanged; callers inspect the status
    /// themselves. Cancelling `ctx` cuts the current wait short and returns the
    /// last outcome without another attempt.
    pub async fn execute<F, Fut, R, E>(&self, ctx: &CallContext, mut op: F) -> Result<R, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, E>>,
        R: AttemptResponse,
        E: TransientFault + Display,
    {
        let max_attempts = self.cfg.attempts();
        let mut attempt = 1usize;
        loop {
            let outcome = op().await;
            if attempt >= max_attempts {
                if attempt > 1 {
                    log::debug!(
                        target: RETRY_LOG_TARGET,
                        "Giving up on request {} after {attempt} attempts ({})",
                        request_id(&outcome),
                        describe(&outcome)
                    );
                }
                return outcome;
            }
            let wait = match classify(&outcome, &self.cfg) {
                RetryDecision::Terminal => return outcome,
                RetryDecision::Retry { wait } => wait,
            };
            if ctx.is_cancelled() {
                return outcome;
            }
            self.log_retry(&outcome, attempt, max_attempts, wait);
            tokio::select! {
                _ = sleep(wait) => {}
                _ = ctx.cancel.cancelled() => {
                    log::debug!(target: RETRY_LOG_TARGET, "Retry wait cancelled for request {}", request_id(&outcome));
                    return outcome;
                }
            }
            ctx.retries.increment();
            attempt += 1;
        }
    }

    fn log_retry<R, E>(&self, outcome: &Result<R, E>, retry: usize, max_attempts: usize, wait: Duration)
    where
        R: AttemptResponse,
        E: Display,
    {
        log::warn!(
            target: RETRY_LOG_TARGET,
            "Retrying request {}: retry {retry} of {}, waiting {} ms ({})",
            request_id(outcome),
            max_attempts - 1,
            wait.as_millis(),
            describe(outcome)
        );
    }
}

fn request_id<R: AttemptResponse, E>(outcome: &Result<R, E>) -> String {
    let Ok(response) = outcome else {
        return "-".to_string();
    };
    REQUEST_ID_HEADERS
        .iter()
        .find_map(|name| response.headers().get(*name))
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

fn describe<R: AttemptResponse, E: Display>(outcome: &Result<R, E>) -> String {
    match outcome {
        Ok(response) => format!("status {}", response.status()),
        Err(fault) => format!("fault: {fault}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};
    use reqwest::StatusCode;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Debug, Clone)]
    struct StubResponse {
        status: StatusCode,
        headers: HeaderMap,
    }

    impl StubResponse {
        fn with_status(code: u16) -> Self {
            Self {
                status: StatusCode::from_u16(code).expect("status"),
                headers: HeaderMap::new(),
            }
        }

        fn header(mut self, name: &'static str, value: &str) -> Self {
            self.headers
                .insert(name, HeaderValue::from_str(value).expect("header"));
            self
        }
    }

    impl AttemptResponse for StubResponse {
        fn status(&self) -> StatusCode {
            self.status
        }

        fn headers(&self) -> &HeaderMap {
            &self.headers
        }
    }

    #[derive(Debug, Clone)]
    struct StubFault {
        transient: bool,
    }

    impl TransientFault for StubFault {
        fn is_transient(&self) -> bool {
            self.transient
        }
    }

    impl Display for StubFault {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "stub fault (transient: {})", self.transient)
        }
    }

    type Outcome = Result<StubResponse, StubFault>;

    /// Replays `script` in order, repeating the last entry once exhausted.
    struct Script {
        steps: Mutex<VecDeque<Outcome>>,
        calls: AtomicUsize,
    }

    impl Script {
        fn new(steps: Vec<Outcome>) -> Self {
            Self {
                steps: Mutex::new(steps.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn next(&self) -> Outcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut steps = self.steps.lock().expect("lock");
            if steps.len() > 1 {
                steps.pop_front().expect("step")
            } else {
                steps.front().cloned().expect("script must not be empty")
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_attempts,
            ..RetryConfig::defaults()
        })
    }

    async fn run(policy: &RetryPolicy, ctx: &CallContext, script: &Script) -> Outcome {
        policy
            .execute(ctx, || std::future::ready(script.next()))
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn server_errors_exhaust_the_budget() {
        for code in [500, 502, 503, 504, 408] {
            let ctx = CallContext::new();
            let script = Script::new(vec![Ok(StubResponse::with_status(code))]);
            let outcome = run(&policy(4), &ctx, &script).await;
            assert_eq!(outcome.expect("response").status.as_u16(), code);
            assert_eq!(script.calls(), 4);
            assert_eq!(ctx.retry_count(), 3);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_waits_for_hint_with_margin() {
        let ctx = CallContext::new();
        let script = Script::new(vec![
            Ok(StubResponse::with_status(429).header("retry-after", "2")),
            Ok(StubResponse::with_status(200)),
        ]);
        let started = Instant::now();
        let outcome = run(&policy(10), &ctx, &script).await;
        let waited = started.elapsed();

        assert_eq!(outcome.expect("response").status, StatusCode::OK);
        assert_eq!(script.calls(), 2);
        assert_eq!(ctx.retry_count(), 1);
        assert!(waited >= Duration::from_millis(2_100), "waited {waited:?}");
        assert!(waited < Duration::from_millis(2_150), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_without_hint_returns_immediately() {
        let ctx = CallContext::new();
        let script = Script::new(vec![Ok(StubResponse::with_status(429))]);
        let outcome = run(&policy(10), &ctx, &script).await;
        assert_eq!(
            outcome.expect("response").status,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(script.calls(), 1);
        assert_eq!(ctx.retry_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn success_is_not_retried() {
        let ctx = CallContext::new();
        let script = Script::new(vec![Ok(StubResponse::with_status(200))]);
        run(&policy(10), &ctx, &script).await.expect("response");
        assert_eq!(script.calls(), 1);
        assert_eq!(ctx.retry_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_fault_uses_fallback_delay() {
        let ctx = CallContext::new();
        let script = Script::new(vec![
            Err(StubFault { transient: true }),
            Ok(StubResponse::with_status(200)),
        ]);
        let started = Instant::now();
        let outcome = run(&policy(3), &ctx, &script).await;
        assert!(outcome.is_ok());
        assert_eq!(ctx.retry_count(), 1);
        assert!(started.elapsed() >= RetryConfig::defaults().fallback_delay);
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_fault_is_returned() {
        let ctx = CallContext::new();
        let script = Script::new(vec![Err(StubFault { transient: false })]);
        let outcome = run(&policy(3), &ctx, &script).await;
        assert!(outcome.is_err());
        assert_eq!(script.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_returns_last_fault() {
        let ctx = CallContext::new();
        let script = Script::new(vec![Err(StubFault { transient: true })]);
        let outcome = run(&policy(5), &ctx, &script).await;
        assert!(outcome.expect_err("fault").transient);
        assert_eq!(script.calls(), 5);
        assert_eq!(ctx.retry_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_further_attempts() {
        let ctx = CallContext::new();
        let script = Script::new(vec![Ok(StubResponse::with_status(503).header("retry-after", "60"))]);
        let cancel = ctx.cancel.clone();
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            cancel.cancel();
        });
        let started = Instant::now();
        let outcome = run(&policy(10), &ctx, &script).await;
        canceller.await.expect("join");

        assert_eq!(
            outcome.expect("response").status,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(script.calls(), 1);
        assert_eq!(ctx.retry_count(), 0);
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[test]
    fn request_id_prefers_first_known_header() {
        let response = StubResponse::with_status(429)
            .header("apim-request-id", "apim-1")
            .header("x-request-id", "req-1");
        let outcome: Outcome = Ok(response);
        assert_eq!(request_id(&outcome), "req-1");

        let fault: Outcome = Err(StubFault { transient: true });
        assert_eq!(request_id(&fault), "-");
    }
}
