use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;

use super::config::RetryConfig;

/// Azure OpenAI sends the throttling delay in milliseconds alongside `Retry-After`.
const RETRY_AFTER_MS: &str = "retry-after-ms";

/// What to do with a completed attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait for `wait`, then issue another attempt.
    Retry { wait: Duration },
    /// Hand the outcome back to the caller as-is.
    Terminal,
}

/// The parts of an HTTP response the retry policy looks at.
pub trait AttemptResponse {
    fn status(&self) -> StatusCode;
    fn headers(&self) -> &HeaderMap;
}

impl AttemptResponse for reqwest::Response {
    fn status(&self) -> StatusCode {
        reqwest::Response::status(self)
    }

    fn headers(&self) -> &HeaderMap {
        reqwest::Response::headers(self)
    }
}

/// A fault raised instead of a response.
pub trait TransientFault {
    /// Whether the fault is a network-level failure worth retrying.
    fn is_transient(&self) -> bool;
}

/// A body cut short by the peer surfaces from `Response::text` as a decode error.
impl TransientFault for reqwest::Error {
    fn is_transient(&self) -> bool {
        self.is_timeout()
            || self.is_connect()
            || self.is_request()
            || self.is_body()
            || self.is_decode()
    }
}

/// Classifies one attempt outcome.
///
/// Network faults are retried after the fallback delay since no header is
/// available; responses are handed to [`classify_response`].
pub fn classify<R, E>(outcome: &Result<R, E>, cfg: &RetryConfig) -> RetryDecision
where
    R: AttemptResponse,
    E: TransientFault,
{
    match outcome {
        Ok(response) => classify_response(response.status(), response.headers(), cfg),
        Err(fault) if fault.is_transient() => RetryDecision::Retry {
            wait: cfg.fallback_delay,
        },
        Err(_) => RetryDecision::Terminal,
    }
}

/// Classifies a response by status and delay hint.
///
/// 5xx, 408 and 404 are transient (the backing deployment can appear with a
/// lag). 429 is retried only when the server says how long to wait.
pub fn classify_response(status: StatusCode, headers: &HeaderMap, cfg: &RetryConfig) -> RetryDecision {
    let hint = retry_after(headers);
    if status == StatusCode::TOO_MANY_REQUESTS {
        return match hint {
            Some(hint) => RetryDecision::Retry {
                wait: cfg.with_margin(hint),
            },
            None => RetryDecision::Terminal,
        };
    }
    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::NOT_FOUND
    {
        let wait = hint
            .map(|hint| cfg.with_margin(hint))
            .unwrap_or(cfg.fallback_delay);
        return RetryDecision::Retry { wait };
    }
    RetryDecision::Terminal
}

/// Reads the server supplied delay, if any.
///
/// `retry-after-ms` wins over `Retry-After`. `Retry-After` may be
/// delta-seconds or an HTTP-date; dates in the past mean "now".
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    retry_after_at(headers, Utc::now())
}

fn retry_after_at(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    if let Some(ms) = header_str(headers, RETRY_AFTER_MS).and_then(parse_non_negative) {
        return Duration::try_from_secs_f64(ms / 1_000.0).ok();
    }
    let value = header_str(headers, RETRY_AFTER.as_str())?;
    if let Some(secs) = parse_non_negative(value) {
        return Duration::try_from_secs_f64(secs).ok();
    }
    let date = DateTime::parse_from_rfc2822(value).ok()?;
    Some(
        date.with_timezone(&Utc)
            .signed_duration_since(now)
            .to_std()
            .unwrap_or(Duration::ZERO),
    )
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok().map(str::trim)
}

fn parse_non_negative(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use rstest::rstest;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).expect("header value"));
        }
        map
    }

    #[rstest]
    #[case(500)]
    #[case(502)]
    #[case(503)]
    #[case(504)]
    #[case(408)]
    #[case(404)]
    fn transient_statuses_use_fallback_without_hint(#[case] code: u16) {
        let cfg = RetryConfig::defaults();
        let status = StatusCode::from_u16(code).expect("status");
        assert_eq!(
            classify_response(status, &HeaderMap::new(), &cfg),
            RetryDecision::Retry {
                wait: cfg.fallback_delay
            }
        );
    }

    #[rstest]
    #[case(200)]
    #[case(201)]
    #[case(400)]
    #[case(401)]
    #[case(403)]
    #[case(409)]
    fn other_statuses_are_terminal(#[case] code: u16) {
        let cfg = RetryConfig::defaults();
        let status = StatusCode::from_u16(code).expect("status");
        assert_eq!(
            classify_response(status, &headers(&[("retry-after", "3")]), &cfg),
            RetryDecision::Terminal
        );
    }

    #[test]
    fn throttled_with_hint_waits_hint_times_margin() {
        let cfg = RetryConfig::defaults();
        let decision = classify_response(
            StatusCode::TOO_MANY_REQUESTS,
            &headers(&[("retry-after", "2")]),
            &cfg,
        );
        let RetryDecision::Retry { wait } = decision else {
            panic!("expected retry, got {decision:?}");
        };
        assert!((wait.as_secs_f64() - 2.1).abs() < 1e-6);
    }

    #[test]
    fn throttled_without_hint_is_terminal() {
        let cfg = RetryConfig::defaults();
        assert_eq!(
            classify_response(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new(), &cfg),
            RetryDecision::Terminal
        );
    }

    #[test]
    fn server_error_honors_hint() {
        let cfg = RetryConfig {
            margin_factor: 1.1,
            ..RetryConfig::defaults()
        };
        let decision = classify_response(
            StatusCode::SERVICE_UNAVAILABLE,
            &headers(&[("retry-after", "10")]),
            &cfg,
        );
        assert_eq!(
            decision,
            RetryDecision::Retry {
                wait: Duration::from_secs(11)
            }
        );
    }

    #[test]
    fn millisecond_hint_takes_precedence() {
        let map = headers(&[("retry-after", "5"), ("retry-after-ms", "1500")]);
        assert_eq!(retry_after(&map), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn decimal_seconds_are_accepted() {
        let map = headers(&[("retry-after", "0.25")]);
        assert_eq!(retry_after(&map), Some(Duration::from_millis(250)));
    }

    #[test]
    fn http_date_becomes_delay() {
        let now = DateTime::parse_from_rfc2822("Sun, 06 Nov 1994 08:49:37 GMT")
            .expect("date")
            .with_timezone(&Utc);
        let map = headers(&[("retry-after", "Sun, 06 Nov 1994 08:49:40 GMT")]);
        assert_eq!(retry_after_at(&map, now), Some(Duration::from_secs(3)));
    }

    #[test]
    fn past_http_date_means_now() {
        let now = DateTime::parse_from_rfc2822("Sun, 06 Nov 1994 08:49:37 GMT")
            .expect("date")
            .with_timezone(&Utc);
        let map = headers(&[("retry-after", "Sun, 06 Nov 1994 08:00:00 GMT")]);
        assert_eq!(retry_after_at(&map, now), Some(Duration::ZERO));
    }

    #[rstest]
    #[case("soon")]
    #[case("-4")]
    #[case("")]
    fn unusable_hints_count_as_absent(#[case] value: &str) {
        assert_eq!(retry_after(&headers(&[("retry-after", value)])), None);
    }
}
