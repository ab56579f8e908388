//! HTTP access to the trivia API and the rate-limit retry loop.

use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::config::{Config, Difficulty};
use crate::error::FetchError;
use crate::question::{Question, QuestionSet};

pub const DEFAULT_API_URL: &str = "https://opentdb.com";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Query parameters for one batch of questions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriviaRequest {
    pub base_url: String,
    pub amount: usize,
    pub category: u32,
    pub difficulty: Difficulty,
    pub question_type: String,
}

impl Default for TriviaRequest {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            amount: 10,
            category: 18,
            difficulty: Difficulty::Medium,
            question_type: "multiple".to_string(),
        }
    }
}

impl From<&Config> for TriviaRequest {
    fn from(cfg: &Config) -> Self {
        Self {
            base_url: cfg.api_url.clone(),
            amount: cfg.amount,
            category: cfg.category,
            difficulty: cfg.difficulty,
            question_type: cfg.question_type.clone(),
        }
    }
}

impl TriviaRequest {
    pub fn url(&self) -> String {
        format!(
            "{}/api.php?amount={}&category={}&difficulty={}&type={}",
            self.base_url.trim_end_matches('/'),
            self.amount,
            self.category,
            self.difficulty,
            self.question_type
        )
    }
}

/// The parts of an HTTP reply the retry loop cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: StatusCode,
    pub retry_after: Option<String>,
    pub body: String,
}

impl HttpReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status,
            retry_after: None,
            body: String::new(),
        }
    }

    pub fn rate_limited(retry_after: Option<&str>) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            retry_after: retry_after.map(str::to_string),
            body: String::new(),
        }
    }
}

/// Issues a single GET; retries are the caller's business.
pub trait TriviaTransport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpReply, FetchError>;
}

/// Blocking reqwest transport, meant to run off the UI thread
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("quizr/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl TriviaTransport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpReply, FetchError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text()?;
        Ok(HttpReply {
            status,
            retry_after,
            body,
        })
    }
}

/// Test transport that replays a fixed script of replies and counts requests.
///
/// Once the script runs out the last reply is repeated.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<HttpReply>>,
    last: Mutex<Option<HttpReply>>,
    requests: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = HttpReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            last: Mutex::new(None),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl TriviaTransport for ScriptedTransport {
    fn get(&self, _url: &str) -> Result<HttpReply, FetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let next = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        match next {
            Some(reply) => {
                *last = Some(reply.clone());
                Ok(reply)
            }
            None => last.clone().ok_or(FetchError::NoResults),
        }
    }
}

/// Waits out a rate-limit delay
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Records requested delays without sleeping
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(delay);
        }
    }
}

/// Bounded retry for HTTP 429: at most `max_retries` retries after the first request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub default_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            default_delay: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    /// Delay from a `Retry-After` header in whole seconds, else the default
    pub fn delay_for(&self, retry_after: Option<&str>) -> Duration {
        retry_after
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(self.default_delay)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    response_code: u8,
    #[serde(default)]
    results: Vec<Question>,
}

/// Parses an API body into a non-empty question set
pub fn parse_body(body: &str) -> Result<QuestionSet, FetchError> {
    let parsed: ApiResponse = serde_json::from_str(body)?;
    if parsed.response_code != 0 {
        return Err(FetchError::Api(parsed.response_code));
    }
    if parsed.results.is_empty() {
        return Err(FetchError::NoResults);
    }
    Ok(QuestionSet::new(parsed.results))
}

/// Fetches question batches, retrying on rate limits.
///
/// Cheap to clone so a copy can be moved onto a worker thread.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn TriviaTransport>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    request: TriviaRequest,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("policy", &self.policy)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    pub fn new(
        transport: Arc<dyn TriviaTransport>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
        request: TriviaRequest,
    ) -> Self {
        Self {
            transport,
            sleeper,
            policy,
            request,
        }
    }

    pub fn request(&self) -> &TriviaRequest {
        &self.request
    }

    pub fn fetch(&self) -> Result<QuestionSet, FetchError> {
        let url = self.request.url();
        let mut retries = 0u32;
        loop {
            tracing::debug!(%url, retries, "requesting questions");
            let reply = self.transport.get(&url)?;

            if reply.status == StatusCode::TOO_MANY_REQUESTS {
                if retries >= self.policy.max_retries {
                    tracing::warn!(attempts = retries + 1, "giving up after repeated rate limiting");
                    return Err(FetchError::RateLimited {
                        attempts: retries + 1,
                    });
                }
                let delay = self.policy.delay_for(reply.retry_after.as_deref());
                tracing::info!(delay_secs = delay.as_secs(), retries, "rate limited, backing off");
                self.sleeper.sleep(delay);
                retries += 1;
                continue;
            }

            if !reply.status.is_success() {
                return Err(FetchError::Status(reply.status));
            }

            let set = parse_body(&reply.body)?;
            tracing::info!(questions = set.len(), retries, "fetched questions");
            return Ok(set);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const BODY: &str = r#"{
        "response_code": 0,
        "results": [
            {"question": "2+2?", "correct_answer": "4", "incorrect_answers": ["3", "5", "6"]}
        ]
    }"#;

    fn fetcher(transport: Arc<ScriptedTransport>, sleeper: Arc<RecordingSleeper>) -> Fetcher {
        Fetcher::new(
            transport,
            sleeper,
            RetryPolicy::default(),
            TriviaRequest::default(),
        )
    }

    #[test]
    fn default_request_url() {
        assert_eq!(
            TriviaRequest::default().url(),
            "https://opentdb.com/api.php?amount=10&category=18&difficulty=medium&type=multiple"
        );
    }

    #[test]
    fn url_trims_trailing_slash() {
        let request = TriviaRequest {
            base_url: "http://localhost:8080/".into(),
            difficulty: Difficulty::Hard,
            ..TriviaRequest::default()
        };
        assert!(request.url().starts_with("http://localhost:8080/api.php?"));
        assert!(request.url().contains("difficulty=hard"));
    }

    #[test]
    fn retry_after_parsing() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(Some("7")), Duration::from_secs(7));
        assert_eq!(policy.delay_for(Some(" 1 ")), Duration::from_secs(1));
        assert_eq!(policy.delay_for(None), Duration::from_secs(3));
        assert_eq!(
            policy.delay_for(Some("Wed, 21 Oct 2015 07:28:00 GMT")),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn parse_body_accepts_missing_response_code() {
        let set = parse_body(
            r#"{"results": [{"question": "q", "correct_answer": "a", "incorrect_answers": []}]}"#,
        )
        .unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn parse_body_rejects_api_error_and_empty_results() {
        assert_matches!(
            parse_body(r#"{"response_code": 5, "results": []}"#),
            Err(FetchError::Api(5))
        );
        assert_matches!(
            parse_body(r#"{"response_code": 0, "results": []}"#),
            Err(FetchError::NoResults)
        );
        assert_matches!(parse_body("<html>"), Err(FetchError::Decode(_)));
    }

    #[test]
    fn success_on_first_try() {
        let transport = Arc::new(ScriptedTransport::new([HttpReply::ok(BODY)]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let set = fetcher(transport.clone(), sleeper.clone()).fetch().unwrap();
        assert_eq!(set.get(0).unwrap().correct_answer, "4");
        assert_eq!(transport.requests(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[test]
    fn retries_rate_limit_with_header_delay() {
        let transport = Arc::new(ScriptedTransport::new([
            HttpReply::rate_limited(Some("2")),
            HttpReply::rate_limited(None),
            HttpReply::ok(BODY),
        ]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let set = fetcher(transport.clone(), sleeper.clone()).fetch().unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(transport.requests(), 3);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_secs(2), Duration::from_secs(3)]
        );
    }

    #[test]
    fn stops_after_five_retries() {
        let transport = Arc::new(ScriptedTransport::new([HttpReply::rate_limited(Some("1"))]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let result = fetcher(transport.clone(), sleeper.clone()).fetch();
        assert_matches!(result, Err(FetchError::RateLimited { attempts: 6 }));
        // initial request plus five retries, no sixth retry
        assert_eq!(transport.requests(), 6);
        assert_eq!(sleeper.delays().len(), 5);
    }

    #[test]
    fn fifth_retry_can_still_succeed() {
        let mut replies = vec![HttpReply::rate_limited(None); 5];
        replies.push(HttpReply::ok(BODY));
        let transport = Arc::new(ScriptedTransport::new(replies));
        let sleeper = Arc::new(RecordingSleeper::new());
        assert!(fetcher(transport.clone(), sleeper).fetch().is_ok());
        assert_eq!(transport.requests(), 6);
    }

    #[test]
    fn other_statuses_are_not_retried() {
        let transport = Arc::new(ScriptedTransport::new([HttpReply::with_status(
            StatusCode::INTERNAL_SERVER_ERROR,
        )]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let result = fetcher(transport.clone(), sleeper.clone()).fetch();
        assert_matches!(result, Err(FetchError::Status(StatusCode::INTERNAL_SERVER_ERROR)));
        assert_eq!(transport.requests(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[test]
    fn malformed_body_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new([HttpReply::ok("not json")]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let result = fetcher(transport.clone(), sleeper).fetch();
        assert_matches!(result, Err(FetchError::Decode(_)));
        assert_eq!(transport.requests(), 1);
    }

    #[test]
    fn scripted_transport_survives_poisoned_lock() {
        let transport = Arc::new(ScriptedTransport::new([HttpReply::ok(BODY)]));
        let holder = transport.clone();
        let poisoned = std::thread::spawn(move || {
            let _guard = holder.replies.lock().unwrap();
            panic!("panic while holding the script");
        })
        .join();
        assert!(poisoned.is_err());
        assert!(transport.replies.is_poisoned());

        let reply = transport.get("http://localhost/api.php").unwrap();
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(transport.requests(), 1);
    }
}
