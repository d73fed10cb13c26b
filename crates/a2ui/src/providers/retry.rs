//! Retry policy for the model endpoint
//!
//! Transient failures (HTTP 5xx, HTTP 429, or an error body mentioning "overloaded")
//! are retried with exponential backoff. The wait before retry number `n` (1-based)
//! is `initial_delay_ms * exponential_base^n`, so the default policy waits 2s, 4s
//! and 8s before giving up after the fourth attempt.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (not including the initial attempt)
    pub max_retries: u32,

    /// Delay unit the exponential factor is applied to (milliseconds)
    pub initial_delay_ms: u64,

    /// Base for exponential backoff
    pub exponential_base: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            exponential_base: 2,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Create a policy with no retries
    pub fn no_retry() -> Self {
        Self::new(0)
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.exponential_base.saturating_pow(attempt);
        Duration::from_millis(self.initial_delay_ms.saturating_mul(factor))
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// How a single response from the endpoint should be treated
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    /// Worth another attempt; carries the message to report if retries run out
    Transient(String),
    /// Not worth retrying
    Fatal(String),
}

pub const SERVICE_UNAVAILABLE: &str = "Service Unavailable";

fn error_message(body: Option<&Value>) -> Option<String> {
    body?
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/// Classify an HTTP response by status code and parsed body (`None` when the body
/// was not JSON)
pub fn classify(status: u16, body: Option<Value>) -> Outcome {
    let message = error_message(body.as_ref());

    if status >= 500 || status == 429 {
        return Outcome::Transient(message.unwrap_or_else(|| SERVICE_UNAVAILABLE.to_string()));
    }
    if let Some(message) = &message {
        if message.contains("overloaded") {
            return Outcome::Transient(message.clone());
        }
    }

    match body {
        Some(body) if body.get("error").is_some() => Outcome::Fatal(
            message.unwrap_or_else(|| body["error"].to_string()),
        ),
        Some(body) if (200..300).contains(&status) => Outcome::Success(body),
        Some(_) => Outcome::Fatal(format!("Request failed with status {}", status)),
        None => Outcome::Fatal(format!("Response with status {} was not JSON", status)),
    }
}

/// User-facing note about retries that happened while producing a reply
pub fn retry_notice(retries: u32) -> Option<String> {
    (retries > 0).then(|| {
        format!(
            "Automatically retried {} time(s) due to API overload.",
            retries
        )
    })
}

/// Blocks the calling thread between attempts
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Records requested delays instead of sleeping, for simulated time
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.slept.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn total(&self) -> Duration {
        self.delays().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        if let Ok(mut slept) = self.slept.lock() {
            slept.push(duration);
        }
    }
}
