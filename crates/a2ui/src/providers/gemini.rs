use reqwest::blocking::Client; // the conversation loop is synchronous, so is the client
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::base::{Completion, Provider};
use super::configs::GeminiProviderConfig;
use super::retry::{classify, Outcome, RetryPolicy, Sleeper, ThreadSleeper};
use super::utils::{
    gemini_response_to_message, get_usage, messages_to_gemini_spec, tools_to_gemini_spec,
};
use crate::errors::{AgentResult, ProviderError};
use crate::models::message::Message;
use crate::models::tool::Tool;

pub struct GeminiProvider {
    client: Client,
    config: GeminiProviderConfig,
    retry_policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl GeminiProvider {
    /// Fails with a configuration error when the key is missing, before any request
    pub fn new(config: GeminiProviderConfig) -> AgentResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        Ok(Self {
            client,
            config,
            retry_policy: RetryPolicy::default(),
            sleeper: Arc::new(ThreadSleeper),
        })
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// One attempt; transport failures that may clear up are reported as transient
    fn send(&self, payload: &Value) -> Result<Outcome, ProviderError> {
        let response = match self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(payload)
            .send()
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() || e.is_connect() => {
                return Ok(Outcome::Transient(e.to_string()))
            }
            Err(e) => return Err(ProviderError::Request(e.to_string())),
        };

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        let body = serde_json::from_str::<Value>(&text).ok();

        if body.is_none() && status.is_success() {
            return Err(ProviderError::InvalidResponse(text));
        }
        Ok(classify(status.as_u16(), body))
    }

    /// Post with retries, returning the parsed body and the number of retries used
    fn post(&self, payload: &Value) -> Result<(Value, u32), ProviderError> {
        let mut retries = 0;
        loop {
            match self.send(payload)? {
                Outcome::Success(body) => return Ok((body, retries)),
                Outcome::Fatal(message) => return Err(ProviderError::Upstream(message)),
                Outcome::Transient(message) => {
                    if retries >= self.retry_policy.max_retries {
                        return Err(ProviderError::RetriesExhausted { retries, message });
                    }
                    retries += 1;
                    let wait = self.retry_policy.delay_for(retries);
                    warn!(
                        "Gemini API overloaded ({}). Retrying in {}ms... (Attempt {})",
                        message,
                        wait.as_millis(),
                        retries
                    );
                    self.sleeper.sleep(wait);
                }
            }
        }
    }
}

impl Provider for GeminiProvider {
    fn complete(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
        temperature: Option<f64>,
    ) -> Result<Completion, ProviderError> {
        let mut payload = json!({
            "system_instruction": { "parts": [{ "text": system }] },
            "contents": messages_to_gemini_spec(messages),
        });

        if !tools.is_empty() {
            let declarations =
                tools_to_gemini_spec(tools).map_err(|e| ProviderError::Request(e.to_string()))?;
            payload["tools"] = json!([declarations]);
        }
        if let Some(temperature) = temperature {
            payload["generationConfig"] = json!({ "temperature": temperature });
        }

        debug!(
            "Requesting {} with {} message(s) and {} tool(s)",
            self.config.model,
            messages.len(),
            tools.len()
        );
        let (response, retries) = self.post(&payload)?;

        let message = gemini_response_to_message(&response)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(Completion::new(message, get_usage(&response), retries))
    }
}
