use std::collections::VecDeque;
use std::sync::Mutex;

use crate::errors::ProviderError;
use crate::models::message::Message;
use crate::models::tool::Tool;
use crate::providers::base::{Completion, Provider, Usage};

/// A request as seen by the mock provider
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub system: String,
    pub messages: Vec<Message>,
    pub tools: Vec<Tool>,
    pub temperature: Option<f64>,
}

/// A mock provider that returns pre-configured responses for testing
pub struct MockProvider {
    responses: Mutex<VecDeque<Result<Completion, ProviderError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of model messages
    pub fn new(responses: Vec<Message>) -> Self {
        Self::with_results(
            responses
                .into_iter()
                .map(|message| Ok(Completion::new(Some(message), Usage::default(), 0)))
                .collect(),
        )
    }

    pub fn with_results(results: Vec<Result<Completion, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(results.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Provider for MockProvider {
    fn complete(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
        temperature: Option<f64>,
    ) -> Result<Completion, ProviderError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            system: system.to_string(),
            messages: messages.to_vec(),
            tools: tools.to_vec(),
            temperature,
        });

        // Return an empty reply once the script runs out
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(Completion::new(
                    Some(Message::model().with_text("")),
                    Usage::default(),
                    0,
                ))
            })
    }
}
