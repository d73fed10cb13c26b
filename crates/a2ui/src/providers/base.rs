use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::models::message::Message;
use crate::models::tool::Tool;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// One successful round trip to the model endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Content of the first candidate, `None` when the endpoint returned no candidates
    pub message: Option<Message>,
    pub usage: Usage,
    /// How many times the request had to be retried before it succeeded
    pub retries: u32,
}

impl Completion {
    pub fn new(message: Option<Message>, usage: Usage, retries: u32) -> Self {
        Self {
            message,
            usage,
            retries,
        }
    }
}

/// Base trait for model endpoints
///
/// Calls are synchronous: the conversation loop issues at most one request at a time.
pub trait Provider: Send + Sync {
    /// Generate the next message from the system instruction, the history and the
    /// tools offered for this request (empty to offer none)
    fn complete(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
        temperature: Option<f64>,
    ) -> Result<Completion, ProviderError>;
}
