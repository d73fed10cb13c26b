use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::{AgentError, AgentResult};
use crate::extract::{extract_payload, UI_JSON_DELIMITER};
use crate::models::envelope::ResponseEnvelope;
use crate::models::message::{conversation, HistoryTurn, Message, Part};
use crate::providers::base::Provider;
use crate::providers::retry::retry_notice;
use crate::toolbox::Toolbox;

/// Text of the envelope when the endpoint returns no candidates
pub const NO_RESPONSE: &str = "No response from AI.";

/// Per-agent knobs, fixed at construction
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub temperature: f64,
    /// Upper bound on function-call rounds within one turn
    pub max_tool_rounds: usize,
    /// Offer the tools again on follow-up requests so the model can chain calls
    pub resend_tools: bool,
    /// Marker separating the conversational reply from the UI payload
    pub delimiter: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::single_shot(0.1, UI_JSON_DELIMITER)
    }
}

impl AgentConfig {
    /// One tool round at most; the follow-up request carries no tools
    pub fn single_shot<S: Into<String>>(temperature: f64, delimiter: S) -> Self {
        Self {
            temperature,
            max_tool_rounds: 1,
            resend_tools: false,
            delimiter: delimiter.into(),
        }
    }

    /// Keep offering tools until the model answers with text, up to `max_tool_rounds`
    pub fn chained<S: Into<String>>(temperature: f64, delimiter: S, max_tool_rounds: usize) -> Self {
        Self {
            temperature,
            max_tool_rounds,
            resend_tools: true,
            delimiter: delimiter.into(),
        }
    }
}

/// Final text of a turn before payload extraction
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    /// `None` when the endpoint returned no candidates
    pub text: Option<String>,
    /// Retries spent across every request of the turn
    pub retries: u32,
}

/// Agent integrates the model endpoint with the tools it may call
pub struct Agent {
    provider: Arc<dyn Provider>,
    toolbox: Toolbox,
    system_prompt: String,
    config: AgentConfig,
}

impl Agent {
    pub fn new<S: Into<String>>(
        provider: Arc<dyn Provider>,
        toolbox: Toolbox,
        system_prompt: S,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            toolbox,
            system_prompt: system_prompt.into(),
            config,
        }
    }

    /// Run the request loop over `messages` until the model answers with text
    ///
    /// Each function call is dispatched synchronously, then the call and its result are
    /// appended to the history before the next request. Tool side effects are never
    /// rolled back, even when a later request fails.
    pub fn generate(&self, mut messages: Vec<Message>) -> AgentResult<Generation> {
        let mut retries = 0;
        let mut round = 0;

        loop {
            let offer_tools = round == 0
                || (self.config.resend_tools && round < self.config.max_tool_rounds);
            let tools = if offer_tools { self.toolbox.tools() } else { &[] };

            let completion = self.provider.complete(
                &self.system_prompt,
                &messages,
                tools,
                Some(self.config.temperature),
            )?;
            retries += completion.retries;

            let Some(message) = completion.message else {
                debug!("Endpoint returned no candidates");
                return Ok(Generation { text: None, retries });
            };

            let call = match message.first_part() {
                Some(Part::FunctionCall(call)) => call.clone(),
                Some(Part::Text(text)) => {
                    return Ok(Generation {
                        text: Some(text.clone()),
                        retries,
                    })
                }
                _ => {
                    return Ok(Generation {
                        text: Some(String::new()),
                        retries,
                    })
                }
            };

            if round >= self.config.max_tool_rounds {
                return Err(AgentError::ToolLoopLimit(self.config.max_tool_rounds));
            }

            info!("Calling tool: {}", call.name);
            let result = self.toolbox.dispatch(&call)?;

            messages.push(Message::model().with_part(Part::FunctionCall(call.clone())));
            messages.push(Message::tool_result().with_function_response(call.name, result));
            round += 1;
        }
    }

    /// Answer `user_message` in the context of `history` and cut the UI payload out
    /// of the final text
    pub fn reply(&self, user_message: &str, history: &[HistoryTurn]) -> AgentResult<ResponseEnvelope> {
        let generation = self.generate(conversation(history, user_message))?;

        let envelope = match generation.text {
            Some(text) => extract_payload(&text, &self.config.delimiter),
            None => ResponseEnvelope::text(NO_RESPONSE),
        };
        Ok(envelope.with_notice(retry_notice(generation.retries)))
    }
}
