//! The sample applications served by the server and the CLI
//!
//! Every sample is an [`App`]: it takes the user's message plus the prior turns and
//! produces a [`Reply`]. Most samples are a plain [`Agent`] with their own tools and
//! prompt; the hub routes between other apps and the quiz has its own flow.

pub mod budget;
pub mod drive;
pub mod events;
pub mod hub;
pub mod quiz;
pub mod restaurant;

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::agent::Agent;
use crate::errors::AgentResult;
use crate::models::envelope::ResponseEnvelope;
use crate::models::message::HistoryTurn;
use crate::providers::base::Provider;
use crate::stores::Stores;
use crate::toolbox::ToolHandler;

pub use quiz::{QuizReply, QuizSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Sample {
    Drive,
    Budget,
    Restaurant,
    Events,
    Quiz,
    Hub,
}

impl Sample {
    /// Page title shown by the web UI
    pub fn title(&self) -> &'static str {
        match self {
            Sample::Drive => "Drive Task Agent",
            Sample::Budget => "A2UI Smart Budget",
            Sample::Restaurant => "A2UI Restaurant Finder",
            Sample::Events => "A2UI Event Finder",
            Sample::Quiz => "AI Quiz Learning Agent",
            Sample::Hub => "A2UI App Hub",
        }
    }
}

/// What a sample hands back to the UI for one turn
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Envelope(ResponseEnvelope),
    Quiz(QuizReply),
    Summary(QuizSummary),
}

impl Reply {
    /// Conversational text, when the reply carries any
    pub fn text(&self) -> Option<&str> {
        match self {
            Reply::Envelope(envelope) => Some(&envelope.text),
            Reply::Quiz(quiz) => Some(&quiz.text),
            Reply::Summary(summary) => summary.text.as_deref(),
        }
    }

    /// The structured part of the reply, if any
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Reply::Envelope(envelope) => envelope.ui_json.as_ref(),
            Reply::Quiz(quiz) => quiz.quiz_data.as_ref(),
            Reply::Summary(summary) => summary.quiz_summary.as_ref(),
        }
    }
}

impl From<ResponseEnvelope> for Reply {
    fn from(envelope: ResponseEnvelope) -> Self {
        Reply::Envelope(envelope)
    }
}

/// A sample application
pub trait App: Send + Sync {
    fn process(&self, user_message: &str, history: &[HistoryTurn]) -> AgentResult<Reply>;
}

impl App for Agent {
    fn process(&self, user_message: &str, history: &[HistoryTurn]) -> AgentResult<Reply> {
        self.reply(user_message, history).map(Reply::from)
    }
}

/// Knobs shared by the samples
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOptions {
    /// Bound on chained tool calls for the samples that chain
    pub max_tool_rounds: usize,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self { max_tool_rounds: 5 }
    }
}

pub fn build_app(
    sample: Sample,
    provider: Arc<dyn Provider>,
    stores: &Stores,
    options: &SampleOptions,
) -> AgentResult<Box<dyn App>> {
    match sample {
        Sample::Drive => Ok(Box::new(drive::agent(provider, stores, options)?)),
        Sample::Budget => Ok(Box::new(budget::agent(provider, stores)?)),
        Sample::Restaurant => Ok(Box::new(restaurant::agent(provider, stores)?)),
        Sample::Events => Ok(Box::new(events::agent(provider, stores)?)),
        Sample::Quiz => Ok(Box::new(quiz::QuizApp::new(provider, stores)?)),
        Sample::Hub => Ok(Box::new(hub::Hub::new(provider, stores)?)),
    }
}

/// Collects the handlers of a sample's tools
#[derive(Default)]
pub(crate) struct Handlers(HashMap<String, ToolHandler>);

impl Handlers {
    pub(crate) fn with<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.0.insert(name.to_string(), Box::new(handler));
        self
    }

    pub(crate) fn into_inner(self) -> HashMap<String, ToolHandler> {
        self.0
    }
}

/// Context for the prompt templates that describe a UI payload
#[derive(Debug, Serialize)]
pub(crate) struct UiPromptContext<'a> {
    pub delimiter: &'a str,
    pub schema: String,
    pub today: String,
}

impl<'a> UiPromptContext<'a> {
    pub(crate) fn new(delimiter: &'a str) -> AgentResult<Self> {
        let schema = crate::prompt_template::a2ui_schema()
            .map_err(|e| crate::errors::AgentError::Internal(e.to_string()))?;
        Ok(Self {
            delimiter,
            schema,
            today: chrono::Utc::now().format("%Y-%m-%d").to_string(),
        })
    }
}

/// A JSON number, written as an integer when it has no fractional part
pub(crate) fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}
