use thiserror::Error;

/// Failures surfaced by the model endpoint client.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Transient failures (5xx, 429, "overloaded") outlived the retry budget
    #[error("Gemini API Error after {retries} retries: {message}")]
    RetriesExhausted { retries: u32, message: String },

    /// The endpoint answered with an error that is not worth retrying
    #[error("Gemini API Error: {0}")]
    Upstream(String),

    #[error("Failed to parse JSON response: {0}")]
    InvalidResponse(String),

    #[error("Request failed: {0}")]
    Request(String),
}

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid toolset: {0}")]
    InvalidToolset(String),

    #[error("Model kept calling tools after {0} round(s)")]
    ToolLoopLimit(usize),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
