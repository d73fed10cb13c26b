use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// The author of a message
pub enum Role {
    User,
    Model,
    /// Synthetic message carrying the result of a locally executed tool
    ToolResult,
}

impl Role {
    /// Role name used by the generateContent API
    pub fn as_gemini(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
            Role::ToolResult => "function",
        }
    }
}
