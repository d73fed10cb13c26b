use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::role::Role;
use super::tool::ToolCall;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub name: String,
    pub content: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Content passed inside a message: plain text or tool traffic
pub enum Part {
    Text(String),
    FunctionCall(ToolCall),
    FunctionResponse(ToolResponse),
}

impl Part {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_function_call(&self) -> Option<&ToolCall> {
        if let Part::FunctionCall(ref call) = self {
            Some(call)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A message to or from an LLM
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn user() -> Self {
        Message {
            role: Role::User,
            parts: Vec::new(),
        }
    }

    pub fn model() -> Self {
        Message {
            role: Role::Model,
            parts: Vec::new(),
        }
    }

    pub fn tool_result() -> Self {
        Message {
            role: Role::ToolResult,
            parts: Vec::new(),
        }
    }

    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    pub fn with_text<S: Into<String>>(self, text: S) -> Self {
        self.with_part(Part::Text(text.into()))
    }

    pub fn with_function_call<S: Into<String>>(self, name: S, args: Value) -> Self {
        self.with_part(Part::FunctionCall(ToolCall::new(name, args)))
    }

    pub fn with_function_response<S: Into<String>>(self, name: S, content: Value) -> Self {
        self.with_part(Part::FunctionResponse(ToolResponse {
            name: name.into(),
            content,
        }))
    }

    /// The part the conversation loop acts on; only the first one is consulted
    pub fn first_part(&self) -> Option<&Part> {
        self.parts.first()
    }

    /// Concatenated text of all text parts
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("")
    }
}

/// A prior chat turn supplied by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: String,
    #[serde(alias = "content")]
    pub text: String,
}

impl HistoryTurn {
    pub fn new<R: Into<String>, T: Into<String>>(role: R, text: T) -> Self {
        Self {
            role: role.into(),
            text: text.into(),
        }
    }
}

impl From<&HistoryTurn> for Message {
    fn from(turn: &HistoryTurn) -> Self {
        let message = if turn.role == "user" {
            Message::user()
        } else {
            Message::model()
        };
        message.with_text(&turn.text)
    }
}

/// Build the contents of a request: prior turns followed by the current user message
pub fn conversation(history: &[HistoryTurn], user_message: &str) -> Vec<Message> {
    let mut messages: Vec<Message> = history.iter().map(Message::from).collect();
    messages.push(Message::user().with_text(user_message));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_history_turn_accepts_content_alias() {
        let turn: HistoryTurn =
            serde_json::from_value(json!({"role": "model", "content": "Here are your files"}))
                .unwrap();
        assert_eq!(turn.text, "Here are your files");
    }

    #[test]
    fn test_conversation_maps_roles() {
        let history = vec![
            HistoryTurn::new("user", "hi"),
            HistoryTurn::new("assistant", "hello"),
        ];
        let messages = conversation(&history, "show me files in sample");

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Model);
        assert_eq!(messages[2].role, Role::User);
        assert_eq!(messages[2].text(), "show me files in sample");
    }

    #[test]
    fn test_first_part_function_call() {
        let message = Message::model()
            .with_function_call("list_files_in_folder", json!({"folderName": "sample"}))
            .with_text("ignored");
        let call = message.first_part().and_then(Part::as_function_call).unwrap();
        assert_eq!(call.name, "list_files_in_folder");
        assert_eq!(call.args["folderName"], "sample");
    }
}
