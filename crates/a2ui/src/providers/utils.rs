use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};

use crate::models::message::{Message, Part};
use crate::models::role::Role;
use crate::models::tool::{Tool, ToolCall};

use super::base::Usage;

lazy_static! {
    static ref FUNCTION_NAME: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

pub fn is_valid_function_name(name: &str) -> bool {
    FUNCTION_NAME.is_match(name)
}

/// Convert internal Message format to the generateContent `contents` array
pub fn messages_to_gemini_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            let parts: Vec<Value> = message
                .parts
                .iter()
                .map(|part| match part {
                    Part::Text(text) => json!({ "text": text }),
                    Part::FunctionCall(call) => {
                        let mut part = json!({
                            "functionCall": {
                                "name": call.name,
                                "args": call.args,
                            }
                        });
                        if let Some(signature) = &call.thought_signature {
                            part["thoughtSignature"] = json!(signature);
                        }
                        part
                    }
                    Part::FunctionResponse(response) => json!({
                        "functionResponse": {
                            "name": response.name,
                            "response": {
                                "name": response.name,
                                "content": response.content,
                            }
                        }
                    }),
                })
                .collect();

            json!({
                "role": message.role.as_gemini(),
                "parts": parts,
            })
        })
        .collect()
}

/// Convert internal Tool format to a generateContent `tools` entry
pub fn tools_to_gemini_spec(tools: &[Tool]) -> Result<Value> {
    let mut tool_names = std::collections::HashSet::new();
    let mut declarations = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }
        if !is_valid_function_name(&tool.name) {
            return Err(anyhow!(
                "Invalid tool name '{}', it must match [a-zA-Z0-9_-]+",
                tool.name
            ));
        }

        declarations.push(json!({
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }));
    }

    Ok(json!({ "function_declarations": declarations }))
}

/// Convert a generateContent response to internal Message format
///
/// Returns `Ok(None)` when the response has no candidates. Thought parts, and parts
/// that are neither text nor a function call, are skipped, so the message's first
/// part is the first answer or call the model produced.
pub fn gemini_response_to_message(response: &Value) -> Result<Option<Message>> {
    let Some(candidate) = response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
    else {
        return Ok(None);
    };

    let parts = candidate["content"]["parts"]
        .as_array()
        .cloned()
        .unwrap_or_default();

    let mut message = Message {
        role: Role::Model,
        parts: Vec::new(),
    };

    for part in parts {
        if part.get("thought").and_then(Value::as_bool) == Some(true) {
            continue;
        }
        if let Some(call) = part.get("functionCall") {
            let name = call
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow!("Function call without a name: {}", call))?;
            let args = call.get("args").cloned().unwrap_or_else(|| json!({}));
            let mut call = ToolCall::new(name, args);
            if let Some(signature) = part.get("thoughtSignature").and_then(Value::as_str) {
                call = call.with_thought_signature(signature);
            }
            message = message.with_part(Part::FunctionCall(call));
        } else if let Some(text) = part.get("text").and_then(Value::as_str) {
            message = message.with_text(text);
        }
    }

    Ok(Some(message))
}

pub fn get_usage(data: &Value) -> Usage {
    let Some(usage) = data.get("usageMetadata") else {
        return Usage::default();
    };

    let input_tokens = usage
        .get("promptTokenCount")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let output_tokens = usage
        .get("candidatesTokenCount")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let total_tokens = usage
        .get("totalTokenCount")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32)
        .or_else(|| match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            _ => None,
        });

    Usage::new(input_tokens, output_tokens, total_tokens)
}
