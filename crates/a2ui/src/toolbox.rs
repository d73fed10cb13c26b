use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::{Tool, ToolCall};
use crate::providers::utils::is_valid_function_name;

/// Local implementation of a declared tool
pub type ToolHandler = Box<dyn Fn(&Value) -> anyhow::Result<Value> + Send + Sync>;

/// Declared tools and the handlers that execute them
///
/// Every declaration has exactly one handler and every handler is declared; this is
/// checked once at construction so dispatch can only fail for names the model made up.
pub struct Toolbox {
    tools: Vec<Tool>,
    handlers: HashMap<String, ToolHandler>,
}

impl fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toolbox")
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

impl Toolbox {
    pub fn new(tools: Vec<Tool>, mut handlers: HashMap<String, ToolHandler>) -> AgentResult<Self> {
        let mut seen = HashSet::new();
        for tool in &tools {
            if !is_valid_function_name(&tool.name) {
                return Err(AgentError::InvalidToolset(format!(
                    "invalid tool name '{}'",
                    tool.name
                )));
            }
            if !seen.insert(tool.name.as_str()) {
                return Err(AgentError::InvalidToolset(format!(
                    "tool '{}' is declared twice",
                    tool.name
                )));
            }
            if !handlers.contains_key(&tool.name) {
                return Err(AgentError::InvalidToolset(format!(
                    "tool '{}' has no handler",
                    tool.name
                )));
            }
        }

        let mut undeclared: Vec<&String> =
            handlers.keys().filter(|name| !seen.contains(name.as_str())).collect();
        if !undeclared.is_empty() {
            undeclared.sort();
            return Err(AgentError::InvalidToolset(format!(
                "handlers without a declaration: {:?}",
                undeclared
            )));
        }

        handlers.shrink_to_fit();
        Ok(Self { tools, handlers })
    }

    pub fn empty() -> Self {
        Self {
            tools: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute the handler matching `call`
    ///
    /// Unknown names fail with `UnknownTool`. Handler failures and missing required
    /// arguments do not fail the turn; they come back as `{"error": ...}` so the
    /// model can react to them.
    pub fn dispatch(&self, call: &ToolCall) -> AgentResult<Value> {
        let (tool, handler) = self
            .tools
            .iter()
            .find(|tool| tool.name == call.name)
            .and_then(|tool| self.handlers.get(&tool.name).map(|h| (tool, h)))
            .ok_or_else(|| AgentError::UnknownTool(call.name.clone()))?;

        if let Err(e) = check_required(tool, &call.args) {
            return Ok(json!({ "error": e.to_string() }));
        }

        match handler(&call.args) {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", call.name, e);
                Ok(json!({ "error": e.to_string() }))
            }
        }
    }
}

fn check_required(tool: &Tool, args: &Value) -> AgentResult<()> {
    let missing: Vec<&str> = tool
        .required_parameters()
        .into_iter()
        .filter(|name| args.get(name).map_or(true, Value::is_null))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AgentError::InvalidParameters(format!(
            "missing required parameter(s) {} for {}",
            missing.join(", "),
            tool.name
        )))
    }
}

/// Read a string argument, failing when it is absent
pub fn required_str<'a>(args: &'a Value, name: &str) -> anyhow::Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("Argument '{}' must be a string", name))
}

pub fn optional_str<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Accept either a list of strings or a single string as a one-element list
pub fn string_list(args: &Value, name: &str) -> Vec<String> {
    match args.get(name) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}
