use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The result of one conversation turn, as handed to the web UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub text: String,
    /// Only present when a delimiter was found and its payload parsed
    pub ui_json: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when the endpoint had to be retried
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl ResponseEnvelope {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            ui_json: None,
            error: None,
            notice: None,
        }
    }

    pub fn with_ui_json(mut self, ui_json: Value) -> Self {
        self.ui_json = Some(ui_json);
        self
    }

    pub fn with_error<S: Into<String>>(mut self, error: S) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_notice(mut self, notice: Option<String>) -> Self {
        self.notice = notice;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_serialization() {
        let envelope = ResponseEnvelope::text("Here you go");
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"text": "Here you go", "uiJson": null})
        );

        let envelope = ResponseEnvelope::text("oops").with_error("JSON Parse Error");
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"text": "oops", "uiJson": null, "error": "JSON Parse Error"})
        );
    }
}
