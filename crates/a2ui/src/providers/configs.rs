use anyhow::Result;
use std::env;

use crate::errors::{AgentError, AgentResult};

pub const GEMINI_HOST: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_MODEL: &str = "gemini-3-flash-preview";

/// Values that ship in sample configuration files instead of a real key
const API_KEY_PLACEHOLDERS: [&str; 4] = ["###", "YOUR_API_KEY_HERE", "{Your API key}", "changeme"];

pub trait ProviderConfig {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self>
    where
        Self: Sized;

    /// Helper function to get environment variables with error handling
    fn get_env(key: &str, required: bool, default: Option<String>) -> Result<Option<String>> {
        match env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) if !required => Ok(default),
            Err(env::VarError::NotPresent) => Err(anyhow::anyhow!(
                "Environment variable '{}' is required but not set.",
                key
            )),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeminiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
}

impl GeminiProviderConfig {
    pub fn new<H, K, M>(host: H, api_key: K, model: M) -> Self
    where
        H: Into<String>,
        K: Into<String>,
        M: Into<String>,
    {
        Self {
            host: host.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Reject a missing or placeholder key before any request goes out
    pub fn validate(&self) -> AgentResult<()> {
        let key = self.api_key.trim();
        if key.is_empty() || API_KEY_PLACEHOLDERS.contains(&key) {
            return Err(AgentError::Configuration("API Key is not set.".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(AgentError::Configuration("Model name is not set.".to_string()));
        }
        Ok(())
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.host.trim_end_matches('/'),
            self.model
        )
    }
}

impl ProviderConfig for GeminiProviderConfig {
    fn from_env() -> Result<Self> {
        let api_key = Self::get_env("GEMINI_API_KEY", true, None)?
            .ok_or_else(|| anyhow::anyhow!("Gemini API key should be present"))?;

        let host = Self::get_env("GEMINI_HOST", false, Some(GEMINI_HOST.to_string()))?
            .unwrap_or_else(|| GEMINI_HOST.to_string());

        let model = Self::get_env("GEMINI_MODEL", false, Some(GEMINI_MODEL.to_string()))?
            .unwrap_or_else(|| GEMINI_MODEL.to_string());

        Ok(Self::new(host, api_key, model))
    }
}
