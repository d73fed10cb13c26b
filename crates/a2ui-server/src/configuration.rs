use crate::error::{to_env_var, ConfigError};
use a2ui::providers::configs::{GeminiProviderConfig, GEMINI_HOST, GEMINI_MODEL};
use a2ui::samples::SampleOptions;
use config::{Config, Environment};
use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_gemini_host")]
    pub host: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
}

impl ProviderSettings {
    pub fn into_config(self) -> GeminiProviderConfig {
        GeminiProviderConfig::new(self.host, self.api_key, self.model)
    }
}

#[derive(Debug, Deserialize)]
pub struct SampleSettings {
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
    /// JSON file with the initial drive, sheets and restaurants
    #[serde(default)]
    pub seed: Option<PathBuf>,
}

impl Default for SampleSettings {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            seed: None,
        }
    }
}

impl SampleSettings {
    pub fn options(&self) -> SampleOptions {
        SampleOptions {
            max_tool_rounds: self.max_tool_rounds,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    #[serde(default)]
    pub samples: SampleSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("provider.host", default_gemini_host())?
            .set_default("provider.model", default_model())?
            // the key the samples have always used still works
            .set_default(
                "provider.api_key",
                env::var("GEMINI_API_KEY").unwrap_or_default(),
            )?
            .set_default("samples.max_tool_rounds", default_max_tool_rounds() as u64)?
            .add_source(
                Environment::with_prefix("A2UI")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Self = match config.try_deserialize() {
            Ok(settings) => settings,
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    return Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    });
                } else if let config::ConfigError::NotFound(field) = &err {
                    return Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    });
                }
                return Err(ConfigError::Other(err));
            }
        };

        if settings.provider.api_key.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar {
                env_var: to_env_var("provider.api_key"),
            });
        }
        Ok(settings)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_gemini_host() -> String {
    GEMINI_HOST.to_string()
}

fn default_model() -> String {
    GEMINI_MODEL.to_string()
}

fn default_max_tool_rounds() -> usize {
    SampleOptions::default().max_tool_rounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("A2UI_") || key == "GEMINI_API_KEY" {
                env::remove_var(&key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();
        env::set_var("A2UI_PROVIDER__API_KEY", "test-key");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.provider.host, GEMINI_HOST);
        assert_eq!(settings.provider.api_key, "test-key");
        assert_eq!(settings.provider.model, GEMINI_MODEL);
        assert_eq!(settings.samples.max_tool_rounds, 5);
        assert_eq!(settings.samples.seed, None);

        env::remove_var("A2UI_PROVIDER__API_KEY");
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        clean_env();
        env::set_var("A2UI_SERVER__PORT", "8080");
        env::set_var("A2UI_PROVIDER__API_KEY", "test-key");
        env::set_var("A2UI_PROVIDER__HOST", "http://127.0.0.1:9999");
        env::set_var("A2UI_PROVIDER__MODEL", "gemini-2.5-flash");
        env::set_var("A2UI_SAMPLES__MAX_TOOL_ROUNDS", "3");
        env::set_var("A2UI_SAMPLES__SEED", "demos/seed.json");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.samples.options().max_tool_rounds, 3);
        assert_eq!(settings.samples.seed, Some(PathBuf::from("demos/seed.json")));

        let config = settings.provider.into_config();
        assert_eq!(
            config.endpoint(),
            "http://127.0.0.1:9999/v1beta/models/gemini-2.5-flash:generateContent"
        );

        clean_env();
    }

    #[test]
    #[serial]
    fn test_gemini_api_key_fallback() {
        clean_env();
        env::set_var("GEMINI_API_KEY", "from-gemini-env");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.provider.api_key, "from-gemini-env");

        clean_env();
    }

    #[test]
    #[serial]
    fn test_missing_api_key() {
        clean_env();

        match Settings::new() {
            Err(ConfigError::MissingEnvVar { env_var }) => {
                assert_eq!(env_var, "A2UI_PROVIDER__API_KEY")
            }
            other => panic!("Expected a missing key error, got {:?}", other),
        }
    }

    #[test]
    fn test_socket_addr_conversion() {
        let server_settings = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 3000,
        };
        let addr = server_settings.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:3000");

        let bad = ServerSettings {
            host: "not a host".to_string(),
            port: 3000,
        };
        assert!(bad.socket_addr().is_err());
    }
}
