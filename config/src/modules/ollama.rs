//! Ollama chat model.

use std::time::Duration;

use crate::accessor::ModuleConfig;
use crate::error::Result;
use crate::identity::ConfigModule;
use crate::registry::ConfigRegistry;
use crate::table::{ModuleParameterTable, ParameterSpec, ParameterTag, ValueType};

pub const MODULE: ConfigModule = ConfigModule::new("ollama", "forage-model-ollama.properties")
    .with_packaged_defaults(include_str!("forage-model-ollama.properties"));

pub const BASE_URL: &str = "forage.ollama.base.url";
pub const MODEL_NAME: &str = "forage.ollama.model.name";
pub const TEMPERATURE: &str = "forage.ollama.temperature";
pub const TIMEOUT: &str = "forage.ollama.timeout";
pub const LOG_REQUESTS: &str = "forage.ollama.log.requests";

pub fn parameters() -> Result<ModuleParameterTable> {
    let mut table = ModuleParameterTable::new(MODULE);
    table.declare(
        BASE_URL,
        ParameterSpec::new("Base URL", "Ollama server address", ValueType::Text)
            .default_value("http://localhost:11434"),
    )?;
    table.declare(
        MODEL_NAME,
        ParameterSpec::new("Model", "Model to chat with, e.g. granite4:3b", ValueType::Text)
            .required(),
    )?;
    table.declare(
        TEMPERATURE,
        ParameterSpec::new("Temperature", "Sampling temperature", ValueType::Decimal),
    )?;
    table.declare(
        TIMEOUT,
        ParameterSpec::new("Timeout", "Request timeout", ValueType::Duration),
    )?;
    table.declare(
        LOG_REQUESTS,
        ParameterSpec::new("Log requests", "Log request bodies", ValueType::Boolean)
            .default_value("false")
            .tag(ParameterTag::Advanced),
    )?;
    Ok(table)
}

#[derive(Debug, Clone)]
pub struct OllamaConfig<'a> {
    config: ModuleConfig<'a>,
}

impl<'a> OllamaConfig<'a> {
    pub fn new(
        registry: &'a ConfigRegistry,
        table: &'a ModuleParameterTable,
        prefix: Option<&str>,
    ) -> Self {
        Self {
            config: ModuleConfig::new(registry, table, prefix),
        }
    }

    pub fn base_url(&self) -> Result<String> {
        self.config.required_text(BASE_URL)
    }

    pub fn model_name(&self) -> Result<String> {
        self.config.required_text(MODEL_NAME)
    }

    pub fn temperature(&self) -> Result<Option<f64>> {
        self.config.decimal(TEMPERATURE)
    }

    pub fn timeout(&self) -> Result<Duration> {
        self.config.required_duration(TIMEOUT)
    }

    pub fn log_requests(&self) -> Result<bool> {
        Ok(self.config.boolean(LOG_REQUESTS)?.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::source::{EnvironmentSource, LocateOptions};
    use pretty_assertions::assert_eq;

    #[test]
    fn packaged_defaults_fill_in_timeout() {
        let table = parameters().expect("table");
        let registry = ConfigRegistry::new().with_environment(EnvironmentSource::fixed([(
            "FORAGE_OLLAMA_MODEL_NAME",
            "granite4:3b",
        )]));
        let found = registry
            .locate_file(&MODULE, &LocateOptions::default())
            .expect("locate");
        assert!(found);

        let ollama = OllamaConfig::new(&registry, &table, None);
        assert_eq!(ollama.model_name().expect("model"), "granite4:3b");
        assert_eq!(ollama.base_url().expect("url"), "http://localhost:11434");
        assert_eq!(ollama.timeout().expect("timeout"), Duration::from_secs(60));
        assert_eq!(ollama.temperature().expect("temperature"), None);
    }

    #[test]
    fn missing_timeout_without_file_is_missing_required() {
        let table = parameters().expect("table");
        let registry = ConfigRegistry::new().with_environment(EnvironmentSource::fixed(
            std::iter::empty::<(String, String)>(),
        ));
        let ollama = OllamaConfig::new(&registry, &table, Some("chat"));
        match ollama.timeout() {
            Err(ConfigError::MissingRequired { name, env }) => {
                assert_eq!(name, "forage.chat.ollama.timeout");
                assert_eq!(env, "FORAGE_CHAT_OLLAMA_TIMEOUT");
            }
            other => panic!("expected MissingRequired, got {other:?}"),
        }
    }
}
