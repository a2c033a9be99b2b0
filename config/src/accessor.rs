//! Typed, lazily failing access to one module instance's parameters.
//!
//! Resolution happens in [`ConfigRegistry::load`]; conversion and the
//! required-value check happen here, at the moment an accessor is called.

use std::str::FromStr;
use std::time::Duration;

use crate::convert;
use crate::error::{ConfigError, Result};
use crate::identity::{ParameterIdentity, normalize_prefix};
use crate::registry::ConfigRegistry;
use crate::table::ModuleParameterTable;

/// View of a module's parameters for the default or one named instance.
#[derive(Debug, Clone)]
pub struct ModuleConfig<'a> {
    registry: &'a ConfigRegistry,
    table: &'a ModuleParameterTable,
    prefix: Option<String>,
}

impl<'a> ModuleConfig<'a> {
    pub fn new(
        registry: &'a ConfigRegistry,
        table: &'a ModuleParameterTable,
        prefix: Option<&str>,
    ) -> Self {
        Self {
            registry,
            table,
            prefix: normalize_prefix(prefix),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn registry(&self) -> &'a ConfigRegistry {
        self.registry
    }

    /// Identity of `base_name` for this instance.
    pub fn identity(&self, base_name: &str) -> Result<ParameterIdentity> {
        self.table
            .lookup(base_name, self.prefix())
            .map(|(id, _)| id)
    }

    pub fn text(&self, base_name: &str) -> Result<Option<String>> {
        Ok(self.value(base_name, false)?.map(|(_, raw)| raw))
    }

    pub fn required_text(&self, base_name: &str) -> Result<String> {
        let (_, raw) = self.require(base_name)?;
        Ok(raw)
    }

    pub fn integer<T: FromStr>(&self, base_name: &str) -> Result<Option<T>> {
        self.value(base_name, false)?
            .map(|(id, raw)| convert::parse_number(&id.property_name(), &raw))
            .transpose()
    }

    pub fn decimal(&self, base_name: &str) -> Result<Option<f64>> {
        self.integer::<f64>(base_name)
    }

    pub fn boolean(&self, base_name: &str) -> Result<Option<bool>> {
        self.value(base_name, false)?
            .map(|(id, raw)| convert::parse_bool(&id.property_name(), &raw))
            .transpose()
    }

    pub fn duration(&self, base_name: &str) -> Result<Option<Duration>> {
        self.value(base_name, false)?
            .map(|(id, raw)| convert::parse_duration(&id.property_name(), &raw))
            .transpose()
    }

    pub fn required_duration(&self, base_name: &str) -> Result<Duration> {
        let (id, raw) = self.require(base_name)?;
        convert::parse_duration(&id.property_name(), &raw)
    }

    fn require(&self, base_name: &str) -> Result<(ParameterIdentity, String)> {
        let id = self.identity(base_name)?;
        self.value(base_name, true)?
            .ok_or_else(|| missing(&id))
    }

    // Cached or resolved value, else the declared default. A parameter
    // declared as required fails here even through the optional accessors.
    fn value(&self, base_name: &str, force_required: bool) -> Result<Option<(ParameterIdentity, String)>> {
        let (id, spec) = self.table.lookup(base_name, self.prefix())?;
        let value = self
            .registry
            .load(&id)
            .or_else(|| spec.default_value.clone());
        match value {
            Some(raw) => Ok(Some((id, raw))),
            None if force_required || spec.required => Err(missing(&id)),
            None => Ok(None),
        }
    }
}

fn missing(id: &ParameterIdentity) -> ConfigError {
    ConfigError::MissingRequired {
        name: id.property_name(),
        env: id.env_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ConfigModule;
    use crate::source::EnvironmentSource;
    use crate::table::{ParameterSpec, ValueType};
    use pretty_assertions::assert_eq;

    const MODULE: ConfigModule = ConfigModule::new("demo", "forage-demo.properties");

    fn table() -> ModuleParameterTable {
        let mut table = ModuleParameterTable::new(MODULE);
        for (name, spec) in [
            (
                "forage.demo.endpoint",
                ParameterSpec::new("Endpoint", "Service endpoint", ValueType::Text).required(),
            ),
            (
                "forage.demo.retries",
                ParameterSpec::new("Retries", "Retry count", ValueType::Integer).default_value("3"),
            ),
            (
                "forage.demo.timeout",
                ParameterSpec::new("Timeout", "Call timeout", ValueType::Duration),
            ),
        ] {
            table.declare(name, spec).expect("declare");
        }
        table
    }

    fn registry(vars: &[(&str, &str)]) -> ConfigRegistry {
        ConfigRegistry::new().with_environment(EnvironmentSource::fixed(vars.iter().copied()))
    }

    #[test]
    fn default_applies_when_unresolved() {
        let table = table();
        let registry = registry(&[]);
        let config = ModuleConfig::new(&registry, &table, None);
        assert_eq!(config.integer::<u32>("forage.demo.retries").expect("retries"), Some(3));
        assert_eq!(config.duration("forage.demo.timeout").expect("timeout"), None);
    }

    #[test]
    fn missing_required_fails_at_access_with_both_names() {
        let table = table();
        let registry = registry(&[]);
        let config = ModuleConfig::new(&registry, &table, Some("east"));
        match config.text("forage.demo.endpoint") {
            Err(ConfigError::MissingRequired { name, env }) => {
                assert_eq!(name, "forage.east.demo.endpoint");
                assert_eq!(env, "FORAGE_EAST_DEMO_ENDPOINT");
            }
            other => panic!("expected MissingRequired, got {other:?}"),
        }
    }

    #[test]
    fn missing_duration_is_missing_required() {
        let table = table();
        let registry = registry(&[]);
        let config = ModuleConfig::new(&registry, &table, None);
        assert!(matches!(
            config.required_duration("forage.demo.timeout"),
            Err(ConfigError::MissingRequired { .. })
        ));
    }

    #[test]
    fn instance_values_do_not_leak_between_prefixes() {
        let table = table();
        let registry = registry(&[
            ("FORAGE_DEMO_RETRIES", "5"),
            ("FORAGE_WEST_DEMO_RETRIES", "9"),
            ("FORAGE_WEST_DEMO_TIMEOUT", "PT2S"),
        ]);
        let west = ModuleConfig::new(&registry, &table, Some("west"));
        let default = ModuleConfig::new(&registry, &table, None);
        assert_eq!(west.integer::<u32>("forage.demo.retries").expect("west"), Some(9));
        assert_eq!(default.integer::<u32>("forage.demo.retries").expect("default"), Some(5));
        assert_eq!(
            west.required_duration("forage.demo.timeout").expect("timeout"),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn conversion_error_carries_raw_value() {
        let table = table();
        let registry = registry(&[("FORAGE_DEMO_RETRIES", "many")]);
        let config = ModuleConfig::new(&registry, &table, None);
        match config.integer::<u32>("forage.demo.retries") {
            Err(ConfigError::InvalidNumber { name, value }) => {
                assert_eq!(name, "forage.demo.retries");
                assert_eq!(value, "many");
            }
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn explicit_set_beats_resolved_value() {
        let table = table();
        let registry = registry(&[("FORAGE_DEMO_ENDPOINT", "http://env")]);
        let config = ModuleConfig::new(&registry, &table, None);
        assert_eq!(config.required_text("forage.demo.endpoint").expect("endpoint"), "http://env");

        let id = config.identity("forage.demo.endpoint").expect("id");
        registry.set(&id, "http://explicit");
        assert_eq!(
            config.required_text("forage.demo.endpoint").expect("endpoint"),
            "http://explicit"
        );
    }
}
