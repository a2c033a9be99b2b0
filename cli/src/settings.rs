//! The CLI's own configuration, resolved like any other module's.
//!
//! `FORAGE_TOOLING_STRATEGY=application`, `-D forage.tooling.strategy=application`
//! and a `forage-tooling.properties` file all feed the same parameter.
//! Command-line flags override whatever is resolved here.

use std::path::PathBuf;

use anyhow::Context;
use forage_config::{
    ConfigModule, ConfigRegistry, ModuleConfig, ModuleParameterTable, ParameterSpec,
    ParameterTag, ValueType,
};
use forage_tooling::FileStrategy;

pub const MODULE: ConfigModule = ConfigModule::new("tooling", "forage-tooling.properties");

pub const CATALOG_PATH: &str = "forage.tooling.catalog.path";
pub const STRATEGY: &str = "forage.tooling.strategy";
pub const DIRECTORY: &str = "forage.tooling.directory";

pub fn parameters() -> forage_config::Result<ModuleParameterTable> {
    let mut table = ModuleParameterTable::new(MODULE);
    table.declare(
        CATALOG_PATH,
        ParameterSpec::new(
            "Catalog",
            "JSON catalog replacing the built-in factory catalog",
            ValueType::Text,
        )
        .tag(ParameterTag::Advanced),
    )?;
    table.declare(
        STRATEGY,
        ParameterSpec::new(
            "File strategy",
            "per-factory or application",
            ValueType::Text,
        )
        .default_value(FileStrategy::PerFactory.to_string()),
    )?;
    table.declare(
        DIRECTORY,
        ParameterSpec::new(
            "Directory",
            "Directory holding the configuration files",
            ValueType::Text,
        )
        .default_value("."),
    )?;
    Ok(table)
}

/// Resolved CLI defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolingSettings {
    pub catalog_path: Option<PathBuf>,
    pub strategy: FileStrategy,
    pub directory: PathBuf,
}

impl ToolingSettings {
    /// Locate the module's fallback file and resolve every parameter.
    pub fn load(registry: &ConfigRegistry) -> anyhow::Result<Self> {
        let table = parameters()?;
        registry.locate_file(table.module(), &registry.locate_options())?;
        Self::resolve(&ModuleConfig::new(registry, &table, None))
    }

    pub fn resolve(config: &ModuleConfig<'_>) -> anyhow::Result<Self> {
        let strategy = config.required_text(STRATEGY)?;
        let strategy = strategy
            .parse::<FileStrategy>()
            .with_context(|| format!("invalid value for {STRATEGY}"))?;
        Ok(Self {
            catalog_path: config.text(CATALOG_PATH)?.map(PathBuf::from),
            strategy,
            directory: PathBuf::from(config.required_text(DIRECTORY)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forage_config::EnvironmentSource;
    use pretty_assertions::assert_eq;

    fn resolve(registry: &ConfigRegistry) -> anyhow::Result<ToolingSettings> {
        let table = parameters()?;
        ToolingSettings::resolve(&ModuleConfig::new(registry, &table, None))
    }

    #[test]
    fn defaults_apply_without_any_source() -> anyhow::Result<()> {
        let registry = ConfigRegistry::new().with_environment(EnvironmentSource::fixed(
            std::iter::empty::<(String, String)>(),
        ));
        assert_eq!(
            resolve(&registry)?,
            ToolingSettings {
                catalog_path: None,
                strategy: FileStrategy::PerFactory,
                directory: PathBuf::from("."),
            }
        );
        Ok(())
    }

    #[test]
    fn environment_and_properties_feed_the_same_parameters() -> anyhow::Result<()> {
        let registry = ConfigRegistry::new().with_environment(EnvironmentSource::fixed([
            ("FORAGE_TOOLING_STRATEGY", "application"),
            ("FORAGE_TOOLING_DIRECTORY", "/from/env"),
        ]));
        registry.set_property(CATALOG_PATH, "/etc/forage/catalog.json");

        let settings = resolve(&registry)?;
        assert_eq!(settings.strategy, FileStrategy::Application);
        assert_eq!(settings.directory, PathBuf::from("/from/env"));
        assert_eq!(
            settings.catalog_path,
            Some(PathBuf::from("/etc/forage/catalog.json"))
        );
        Ok(())
    }

    #[test]
    fn unknown_strategy_is_reported_with_the_parameter_name() {
        let registry = ConfigRegistry::new()
            .with_environment(EnvironmentSource::fixed([("FORAGE_TOOLING_STRATEGY", "yaml")]));
        let err = match resolve(&registry) {
            Ok(settings) => panic!("expected an error, got {settings:?}"),
            Err(err) => err,
        };
        assert!(format!("{err:#}").contains(STRATEGY));
    }
}
