//! Pooled JDBC data sources.

use std::time::Duration;

use crate::accessor::ModuleConfig;
use crate::error::Result;
use crate::identity::ConfigModule;
use crate::registry::ConfigRegistry;
use crate::table::{ModuleParameterTable, ParameterSpec, ParameterTag, ValueType};

pub const MODULE: ConfigModule =
    ConfigModule::new("jdbc", "forage-datasource-factory.properties");

pub const URL: &str = "forage.jdbc.url";
pub const USERNAME: &str = "forage.jdbc.username";
pub const PASSWORD: &str = "forage.jdbc.password";
pub const DB_KIND: &str = "forage.jdbc.db.kind";
pub const POOL_MAX_SIZE: &str = "forage.jdbc.pool.max.size";
pub const POOL_MIN_SIZE: &str = "forage.jdbc.pool.min.size";
pub const TRANSACTION_ENABLED: &str = "forage.jdbc.transaction.enabled";
pub const CONNECTION_TIMEOUT: &str = "forage.jdbc.connection.timeout";

pub fn parameters() -> Result<ModuleParameterTable> {
    let mut table = ModuleParameterTable::new(MODULE);
    table.declare(
        URL,
        ParameterSpec::new("JDBC URL", "Connection URL of the database", ValueType::Text).required(),
    )?;
    table.declare(
        USERNAME,
        ParameterSpec::new("Username", "Database user", ValueType::Text).tag(ParameterTag::Security),
    )?;
    table.declare(
        PASSWORD,
        ParameterSpec::new("Password", "Database password", ValueType::Secret)
            .tag(ParameterTag::Security),
    )?;
    table.declare(
        DB_KIND,
        ParameterSpec::new(
            "Database kind",
            "Database vendor, e.g. postgresql or mariadb",
            ValueType::Text,
        ),
    )?;
    table.declare(
        POOL_MAX_SIZE,
        ParameterSpec::new("Maximum pool size", "Upper bound of pooled connections", ValueType::Integer)
            .default_value("10"),
    )?;
    table.declare(
        POOL_MIN_SIZE,
        ParameterSpec::new("Minimum pool size", "Idle connections kept open", ValueType::Integer)
            .tag(ParameterTag::Advanced),
    )?;
    table.declare(
        TRANSACTION_ENABLED,
        ParameterSpec::new(
            "Transactions",
            "Register a transaction manager for this data source",
            ValueType::Boolean,
        )
        .default_value("false"),
    )?;
    table.declare(
        CONNECTION_TIMEOUT,
        ParameterSpec::new(
            "Connection timeout",
            "Maximum wait for a pooled connection",
            ValueType::Duration,
        )
        .default_value("PT30S")
        .tag(ParameterTag::Advanced),
    )?;
    Ok(table)
}

/// Data source settings for the default or one named instance.
#[derive(Debug, Clone)]
pub struct DataSourceConfig<'a> {
    config: ModuleConfig<'a>,
}

impl<'a> DataSourceConfig<'a> {
    pub fn new(
        registry: &'a ConfigRegistry,
        table: &'a ModuleParameterTable,
        prefix: Option<&str>,
    ) -> Self {
        Self {
            config: ModuleConfig::new(registry, table, prefix),
        }
    }

    pub fn url(&self) -> Result<String> {
        self.config.required_text(URL)
    }

    pub fn username(&self) -> Result<Option<String>> {
        self.config.text(USERNAME)
    }

    pub fn password(&self) -> Result<Option<String>> {
        self.config.text(PASSWORD)
    }

    pub fn db_kind(&self) -> Result<Option<String>> {
        self.config.text(DB_KIND)
    }

    pub fn pool_max_size(&self) -> Result<u32> {
        Ok(self.config.integer(POOL_MAX_SIZE)?.unwrap_or(10))
    }

    pub fn pool_min_size(&self) -> Result<Option<u32>> {
        self.config.integer(POOL_MIN_SIZE)
    }

    pub fn transaction_enabled(&self) -> Result<bool> {
        Ok(self.config.boolean(TRANSACTION_ENABLED)?.unwrap_or(false))
    }

    pub fn connection_timeout(&self) -> Result<Duration> {
        self.config.required_duration(CONNECTION_TIMEOUT)
    }
}
