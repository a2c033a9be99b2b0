//! Process-wide configuration registry.
//!
//! An explicit context object owned by the process entry point. It resolves a
//! [`ParameterIdentity`] by probing sources in a fixed order and caches the
//! answer:
//!
//! 1. Environment variables (environment form)
//! 2. Process properties (property form)
//! 3. The active runtime settings, if any
//! 4. The module's fallback properties file
//!
//! Values `set` explicitly always win over values resolved by `load`.
//!
//! ```
//! use forage_config::{ConfigModule, ConfigRegistry, EnvironmentSource, ParameterIdentity};
//!
//! const MODULE: ConfigModule = ConfigModule::new("jdbc", "forage-datasource-factory.properties");
//! let url = ParameterIdentity::new(MODULE, "forage.jdbc.url")?;
//!
//! let registry = ConfigRegistry::new()
//!     .with_environment(EnvironmentSource::fixed([("FORAGE_JDBC_URL", "jdbc:h2:mem:test")]));
//! assert_eq!(registry.load(&url).as_deref(), Some("jdbc:h2:mem:test"));
//! # Ok::<(), forage_config::ConfigError>(())
//! ```

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use crate::error::Result;
use crate::identity::{ConfigModule, ParameterIdentity};
use crate::source::{
    EnvironmentSource, LocateOptions, ProcessProperties, PropertiesFileSource, RuntimeSettings,
    ValueSource,
};
use crate::table::ModuleParameterTable;

/// Process property naming the directory searched first for fallback files.
pub const CONFIG_DIR_PROPERTY: &str = "forage.config.dir";
/// Environment variable consulted when [`CONFIG_DIR_PROPERTY`] is unset.
pub const CONFIG_DIR_ENV: &str = "FORAGE_CONFIG_DIR";

/// Registry key: a typed parameter or a free-form string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Parameter(ParameterIdentity),
    Raw(String),
}

/// How a cached value got into the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueOrigin {
    Explicit,
    Resolved(String),
}

/// Result of probing the sources for one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub value: String,
    pub source: String,
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    origin: ValueOrigin,
}

/// Resolved and explicitly set configuration values.
#[derive(Debug)]
pub struct ConfigRegistry {
    environment: EnvironmentSource,
    properties: ProcessProperties,
    runtime: Option<RuntimeSettings>,
    files: RwLock<HashMap<&'static str, PropertiesFileSource>>,
    values: Mutex<HashMap<ConfigKey, Entry>>,
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigRegistry {
    /// Registry over the real process environment with no runtime settings.
    pub fn new() -> Self {
        Self {
            environment: EnvironmentSource::Process,
            properties: ProcessProperties::new(),
            runtime: None,
            files: RwLock::new(HashMap::new()),
            values: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_environment(mut self, environment: EnvironmentSource) -> Self {
        self.environment = environment;
        self
    }

    /// Install the active host runtime's settings (at most one).
    pub fn with_runtime(mut self, runtime: Option<RuntimeSettings>) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn properties(&self) -> &ProcessProperties {
        &self.properties
    }

    pub fn set_property(&self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.set(key, value);
    }

    pub fn runtime(&self) -> Option<&RuntimeSettings> {
        self.runtime.as_ref()
    }

    /// Use `source` as the lowest-precedence source for `module`.
    pub fn attach_file(&self, module: &ConfigModule, source: PropertiesFileSource) {
        if let Ok(mut files) = self.files.write() {
            tracing::debug!("Attached {} for module {}", source.origin(), module.name());
            files.insert(module.name(), source);
        }
    }

    /// Locate and attach the module's fallback file. Returns whether one was found.
    pub fn locate_file(&self, module: &ConfigModule, options: &LocateOptions) -> Result<bool> {
        let found =
            PropertiesFileSource::locate(module.file_name(), module.packaged_defaults(), options)?;
        Ok(match found {
            Some(source) => {
                self.attach_file(module, source);
                true
            }
            None => false,
        })
    }

    /// Configured fallback-file directory: process property, then environment.
    pub fn configured_dir(&self) -> Option<PathBuf> {
        self.properties
            .probe(CONFIG_DIR_PROPERTY)
            .or_else(|| self.environment.probe(CONFIG_DIR_ENV))
            .map(|dir| PathBuf::from(dir.trim()))
    }

    /// Search locations for fallback files as seen by this process.
    pub fn locate_options(&self) -> LocateOptions {
        LocateOptions::from_process(self.configured_dir())
    }

    /// Probe every source in precedence order. Does not touch the cache.
    pub fn resolve(&self, id: &ParameterIdentity) -> Option<Resolved> {
        let primary: [Option<&dyn ValueSource>; 3] = [
            Some(&self.environment as &dyn ValueSource),
            Some(&self.properties as &dyn ValueSource),
            self.runtime.as_ref().map(|r| r as &dyn ValueSource),
        ];
        for source in primary.into_iter().flatten() {
            if let Some(found) = probe(source, id) {
                return Some(found);
            }
        }

        let files = self.files.read().ok()?;
        let file = files.get(id.module().name())?;
        probe(file, id)
    }

    /// Cached value, resolving and caching it on first use.
    pub fn load(&self, id: &ParameterIdentity) -> Option<String> {
        let key = ConfigKey::Parameter(id.clone());
        if let Some(entry) = self.lock().get(&key) {
            return Some(entry.value.clone());
        }

        let resolved = self.resolve(id)?;
        let mut values = self.lock();
        let entry = values.entry(key).or_insert(Entry {
            value: resolved.value,
            origin: ValueOrigin::Resolved(resolved.source),
        });
        Some(entry.value.clone())
    }

    /// Cached value only; never probes sources.
    pub fn get(&self, id: &ParameterIdentity) -> Option<String> {
        self.lock()
            .get(&ConfigKey::Parameter(id.clone()))
            .map(|entry| entry.value.clone())
    }

    /// Overwrite the cached value regardless of where it came from.
    pub fn set(&self, id: &ParameterIdentity, value: impl Into<String>) {
        self.insert_explicit(ConfigKey::Parameter(id.clone()), value.into());
    }

    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.lock()
            .get(&ConfigKey::Raw(key.to_string()))
            .map(|entry| entry.value.clone())
    }

    pub fn set_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.insert_explicit(ConfigKey::Raw(key.into()), value.into());
    }

    pub fn origin(&self, id: &ParameterIdentity) -> Option<ValueOrigin> {
        self.lock()
            .get(&ConfigKey::Parameter(id.clone()))
            .map(|entry| entry.origin.clone())
    }

    /// Instance prefixes that any source configures for `table`'s parameters.
    pub fn named_prefixes(&self, table: &ModuleParameterTable) -> BTreeSet<String> {
        let mut keys = self.environment.keys();
        keys.extend(self.properties.keys());
        if let Some(runtime) = &self.runtime {
            keys.extend(runtime.keys());
        }
        if let Ok(files) = self.files.read()
            && let Some(file) = files.get(table.module().name())
        {
            keys.extend(file.keys());
        }

        keys.iter()
            .filter_map(|key| table.prefix_of(key))
            .map(|prefix| prefix.to_ascii_lowercase())
            .collect()
    }

    fn insert_explicit(&self, key: ConfigKey, value: String) {
        self.lock().insert(
            key,
            Entry {
                value,
                origin: ValueOrigin::Explicit,
            },
        );
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConfigKey, Entry>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn probe(source: &dyn ValueSource, id: &ParameterIdentity) -> Option<Resolved> {
    let key = id.key(source.key_form());
    let value = source.probe(&key)?;
    tracing::debug!("Resolved {id} from {} ({key})", source.name());
    Some(Resolved {
        value,
        source: source.name().to_string(),
    })
}
