//! Value sources probed by the registry.
//!
//! Precedence is owned by [`crate::registry::ConfigRegistry`]; each source
//! only answers "do you have a non-empty value for this key".

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use indexmap::IndexMap;

use crate::error::{ConfigError, Result};
use crate::identity::KeyForm;
use crate::properties;
use crate::runtime::RuntimeKind;

/// A place configuration values can come from.
pub trait ValueSource: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Which name form this source is keyed by.
    fn key_form(&self) -> KeyForm {
        KeyForm::Property
    }

    /// Non-empty value for `key`, if any.
    fn probe(&self, key: &str) -> Option<String>;

    /// All keys this source currently holds, in property form.
    fn keys(&self) -> Vec<String>;
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// Property-form lookup: exact key first, then an ASCII case-insensitive match,
// since the property form of a mixed-case instance prefix is lowercased.
fn property_lookup<'v>(
    exact: Option<&'v String>,
    mut entries: impl Iterator<Item = (&'v String, &'v String)>,
    key: &str,
) -> Option<String> {
    let value = exact.or_else(|| {
        entries
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    });
    non_empty(value.cloned())
}

// ─────────────────────────────────────────────────────────────────────────────
// Environment
// ─────────────────────────────────────────────────────────────────────────────

/// Operating-system environment, or a fixed snapshot of one.
#[derive(Debug, Clone, Default)]
pub enum EnvironmentSource {
    #[default]
    Process,
    Fixed(HashMap<String, String>),
}

impl EnvironmentSource {
    pub fn fixed<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Fixed(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl ValueSource for EnvironmentSource {
    fn name(&self) -> &str {
        "environment"
    }

    fn key_form(&self) -> KeyForm {
        KeyForm::Environment
    }

    fn probe(&self, key: &str) -> Option<String> {
        match self {
            Self::Process => non_empty(std::env::var(key).ok()),
            Self::Fixed(vars) => non_empty(vars.get(key).cloned()),
        }
    }

    fn keys(&self) -> Vec<String> {
        let names: Vec<String> = match self {
            Self::Process => std::env::vars().map(|(k, _)| k).collect(),
            Self::Fixed(vars) => vars.keys().cloned().collect(),
        };
        names
            .into_iter()
            .map(|k| k.to_lowercase().replace('_', "."))
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Process properties
// ─────────────────────────────────────────────────────────────────────────────

/// Process-level key/value properties (e.g. `-D key=value` on a command line).
#[derive(Debug, Default)]
pub struct ProcessProperties {
    values: RwLock<HashMap<String, String>>,
}

impl ProcessProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.into(), value.into());
        }
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.values.write().ok()?.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }
}

impl ValueSource for ProcessProperties {
    fn name(&self) -> &str {
        "process properties"
    }

    fn probe(&self, key: &str) -> Option<String> {
        let values = self.values.read().ok()?;
        property_lookup(values.get(key), values.iter(), key)
    }

    fn keys(&self) -> Vec<String> {
        self.values
            .read()
            .map(|values| values.keys().cloned().collect())
            .unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Runtime settings
// ─────────────────────────────────────────────────────────────────────────────

/// Settings object of the host framework the integration runs inside.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    kind: RuntimeKind,
    values: IndexMap<String, String>,
}

impl RuntimeSettings {
    pub fn new(kind: RuntimeKind, values: IndexMap<String, String>) -> Self {
        Self { kind, values }
    }

    /// Load the host's own settings file (typically `application.properties`).
    pub fn from_file(kind: RuntimeKind, path: &Path) -> Result<Self> {
        let text = read_file(path)?;
        Ok(Self::new(kind, properties::parse(&text)))
    }

    pub fn kind(&self) -> RuntimeKind {
        self.kind
    }
}

impl ValueSource for RuntimeSettings {
    fn name(&self) -> &str {
        self.kind.label()
    }

    fn probe(&self, key: &str) -> Option<String> {
        property_lookup(self.values.get(key), self.values.iter(), key)
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties file
// ─────────────────────────────────────────────────────────────────────────────

/// Where a fallback properties file was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOrigin {
    ConfiguredDirectory(PathBuf),
    WorkingDirectory(PathBuf),
    Resource(PathBuf),
    Packaged,
}

impl fmt::Display for FileOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfiguredDirectory(p) => write!(f, "configured directory {}", p.display()),
            Self::WorkingDirectory(p) => write!(f, "working directory {}", p.display()),
            Self::Resource(p) => write!(f, "resource {}", p.display()),
            Self::Packaged => f.write_str("packaged defaults"),
        }
    }
}

/// Directories searched for a module's fallback file, in order.
#[derive(Debug, Clone, Default)]
pub struct LocateOptions {
    pub configured_dir: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
    pub resource_dirs: Vec<PathBuf>,
}

impl LocateOptions {
    /// Working directory plus the per-user `forage` config directory.
    pub fn from_process(configured_dir: Option<PathBuf>) -> Self {
        Self {
            configured_dir,
            working_dir: std::env::current_dir().ok(),
            resource_dirs: dirs::config_dir()
                .map(|dir| vec![dir.join("forage")])
                .unwrap_or_default(),
        }
    }
}

/// A loaded flat configuration file.
#[derive(Debug, Clone)]
pub struct PropertiesFileSource {
    origin: FileOrigin,
    values: IndexMap<String, String>,
}

impl PropertiesFileSource {
    pub fn from_text(origin: FileOrigin, text: &str) -> Self {
        Self {
            origin,
            values: properties::parse(text),
        }
    }

    pub fn from_path(origin: FileOrigin, path: &Path) -> Result<Self> {
        let text = read_file(path)?;
        Ok(Self::from_text(origin, &text))
    }

    /// First existing `file_name` in configured dir, working dir, resource
    /// dirs; then the packaged defaults, if any.
    pub fn locate(
        file_name: &str,
        packaged: Option<&'static str>,
        options: &LocateOptions,
    ) -> Result<Option<Self>> {
        let mut candidates = Vec::new();
        if let Some(dir) = &options.configured_dir {
            let path = dir.join(file_name);
            candidates.push((FileOrigin::ConfiguredDirectory(path.clone()), path));
        }
        if let Some(dir) = &options.working_dir {
            let path = dir.join(file_name);
            candidates.push((FileOrigin::WorkingDirectory(path.clone()), path));
        }
        for dir in &options.resource_dirs {
            let path = dir.join(file_name);
            candidates.push((FileOrigin::Resource(path.clone()), path));
        }

        for (origin, path) in candidates {
            if path.is_file() {
                tracing::debug!("Using {file_name} from {origin}");
                return Self::from_path(origin, &path).map(Some);
            }
        }

        Ok(packaged.map(|text| {
            tracing::debug!("Using packaged defaults for {file_name}");
            Self::from_text(FileOrigin::Packaged, text)
        }))
    }

    pub fn origin(&self) -> &FileOrigin {
        &self.origin
    }
}

impl ValueSource for PropertiesFileSource {
    fn name(&self) -> &str {
        "properties file"
    }

    fn probe(&self, key: &str) -> Option<String> {
        property_lookup(self.values.get(key), self.values.iter(), key)
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
