//! Parameter identities and their external name forms.
//!
//! A [`ParameterIdentity`] names one configuration parameter of one
//! integration module, optionally scoped to a named instance. The identity
//! derives the names used to probe each value source:
//!
//! | Identity | Environment form | Property form |
//! |----------|------------------|---------------|
//! | `forage.jdbc.url` | `FORAGE_JDBC_URL` | `forage.jdbc.url` |
//! | `forage.jdbc.url` + `ds1` | `FORAGE_DS1_JDBC_URL` | `forage.ds1.jdbc.url` |
//!
//! The instance prefix is spliced immediately after the module's root token
//! when the base name starts with it, and prepended otherwise.

use std::fmt;

use crate::error::{ConfigError, Result};

/// Root token shared by every built-in integration module.
pub const ROOT_TOKEN: &str = "forage.";

/// An integration module that owns a set of parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigModule {
    name: &'static str,
    root: &'static str,
    file_name: &'static str,
    packaged_defaults: Option<&'static str>,
}

impl ConfigModule {
    /// Module rooted at [`ROOT_TOKEN`], backed by the given fallback file.
    pub const fn new(name: &'static str, file_name: &'static str) -> Self {
        Self {
            name,
            root: ROOT_TOKEN,
            file_name,
            packaged_defaults: None,
        }
    }

    /// Use a different root token (must end with the `.` separator).
    pub const fn with_root(mut self, root: &'static str) -> Self {
        self.root = root;
        self
    }

    /// Flat-file content used when no fallback file is found on disk.
    pub const fn with_packaged_defaults(mut self, content: &'static str) -> Self {
        self.packaged_defaults = Some(content);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn root(&self) -> &'static str {
        self.root
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    pub fn packaged_defaults(&self) -> Option<&'static str> {
        self.packaged_defaults
    }
}

/// Which external form a value source is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyForm {
    /// `FORAGE_DS1_JDBC_URL`
    Environment,
    /// `forage.ds1.jdbc.url`
    Property,
}

/// Stable, collision-free identity of a configuration parameter.
///
/// Equality covers module, base name and instance prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterIdentity {
    module: ConfigModule,
    base_name: String,
    prefix: Option<String>,
}

impl ParameterIdentity {
    /// Canonical (unprefixed) identity.
    pub fn new(module: ConfigModule, base_name: impl Into<String>) -> Result<Self> {
        let base_name = base_name.into();
        let trimmed = base_name.trim();
        let root = module.root();
        if trimmed.is_empty() || trimmed == root || trimmed == root.trim_end_matches('.') {
            return Err(ConfigError::InvalidName(base_name));
        }
        Ok(Self {
            module,
            base_name: trimmed.to_string(),
            prefix: None,
        })
    }

    /// Same parameter scoped to a named instance. Empty prefixes mean "no prefix".
    pub fn with_prefix(&self, prefix: Option<&str>) -> Self {
        Self {
            module: self.module,
            base_name: self.base_name.clone(),
            prefix: normalize_prefix(prefix),
        }
    }

    pub fn module(&self) -> &ConfigModule {
        &self.module
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn is_canonical(&self) -> bool {
        self.prefix.is_none()
    }

    /// Base name with the instance prefix spliced in, original casing.
    pub fn spliced_name(&self) -> String {
        splice(self.module.root(), &self.base_name, self.prefix.as_deref())
    }

    /// Environment-variable form: uppercased, separators as `_`.
    pub fn env_name(&self) -> String {
        self.spliced_name().to_uppercase().replace(['.', '-'], "_")
    }

    /// Flat-property form: lowercased, separators as `.`.
    pub fn property_name(&self) -> String {
        self.spliced_name().to_lowercase().replace(['_', '-'], ".")
    }

    /// Name in the given external form.
    pub fn key(&self, form: KeyForm) -> String {
        match form {
            KeyForm::Environment => self.env_name(),
            KeyForm::Property => self.property_name(),
        }
    }

    /// True iff `candidate` names exactly this parameter.
    pub fn matches(&self, candidate: &str) -> bool {
        candidate == self.property_name()
    }
}

impl fmt::Display for ParameterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.property_name())
    }
}

pub(crate) fn normalize_prefix(prefix: Option<&str>) -> Option<String> {
    prefix
        .map(str::trim)
        .map(|p| p.trim_matches('.'))
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

fn splice(root: &str, base_name: &str, prefix: Option<&str>) -> String {
    let Some(prefix) = prefix else {
        return base_name.to_string();
    };
    match base_name.strip_prefix(root) {
        Some(rest) if !rest.is_empty() => format!("{root}{prefix}.{rest}"),
        _ => format!("{prefix}.{base_name}"),
    }
}
