//! Per-module parameter tables.
//!
//! Each integration module declares its canonical (unprefixed) parameters
//! once. Named instances are added by [`ModuleParameterTable::register`],
//! which clones every canonical entry under the instance prefix.

use indexmap::IndexMap;

use crate::error::{ConfigError, Result};
use crate::identity::{ConfigModule, ParameterIdentity, normalize_prefix};
use crate::registry::ConfigRegistry;

/// Expected shape of a parameter's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Integer,
    Decimal,
    Boolean,
    Duration,
    /// Text that must not be echoed in logs or reports.
    Secret,
}

/// Grouping tag shown by tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterTag {
    #[default]
    Common,
    Security,
    Advanced,
}

/// Declared metadata of one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub label: String,
    pub description: String,
    pub default_value: Option<String>,
    pub value_type: ValueType,
    pub required: bool,
    pub tag: ParameterTag,
    /// Whether the parameter may be configured per named instance.
    pub named_instances: bool,
}

impl ParameterSpec {
    pub fn new(label: impl Into<String>, description: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            default_value: None,
            value_type,
            required: false,
            tag: ParameterTag::Common,
            named_instances: true,
        }
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn tag(mut self, tag: ParameterTag) -> Self {
        self.tag = tag;
        self
    }

    pub fn single_instance(mut self) -> Self {
        self.named_instances = false;
        self
    }
}

/// Parameters of one integration module, canonical and per instance.
#[derive(Debug, Clone)]
pub struct ModuleParameterTable {
    module: ConfigModule,
    entries: IndexMap<ParameterIdentity, ParameterSpec>,
}

impl ModuleParameterTable {
    pub fn new(module: ConfigModule) -> Self {
        Self {
            module,
            entries: IndexMap::new(),
        }
    }

    pub fn module(&self) -> &ConfigModule {
        &self.module
    }

    /// Add a canonical parameter.
    pub fn declare(&mut self, base_name: &str, spec: ParameterSpec) -> Result<ParameterIdentity> {
        let id = ParameterIdentity::new(self.module, base_name)?;
        self.entries.insert(id.clone(), spec);
        Ok(id)
    }

    /// Canonical entries cloned under `prefix`. Pure; the table is unchanged.
    pub fn expand(&self, prefix: &str) -> Vec<(ParameterIdentity, ParameterSpec)> {
        let Some(prefix) = normalize_prefix(Some(prefix)) else {
            return Vec::new();
        };
        self.canonical()
            .filter(|(_, spec)| spec.named_instances)
            .map(|(id, spec)| (id.with_prefix(Some(&prefix)), spec.clone()))
            .collect()
    }

    /// Add entries for a named instance. Returns how many were new.
    pub fn register(&mut self, prefix: Option<&str>) -> usize {
        let Some(prefix) = prefix else {
            return 0;
        };
        let mut inserted = 0;
        for (id, spec) in self.expand(prefix) {
            if !self.entries.contains_key(&id) {
                self.entries.insert(id, spec);
                inserted += 1;
            }
        }
        if inserted > 0 {
            tracing::debug!(
                "Registered instance {prefix:?} for module {} ({inserted} parameters)",
                self.module.name()
            );
        }
        inserted
    }

    /// Resolve every entry of the instance `prefix` into the registry.
    /// Returns how many resolved; the rest stay unresolved until accessed.
    pub fn load_overrides(&self, registry: &ConfigRegistry, prefix: Option<&str>) -> usize {
        let prefix = normalize_prefix(prefix);
        self.entries
            .keys()
            .filter(|id| id.prefix() == prefix.as_deref())
            .filter(|id| registry.load(id).is_some())
            .count()
    }

    /// Identity of `base_name` for the instance, with the spec that governs it.
    ///
    /// Unregistered instances fall back to the canonical spec.
    pub fn lookup(
        &self,
        base_name: &str,
        prefix: Option<&str>,
    ) -> Result<(ParameterIdentity, &ParameterSpec)> {
        let canonical = ParameterIdentity::new(self.module, base_name)?;
        let id = canonical.with_prefix(prefix);
        let spec = self
            .entries
            .get(&id)
            .or_else(|| self.entries.get(&canonical))
            .ok_or_else(|| ConfigError::UnknownParameter {
                module: self.module.name().to_string(),
                name: base_name.to_string(),
            })?;
        Ok((id, spec))
    }

    pub fn spec(&self, id: &ParameterIdentity) -> Option<&ParameterSpec> {
        self.entries.get(id)
    }

    /// Entry whose property form is exactly `candidate`.
    pub fn find_by_key(&self, candidate: &str) -> Option<&ParameterIdentity> {
        self.entries.keys().find(|id| id.matches(candidate))
    }

    /// Instance prefix carried by `key` for one of this table's parameters.
    ///
    /// `forage.ds1.jdbc.url` yields `ds1` for the parameter `forage.jdbc.url`.
    /// Prefixes containing separators are not recognised.
    pub fn prefix_of<'k>(&self, key: &'k str) -> Option<&'k str> {
        let root = self.module.root();
        self.canonical()
            .filter(|(_, spec)| spec.named_instances)
            .find_map(|(id, _)| {
                let property = id.property_name();
                let (head, tail) = match property.strip_prefix(root) {
                    Some(rest) => (root, rest),
                    None => ("", property.as_str()),
                };
                let middle = strip_affixes(key, head, tail)?;
                (!middle.is_empty() && !middle.contains('.')).then_some(middle)
            })
    }

    pub fn canonical(&self) -> impl Iterator<Item = (&ParameterIdentity, &ParameterSpec)> {
        self.entries.iter().filter(|(id, _)| id.is_canonical())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParameterIdentity, &ParameterSpec)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `key` minus a case-insensitive `head` and `.tail`, if both match.
fn strip_affixes<'k>(key: &'k str, head: &str, tail: &str) -> Option<&'k str> {
    let start = head.len();
    let end = key.len().checked_sub(tail.len() + 1)?;
    if end < start {
        return None;
    }
    let key_head = key.get(..start)?;
    let key_tail = key.get(end..)?;
    if !key_head.eq_ignore_ascii_case(head) || !key_tail.eq_ignore_ascii_case(&format!(".{tail}")) {
        return None;
    }
    key.get(start..end)
}
