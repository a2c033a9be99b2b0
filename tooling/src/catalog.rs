//! Read-only model of every known factory type.
//!
//! The catalog is produced at build time by a separate scanner and shipped as
//! JSON. Loading validates that factory keys and bean-kind names are globally
//! unique and builds the lookup indexes the classifier relies on.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolingError};

const BUILTIN_CATALOG: &str = include_str!("../catalog/forage-catalog.json");

/// Packaging target that needs its own dependency coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentTarget {
    Base,
    Main,
    SpringBoot,
    Quarkus,
}

impl DeploymentTarget {
    pub const ALL: [Self; 4] = [Self::Base, Self::Main, Self::SpringBoot, Self::Quarkus];

    /// Dependency-list key in `application.properties`.
    pub fn dependency_key(self) -> &'static str {
        match self {
            Self::Base => "forage.dependencies",
            Self::Main => "forage.dependencies.main",
            Self::SpringBoot => "forage.dependencies.spring-boot",
            Self::Quarkus => "forage.dependencies.quarkus",
        }
    }

    pub fn from_dependency_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.dependency_key() == key)
    }
}

impl fmt::Display for DeploymentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Base => "base",
            Self::Main => "main",
            Self::SpringBoot => "spring-boot",
            Self::Quarkus => "quarkus",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeanKind {
    pub name: String,
    #[serde(default)]
    pub feature_tag: String,
    #[serde(default)]
    pub dependency_coordinate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryVariant {
    pub deployment_target: DeploymentTarget,
    pub dependency_coordinate: String,
}

/// Extra bean a factory registers when one of its properties has a given value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalBean {
    /// Bean name; `{instance}` is replaced by the owning instance's name.
    pub name: String,
    pub bean_type: String,
    pub when_property: String,
    pub when_value: String,
}

impl ConditionalBean {
    pub fn bean_name(&self, instance: &str) -> String {
        self.name.replace("{instance}", instance)
    }

    pub fn applies(&self, value: Option<&str>) -> bool {
        value.is_some_and(|v| v.trim().eq_ignore_ascii_case(&self.when_value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryType {
    pub key: String,
    #[serde(default)]
    pub display_name: String,
    pub properties_file_name: String,
    /// Root-stripped key whose value names this factory's instance in a batch.
    #[serde(default)]
    pub short_prefix_property_key: Option<String>,
    /// Property (after the factory segment) that records the bean kind.
    #[serde(default)]
    pub kind_property_name: Option<String>,
    /// Short aliases under which the factory's keys may also appear.
    #[serde(default)]
    pub property_prefixes: Vec<String>,
    #[serde(default)]
    pub bean_kinds: Vec<BeanKind>,
    #[serde(default)]
    pub variants: Vec<FactoryVariant>,
    #[serde(default)]
    pub conditional_beans: Vec<ConditionalBean>,
}

impl FactoryType {
    pub fn bean_kind(&self, name: &str) -> Option<&BeanKind> {
        self.bean_kinds.iter().find(|k| k.name == name)
    }

    pub fn has_bean_kind(&self, name: &str) -> bool {
        self.bean_kind(name).is_some()
    }

    /// Bean kind named by `value` when `property` is a kind-selecting property.
    pub fn kind_from_property<'v>(&self, property: &str, value: &'v str) -> Option<&'v str> {
        let is_kind_property = self.kind_property_name.as_deref() == Some(property)
            || property == "kind"
            || property.ends_with(".kind");
        let value = value.trim();
        (is_kind_property && self.has_bean_kind(value)).then_some(value)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    version: String,
    factories: Vec<FactoryType>,
}

/// Validated catalog with lookup indexes.
#[derive(Debug, Clone)]
pub struct Catalog {
    version: String,
    factories: Vec<FactoryType>,
    by_key: HashMap<String, usize>,
    by_bean_kind: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
}

impl Catalog {
    /// Catalog packaged with this crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ToolingError::io(path, e))?;
        tracing::debug!("Loading catalog from {}", path.display());
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let document: CatalogDocument =
            serde_json::from_str(text).map_err(ToolingError::CatalogParse)?;
        Self::from_factories(document.version, document.factories)
    }

    pub fn from_factories(version: String, factories: Vec<FactoryType>) -> Result<Self> {
        let mut by_key = HashMap::new();
        let mut by_bean_kind: HashMap<String, usize> = HashMap::new();
        let mut by_alias = HashMap::new();

        for (index, factory) in factories.iter().enumerate() {
            if by_key.insert(factory.key.clone(), index).is_some() {
                return Err(ToolingError::DuplicateFactory(factory.key.clone()));
            }
            for kind in &factory.bean_kinds {
                if let Some(previous) = by_bean_kind.insert(kind.name.clone(), index) {
                    return Err(ToolingError::DuplicateBeanKind {
                        kind: kind.name.clone(),
                        first: factories[previous].key.clone(),
                        second: factory.key.clone(),
                    });
                }
            }
            for alias in &factory.property_prefixes {
                if let Some(previous) = by_alias.insert(alias.clone(), index) {
                    tracing::warn!(
                        "Property prefix {alias:?} is claimed by {} and {}; using {}",
                        factories[previous].key,
                        factory.key,
                        factory.key
                    );
                }
            }
        }

        Ok(Self {
            version,
            factories,
            by_key,
            by_bean_kind,
            by_alias,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn factories(&self) -> &[FactoryType] {
        &self.factories
    }

    pub fn factory(&self, key: &str) -> Option<&FactoryType> {
        self.by_key.get(key).map(|&i| &self.factories[i])
    }

    /// Factory type that declares the bean kind `name`.
    pub fn owner_of_bean_kind(&self, name: &str) -> Option<&FactoryType> {
        self.by_bean_kind.get(name).map(|&i| &self.factories[i])
    }

    pub fn factory_for_alias(&self, alias: &str) -> Option<&FactoryType> {
        self.by_alias.get(alias).map(|&i| &self.factories[i])
    }
}
