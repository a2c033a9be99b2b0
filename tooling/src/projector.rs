//! Groups a batch of flat key/value pairs into per-factory property sets.
//!
//! Instance naming, per key, in precedence order:
//!
//! 1. The instance segment carried by the key itself
//! 2. The value of the factory's short-prefix key in the batch
//! 3. The batch-wide bean name (`forage.bean.name`, `bean.name` or `name`)
//!
//! Values are copied byte-for-byte; only keys are rewritten to canonical form.

use std::collections::{HashMap, HashSet};

use forage_config::ROOT_TOKEN;
use indexmap::IndexMap;
use serde::Serialize;

use crate::catalog::{Catalog, FactoryType};
use crate::classifier::{KeyClassifier, strip_root};
use crate::dependencies::DependencySet;

/// Metadata keys naming the batch's bean, first present wins.
pub const BEAN_NAME_KEYS: [&str; 3] = ["forage.bean.name", "bean.name", "name"];

/// Metadata keys selecting the batch's bean kind, first present wins.
pub const BEAN_KIND_KEYS: [&str; 3] = ["forage.bean.kind", "bean.kind", "kind"];

/// Projected configuration of one factory type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryConfig {
    /// Instance name of the first group written for this factory.
    pub bean_name: Option<String>,
    pub kind: Option<String>,
    pub properties: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub factories: IndexMap<String, FactoryConfig>,
    pub dependencies: DependencySet,
}

impl Projection {
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

// One (factory, instance) group while projecting.
#[derive(Debug, Default)]
struct Group {
    kind: Option<String>,
    kind_key_seen: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfigProjector<'c> {
    catalog: &'c Catalog,
    classifier: KeyClassifier<'c>,
}

impl<'c> ConfigProjector<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            classifier: KeyClassifier::new(catalog),
        }
    }

    pub fn project(&self, input: &IndexMap<String, String>) -> Projection {
        let batch_name = first_present(input, &BEAN_NAME_KEYS);
        let batch_kind = first_present(input, &BEAN_KIND_KEYS);
        let batch_kind_owner = batch_kind
            .and_then(|kind| self.catalog.owner_of_bean_kind(kind))
            .map(|factory| factory.key.as_str());

        let (local_names, consumed) = self.short_prefix_names(input);

        let mut factories: IndexMap<String, FactoryConfig> = IndexMap::new();
        let mut groups: IndexMap<(String, Option<String>), Group> = IndexMap::new();

        for (key, value) in input {
            if is_metadata_key(key) || consumed.contains(key.as_str()) {
                continue;
            }
            let Some(parsed) = self.classifier.classify(key) else {
                tracing::debug!("Skipping unrecognized key {key}");
                continue;
            };
            let Some(factory) = self.catalog.factory(&parsed.factory_type) else {
                continue;
            };

            let instance = parsed
                .instance_name
                .clone()
                .or_else(|| local_names.get(factory.key.as_str()).copied().map(str::to_string))
                .or_else(|| batch_name.map(str::to_string));

            let group = groups
                .entry((factory.key.clone(), instance.clone()))
                .or_default();
            if group.kind.is_none() {
                group.kind = parsed
                    .bean_kind
                    .clone()
                    .or_else(|| {
                        batch_kind
                            .filter(|_| batch_kind_owner == Some(factory.key.as_str()))
                            .map(str::to_string)
                    })
                    .or_else(|| {
                        factory
                            .kind_from_property(&parsed.property_name, value)
                            .map(str::to_string)
                    });
            }
            if is_kind_key(factory, &parsed.property_name) {
                group.kind_key_seen = true;
            }

            let config = factories.entry(factory.key.clone()).or_default();
            if config.properties.is_empty() {
                config.bean_name.clone_from(&instance);
            }
            config
                .properties
                .insert(parsed.canonical_key(instance.as_deref()), value.clone());
        }

        let mut dependencies = DependencySet::default();
        for ((factory_key, instance), group) in &groups {
            let Some(factory) = self.catalog.factory(factory_key) else {
                continue;
            };
            dependencies.extend(&DependencySet::for_instance(factory, group.kind.as_deref()));

            let Some(config) = factories.get_mut(factory_key) else {
                continue;
            };
            if config.kind.is_none() {
                config.kind.clone_from(&group.kind);
            }
            if let (Some(kind), Some(property), false) = (
                group.kind.as_deref(),
                factory.kind_property_name.as_deref(),
                group.kind_key_seen,
            ) {
                let key = kind_key(factory, instance.as_deref(), property);
                config.properties.entry(key).or_insert_with(|| kind.to_string());
            }
        }

        Projection {
            factories,
            dependencies,
        }
    }

    // Factory key -> instance name, plus the input keys consumed for naming.
    fn short_prefix_names<'i>(
        &self,
        input: &'i IndexMap<String, String>,
    ) -> (HashMap<&'c str, &'i str>, HashSet<&'i str>) {
        let mut names = HashMap::new();
        let mut consumed = HashSet::new();
        for factory in self.catalog.factories() {
            let Some(short_key) = factory.short_prefix_property_key.as_deref() else {
                continue;
            };
            for (key, value) in input {
                if strip_root(key) != short_key {
                    continue;
                }
                consumed.insert(key.as_str());
                let value = value.trim();
                if !value.is_empty() {
                    names.entry(factory.key.as_str()).or_insert(value);
                }
            }
        }
        (names, consumed)
    }
}

fn first_present<'i>(input: &'i IndexMap<String, String>, keys: &[&str]) -> Option<&'i str> {
    keys.iter()
        .filter_map(|key| input.get(*key))
        .map(|value| value.as_str().trim())
        .find(|value| !value.is_empty())
}

fn is_metadata_key(key: &str) -> bool {
    BEAN_NAME_KEYS.contains(&key) || BEAN_KIND_KEYS.contains(&key)
}

fn is_kind_key(factory: &FactoryType, property: &str) -> bool {
    factory.kind_property_name.as_deref() == Some(property)
}

fn kind_key(factory: &FactoryType, instance: Option<&str>, property: &str) -> String {
    match instance {
        Some(instance) => format!("{ROOT_TOKEN}{instance}.{}.{property}", factory.key),
        None => format!("{ROOT_TOKEN}{}.{property}", factory.key),
    }
}
