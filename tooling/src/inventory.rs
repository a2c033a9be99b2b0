//! Bean instances recovered from configuration files on disk.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::classifier::KeyClassifier;
use crate::dependencies::DependencySet;
use crate::mutator::PropertiesDocument;

/// One configured instance of a factory type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeanInstance {
    /// `None` for the default (unnamed) instance.
    pub name: Option<String>,
    pub factory_type: String,
    pub kind: Option<String>,
    /// File the instance's first key was found in.
    pub file: PathBuf,
    pub properties: IndexMap<String, String>,
    #[serde(skip)]
    parameters: IndexMap<String, String>,
}

impl BeanInstance {
    /// Value of a factory property (the part after the factory segment).
    pub fn parameter(&self, property: &str) -> Option<&str> {
        self.parameters.get(property).map(String::as_str)
    }

    /// Instance name, or the factory key for the default instance.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.factory_type)
    }
}

/// Bean implied by an instance's property values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpliedBean {
    pub name: String,
    pub bean_type: String,
    pub factory_type: String,
    pub instance: Option<String>,
}

/// Group every recognized entry of `documents` by (factory type, instance).
pub fn collect_instances(
    catalog: &Catalog,
    documents: &[(PathBuf, PropertiesDocument)],
) -> Vec<BeanInstance> {
    let classifier = KeyClassifier::new(catalog);
    let mut instances: IndexMap<(String, Option<String>), BeanInstance> = IndexMap::new();

    for (path, document) in documents {
        for (key, value) in document.entries() {
            let Some(parsed) = classifier.classify(&key) else {
                continue;
            };
            let Some(factory) = catalog.factory(&parsed.factory_type) else {
                continue;
            };
            let instance = instances
                .entry((factory.key.clone(), parsed.instance_name.clone()))
                .or_insert_with(|| new_instance(path, &factory.key, parsed.instance_name.clone()));
            if instance.kind.is_none() {
                instance.kind = parsed.bean_kind.clone().or_else(|| {
                    factory
                        .kind_from_property(&parsed.property_name, &value)
                        .map(str::to_string)
                });
            }
            instance
                .parameters
                .insert(parsed.property_name.clone(), value.clone());
            instance.properties.insert(key, value);
        }
    }
    instances.into_values().collect()
}

fn new_instance(path: &Path, factory_type: &str, name: Option<String>) -> BeanInstance {
    BeanInstance {
        name,
        factory_type: factory_type.to_string(),
        kind: None,
        file: path.to_path_buf(),
        properties: IndexMap::new(),
        parameters: IndexMap::new(),
    }
}

/// Conditional beans whose trigger property holds for some instance.
pub fn implied_beans(catalog: &Catalog, instances: &[BeanInstance]) -> Vec<ImpliedBean> {
    let mut beans = Vec::new();
    for instance in instances {
        let Some(factory) = catalog.factory(&instance.factory_type) else {
            continue;
        };
        for conditional in &factory.conditional_beans {
            if conditional.applies(instance.parameter(&conditional.when_property)) {
                beans.push(ImpliedBean {
                    name: conditional.bean_name(instance.label()),
                    bean_type: conditional.bean_type.clone(),
                    factory_type: factory.key.clone(),
                    instance: instance.name.clone(),
                });
            }
        }
    }
    beans
}

/// Coordinates still needed by `instances`.
pub fn dependencies_in_use(catalog: &Catalog, instances: &[BeanInstance]) -> DependencySet {
    let mut in_use = DependencySet::default();
    for instance in instances {
        if let Some(factory) = catalog.factory(&instance.factory_type) {
            in_use.extend(&DependencySet::for_instance(factory, instance.kind.as_deref()));
        }
    }
    in_use
}
