//! Dependency coordinates per deployment target.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::{DeploymentTarget, FactoryType};

/// One coordinate set per [`DeploymentTarget`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencySet {
    pub base: BTreeSet<String>,
    pub main: BTreeSet<String>,
    pub spring_boot: BTreeSet<String>,
    pub quarkus: BTreeSet<String>,
}

impl DependencySet {
    /// Coordinates an instance of `factory` (with bean kind `kind`) needs.
    pub fn for_instance(factory: &FactoryType, kind: Option<&str>) -> Self {
        let mut set = Self::default();
        if let Some(coordinate) = kind
            .and_then(|k| factory.bean_kind(k))
            .and_then(|k| k.dependency_coordinate.as_deref())
        {
            set.insert(DeploymentTarget::Base, coordinate);
        }
        for variant in &factory.variants {
            set.insert(variant.deployment_target, &variant.dependency_coordinate);
        }
        set
    }

    pub fn get(&self, target: DeploymentTarget) -> &BTreeSet<String> {
        match target {
            DeploymentTarget::Base => &self.base,
            DeploymentTarget::Main => &self.main,
            DeploymentTarget::SpringBoot => &self.spring_boot,
            DeploymentTarget::Quarkus => &self.quarkus,
        }
    }

    fn get_mut(&mut self, target: DeploymentTarget) -> &mut BTreeSet<String> {
        match target {
            DeploymentTarget::Base => &mut self.base,
            DeploymentTarget::Main => &mut self.main,
            DeploymentTarget::SpringBoot => &mut self.spring_boot,
            DeploymentTarget::Quarkus => &mut self.quarkus,
        }
    }

    pub fn insert(&mut self, target: DeploymentTarget, coordinate: &str) {
        let coordinate = coordinate.trim();
        if !coordinate.is_empty() {
            self.get_mut(target).insert(coordinate.to_string());
        }
    }

    pub fn extend(&mut self, other: &Self) {
        for target in DeploymentTarget::ALL {
            self.get_mut(target).extend(other.get(target).iter().cloned());
        }
    }

    /// Coordinates in `self` that `other` does not hold, per target.
    pub fn difference(&self, other: &Self) -> Self {
        let mut out = Self::default();
        for target in DeploymentTarget::ALL {
            *out.get_mut(target) = self
                .get(target)
                .difference(other.get(target))
                .cloned()
                .collect();
        }
        out
    }

    /// Keep only coordinates for which `keep` holds, in every list.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        for target in DeploymentTarget::ALL {
            self.get_mut(target).retain(|c| keep(c));
        }
    }

    /// Every coordinate, whatever its target.
    pub fn coordinates(&self) -> BTreeSet<&str> {
        self.iter()
            .flat_map(|(_, set)| set.iter().map(String::as_str))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        DeploymentTarget::ALL
            .into_iter()
            .all(|target| self.get(target).is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeploymentTarget, &BTreeSet<String>)> {
        DeploymentTarget::ALL
            .into_iter()
            .map(move |target| (target, self.get(target)))
    }
}

/// Parse a comma-separated coordinate list; blanks are dropped.
pub fn parse_list(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn render_list(coordinates: &BTreeSet<String>) -> String {
    coordinates
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",")
}
