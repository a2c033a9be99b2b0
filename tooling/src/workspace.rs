//! Read, write and delete pipelines over a directory of configuration files.
//!
//! Multi-file writes are sequential with no rollback: a failure part way
//! through leaves earlier files updated. Each individual file is rewritten
//! whole, never streamed.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;

use crate::catalog::{Catalog, FactoryType};
use crate::dependencies::DependencySet;
use crate::error::{Result, ToolingError};
use crate::inventory::{self, BeanInstance, ImpliedBean};
use crate::mutator::{self, PropertiesDocument, RemovedInstance};
use crate::projector::ConfigProjector;

/// Shared host file that also holds the dependency lists.
pub const APPLICATION_PROPERTIES: &str = "application.properties";

/// Which file a factory's properties are written to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileStrategy {
    /// The factory's own `propertiesFileName`.
    #[default]
    PerFactory,
    /// Everything in `application.properties`.
    Application,
}

impl FromStr for FileStrategy {
    type Err = ToolingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-factory" | "factory" => Ok(Self::PerFactory),
            "application" | "application-properties" => Ok(Self::Application),
            other => Err(ToolingError::InvalidInput(format!(
                "unknown file strategy {other:?} (expected per-factory or application)"
            ))),
        }
    }
}

impl fmt::Display for FileStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PerFactory => "per-factory",
            Self::Application => "application",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrittenFactory {
    pub factory_type: String,
    pub bean_name: Option<String>,
    pub kind: Option<String>,
    pub file: PathBuf,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteReport {
    pub factories: Vec<WrittenFactory>,
    pub dependencies: DependencySet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReport {
    pub instance: String,
    pub files: Vec<PathBuf>,
    pub removed_keys: Vec<String>,
    pub removed_dependencies: DependencySet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReport {
    pub instances: Vec<BeanInstance>,
    pub conditional_beans: Vec<ImpliedBean>,
    pub dependencies: DependencySet,
}

/// A directory of configuration files interpreted through a catalog.
#[derive(Debug, Clone)]
pub struct Workspace {
    dir: PathBuf,
    catalog: Catalog,
    strategy: FileStrategy,
}

impl Workspace {
    pub fn new(dir: impl Into<PathBuf>, catalog: Catalog, strategy: FileStrategy) -> Self {
        Self {
            dir: dir.into(),
            catalog,
            strategy,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn strategy(&self) -> FileStrategy {
        self.strategy
    }

    pub fn application_file(&self) -> PathBuf {
        self.dir.join(APPLICATION_PROPERTIES)
    }

    pub fn file_for(&self, factory: &FactoryType) -> PathBuf {
        match self.strategy {
            FileStrategy::PerFactory => self.dir.join(&factory.properties_file_name),
            FileStrategy::Application => self.application_file(),
        }
    }

    /// Every file any factory may live in, regardless of strategy.
    pub fn known_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = Vec::new();
        let candidates = self
            .catalog
            .factories()
            .iter()
            .map(|f| self.dir.join(&f.properties_file_name))
            .chain(std::iter::once(self.application_file()));
        for path in candidates {
            if !files.contains(&path) {
                files.push(path);
            }
        }
        files
    }

    /// Load every existing known file.
    pub fn scan(&self) -> Result<Vec<(PathBuf, PropertiesDocument)>> {
        let mut documents = Vec::new();
        for path in self.known_files() {
            if let Some(document) = mutator::load(&path)? {
                documents.push((path, document));
            }
        }
        Ok(documents)
    }

    /// Project `input` and apply it: factory files first, then the
    /// dependency lists.
    pub fn write(&self, input: &IndexMap<String, String>) -> Result<WriteReport> {
        let projection = ConfigProjector::new(&self.catalog).project(input);
        if projection.is_empty() {
            return Err(ToolingError::InvalidInput(
                "no recognized configuration keys in input".to_string(),
            ));
        }

        let mut written = Vec::new();
        for (factory_key, config) in &projection.factories {
            let Some(factory) = self.catalog.factory(factory_key) else {
                continue;
            };
            let path = self.file_for(factory);
            let outcome = mutator::apply(&path, &config.properties)?;
            tracing::info!(
                "Wrote {} ({} updated, {} added)",
                path.display(),
                outcome.updated,
                outcome.appended
            );
            written.push(WrittenFactory {
                factory_type: factory_key.clone(),
                bean_name: config.bean_name.clone(),
                kind: config.kind.clone(),
                file: path,
                keys: config.properties.keys().cloned().collect(),
            });
        }

        mutator::merge_dependencies(&self.application_file(), &projection.dependencies)?;

        Ok(WriteReport {
            factories: written,
            dependencies: projection.dependencies,
        })
    }

    /// Remove instance `name` everywhere and prune coordinates nothing else needs.
    pub fn delete(&self, name: &str) -> Result<DeleteReport> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ToolingError::InvalidInput(
                "instance name must not be empty".to_string(),
            ));
        }

        // Scan
        let mut documents = self.scan()?;

        // Remove the instance's own keys in memory
        let mut removed = RemovedInstance::default();
        let mut changed_files = Vec::new();
        for (path, document) in &mut documents {
            let from_file = document.remove_instance(name);
            if !from_file.is_empty() {
                changed_files.push(path.clone());
                removed.extend(from_file);
            }
        }
        if removed.is_empty() {
            return Err(ToolingError::InstanceNotFound {
                name: name.to_string(),
                dir: self.dir.clone(),
            });
        }

        // Recompute what the remaining instances need
        let remaining = inventory::collect_instances(&self.catalog, &documents);
        let in_use = inventory::dependencies_in_use(&self.catalog, &remaining);
        let still_needed = in_use.coordinates();
        let mut eligible = self.candidate_dependencies(&removed).difference(&in_use);
        eligible.retain(|coordinate| !still_needed.contains(coordinate));

        // Rewrite instance files, then the dependency lists
        let application = self.application_file();
        for (path, document) in &documents {
            if changed_files.contains(path) && *path != application {
                mutator::save(path, document)?;
            }
        }
        let app_index = documents.iter().position(|(path, _)| *path == application);
        if let Some(index) = app_index
            && let Some((path, document)) = documents.get_mut(index)
        {
            let pruned = document.remove_dependencies(&eligible);
            if pruned || changed_files.contains(path) {
                mutator::save(path, document)?;
                if !changed_files.contains(path) {
                    changed_files.push(path.clone());
                }
            }
        }

        tracing::info!(
            "Deleted instance {name:?}: {} keys from {} files",
            removed.keys.len(),
            changed_files.len()
        );
        Ok(DeleteReport {
            instance: name.to_string(),
            files: changed_files,
            removed_keys: removed.keys,
            removed_dependencies: eligible,
        })
    }

    /// Instances on disk, optionally only those of `factory_filter`.
    pub fn read(&self, factory_filter: Option<&str>) -> Result<ReadReport> {
        if let Some(filter) = factory_filter
            && self.catalog.factory(filter).is_none()
        {
            return Err(ToolingError::InvalidInput(format!(
                "unknown factory type {filter:?}"
            )));
        }

        let documents = self.scan()?;
        let mut instances = inventory::collect_instances(&self.catalog, &documents);
        if let Some(filter) = factory_filter {
            instances.retain(|instance| instance.factory_type == filter);
        }
        let conditional_beans = inventory::implied_beans(&self.catalog, &instances);
        let dependencies = documents
            .iter()
            .find(|(path, _)| *path == self.application_file())
            .map(|(_, document)| document.dependencies())
            .unwrap_or_default();

        Ok(ReadReport {
            instances,
            conditional_beans,
            dependencies,
        })
    }

    // Coordinates the removed keys may have been responsible for.
    fn candidate_dependencies(&self, removed: &RemovedInstance) -> DependencySet {
        let mut candidates = DependencySet::default();
        for segment in &removed.segments {
            if let Some(owner) = self.catalog.owner_of_bean_kind(segment) {
                candidates.extend(&DependencySet::for_instance(owner, Some(segment)));
                continue;
            }
            let Some(factory) = self
                .catalog
                .factory(segment)
                .or_else(|| self.catalog.factory_for_alias(segment))
            else {
                continue;
            };
            candidates.extend(&DependencySet::for_instance(factory, None));
            for kind in removed.kind_values.iter().filter(|k| factory.has_bean_kind(k)) {
                candidates.extend(&DependencySet::for_instance(factory, Some(kind)));
            }
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strategy_parsing() {
        assert_eq!("application".parse::<FileStrategy>().ok(), Some(FileStrategy::Application));
        assert_eq!("Per-Factory".parse::<FileStrategy>().ok(), Some(FileStrategy::PerFactory));
        assert!(matches!(
            "yaml".parse::<FileStrategy>(),
            Err(ToolingError::InvalidInput(_))
        ));
    }

    #[test]
    fn known_files_are_unique_and_end_with_application() {
        let workspace = Workspace::new(
            "/tmp/forage",
            Catalog::builtin().expect("builtin catalog"),
            FileStrategy::Application,
        );
        let files = workspace.known_files();
        assert_eq!(files.last(), Some(&PathBuf::from("/tmp/forage/application.properties")));
        assert_eq!(files.len(), workspace.catalog().factories().len() + 1);
    }

    #[test]
    fn candidates_cover_bean_kind_segments_and_kind_values() {
        let workspace = Workspace::new(
            "/tmp/forage",
            Catalog::builtin().expect("builtin catalog"),
            FileStrategy::PerFactory,
        );
        let removed = RemovedInstance {
            keys: vec!["forage.x.jdbc.db.kind".to_string()],
            kind_values: ["postgresql".to_string()].into_iter().collect(),
            segments: ["jdbc".to_string()].into_iter().collect(),
        };
        let candidates = workspace.candidate_dependencies(&removed);
        assert!(candidates.base.contains("io.kaoto.forage:forage-jdbc-postgresql"));
        assert!(candidates.main.contains("io.kaoto.forage:forage-jdbc"));

        let removed = RemovedInstance {
            keys: vec!["forage.chat.ollama.model.name".to_string()],
            kind_values: Default::default(),
            segments: ["ollama".to_string()].into_iter().collect(),
        };
        let candidates = workspace.candidate_dependencies(&removed);
        assert!(candidates.base.contains("io.kaoto.forage:forage-model-ollama"));
        assert!(candidates.base.contains("io.kaoto.forage:forage-agent"));
    }
}
