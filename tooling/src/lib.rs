//! Tooling half of the Forage configuration engine.
//!
//! Turns a flat batch of key/value pairs into per-factory configuration
//! files, and reads or deletes configured instances, keeping the shared
//! dependency lists in `application.properties` consistent.

pub mod catalog;
pub mod classifier;
pub mod dependencies;
pub mod error;
pub mod inventory;
pub mod mutator;
pub mod projector;
pub mod workspace;

pub use catalog::{BeanKind, Catalog, ConditionalBean, DeploymentTarget, FactoryType, FactoryVariant};
pub use classifier::{KeyClassifier, MatchRule, ParsedKey, strip_root};
pub use dependencies::DependencySet;
pub use error::{Result, ToolingError};
pub use inventory::{BeanInstance, ImpliedBean};
pub use mutator::{PropertiesDocument, RemovedInstance};
pub use projector::{ConfigProjector, FactoryConfig, Projection};
pub use workspace::{
    APPLICATION_PROPERTIES, DeleteReport, FileStrategy, ReadReport, Workspace, WriteReport,
};
