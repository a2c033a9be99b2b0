//! Configuration identity and resolution for Forage integrations.
//!
//! Integration modules declare their parameters in a [`ModuleParameterTable`],
//! and read them through a [`ConfigRegistry`] that probes environment
//! variables, process properties, the host runtime's settings and a fallback
//! properties file, in that order.

pub mod accessor;
pub mod convert;
pub mod error;
pub mod identity;
pub mod modules;
pub mod properties;
pub mod registry;
pub mod runtime;
pub mod source;
pub mod table;

pub use accessor::ModuleConfig;
pub use error::{ConfigError, Result};
pub use identity::{ConfigModule, KeyForm, ParameterIdentity, ROOT_TOKEN};
pub use registry::{
    CONFIG_DIR_ENV, CONFIG_DIR_PROPERTY, ConfigKey, ConfigRegistry, Resolved, ValueOrigin,
};
pub use runtime::{RuntimeKind, RuntimeMarkers, detected_runtime};
pub use source::{
    EnvironmentSource, FileOrigin, LocateOptions, ProcessProperties, PropertiesFileSource,
    RuntimeSettings, ValueSource,
};
pub use table::{ModuleParameterTable, ParameterSpec, ParameterTag, ValueType};
