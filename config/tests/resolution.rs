//! End-to-end resolution through the process environment and on-disk files.

use std::env;
use std::time::Duration;

use forage_config::modules::{self, jdbc, ollama};
use forage_config::{
    ConfigError, ConfigRegistry, EnvironmentSource, LocateOptions, ParameterIdentity,
    RuntimeKind, RuntimeSettings, ValueOrigin,
};
use pretty_assertions::assert_eq;
use serial_test::serial;
use tempfile::TempDir;

fn url(prefix: Option<&str>) -> ParameterIdentity {
    ParameterIdentity::new(jdbc::MODULE, jdbc::URL)
        .expect("valid name")
        .with_prefix(prefix)
}

#[test]
#[serial]
fn process_environment_beats_properties_file() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join(jdbc::MODULE.file_name()),
        "forage.jdbc.url=jdbc:h2:mem:file\n",
    )
    .expect("write");

    unsafe {
        env::set_var("FORAGE_JDBC_URL", "jdbc:h2:mem:env");
    }

    let registry = ConfigRegistry::new();
    let options = LocateOptions {
        configured_dir: Some(dir.path().to_path_buf()),
        ..LocateOptions::default()
    };
    assert!(registry.locate_file(&jdbc::MODULE, &options).expect("locate"));
    assert_eq!(registry.load(&url(None)).as_deref(), Some("jdbc:h2:mem:env"));
    assert_eq!(
        registry.origin(&url(None)),
        Some(ValueOrigin::Resolved("environment".to_string()))
    );

    unsafe {
        env::remove_var("FORAGE_JDBC_URL");
    }

    // Cached: removing the variable does not change an already loaded value.
    assert_eq!(registry.load(&url(None)).as_deref(), Some("jdbc:h2:mem:env"));
    // A fresh registry falls through to the file.
    let fresh = ConfigRegistry::new();
    fresh.locate_file(&jdbc::MODULE, &options).expect("locate");
    assert_eq!(fresh.load(&url(None)).as_deref(), Some("jdbc:h2:mem:file"));
}

#[test]
#[serial]
fn empty_environment_value_counts_as_absent() {
    unsafe {
        env::set_var("FORAGE_ORDERS_JDBC_URL", "");
    }
    let registry = ConfigRegistry::new();
    registry.set_property("forage.orders.jdbc.url", "jdbc:postgresql://db/orders");
    assert_eq!(
        registry.load(&url(Some("orders"))).as_deref(),
        Some("jdbc:postgresql://db/orders")
    );
    unsafe {
        env::remove_var("FORAGE_ORDERS_JDBC_URL");
    }
}

#[test]
fn runtime_settings_sit_between_properties_and_file() {
    let dir = TempDir::new().expect("tempdir");
    let app = dir.path().join("application.properties");
    std::fs::write(&app, "forage.jdbc.url=jdbc:runtime\n").expect("write");

    let runtime = RuntimeSettings::from_file(RuntimeKind::SpringBoot, &app).expect("runtime");
    let registry = ConfigRegistry::new()
        .with_environment(EnvironmentSource::fixed(std::iter::empty::<(String, String)>()))
        .with_runtime(Some(runtime));
    let resolved = registry.resolve(&url(None)).expect("resolved");
    assert_eq!(resolved.value, "jdbc:runtime");
    assert_eq!(resolved.source, "spring-boot settings");

    registry.set_property("forage.jdbc.url", "jdbc:property");
    assert_eq!(
        registry.resolve(&url(None)).map(|r| r.value).as_deref(),
        Some("jdbc:property")
    );
}

#[test]
fn bootstrap_discovers_named_instances_from_file() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join(jdbc::MODULE.file_name()),
        "# two data sources\n\
         forage.orders.jdbc.url=jdbc:postgresql://db/orders\n\
         forage.orders.jdbc.transaction.enabled=true\n\
         forage.audit.jdbc.url=jdbc:mariadb://db/audit\n\
         forage.audit.jdbc.connection.timeout=5s\n\
         forage.jdbc.url=jdbc:h2:mem:default\n",
    )
    .expect("write");

    let registry = ConfigRegistry::new()
        .with_environment(EnvironmentSource::fixed(std::iter::empty::<(String, String)>()));
    let mut table = jdbc::parameters().expect("table");
    let canonical = table.len();
    let options = LocateOptions {
        working_dir: Some(dir.path().to_path_buf()),
        ..LocateOptions::default()
    };

    let prefixes = modules::bootstrap(&registry, &mut table, &options).expect("bootstrap");
    assert_eq!(prefixes, vec!["audit".to_string(), "orders".to_string()]);
    assert_eq!(table.len(), canonical * 3);
    assert_eq!(registry.get(&url(None)).as_deref(), Some("jdbc:h2:mem:default"));

    let orders = jdbc::DataSourceConfig::new(&registry, &table, Some("orders"));
    assert!(orders.transaction_enabled().expect("tx"));
    assert_eq!(orders.connection_timeout().expect("timeout"), Duration::from_secs(30));

    let audit = jdbc::DataSourceConfig::new(&registry, &table, Some("audit"));
    assert_eq!(audit.url().expect("url"), "jdbc:mariadb://db/audit");
    assert_eq!(audit.connection_timeout().expect("timeout"), Duration::from_secs(5));
    assert!(!audit.transaction_enabled().expect("tx"));
}

#[test]
fn missing_model_name_fails_only_when_read() {
    let registry = ConfigRegistry::new()
        .with_environment(EnvironmentSource::fixed(std::iter::empty::<(String, String)>()));
    let mut table = ollama::parameters().expect("table");
    modules::bootstrap(&registry, &mut table, &LocateOptions::default()).expect("bootstrap");

    let config = ollama::OllamaConfig::new(&registry, &table, None);
    assert_eq!(config.base_url().expect("base url"), "http://localhost:11434");
    assert!(matches!(
        config.model_name(),
        Err(ConfigError::MissingRequired { ref name, .. }) if name == "forage.ollama.model.name"
    ));
}
