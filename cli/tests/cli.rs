//! End-to-end tests of the `forage` binary.
//!
//! ## Exit codes
//! - 0: `{"success":true,...}`
//! - 1: `{"success":false,"error":...}`

use std::fs;
use std::path::Path;

use anyhow::Result;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::Value as JsonValue;
use tempfile::TempDir;

const JDBC_FILE: &str = "forage-datasource-factory.properties";

/// `forage` running in `cwd` with no ambient Forage configuration.
fn forage_command(cwd: &Path, config_home: &Path) -> Result<assert_cmd::Command> {
    let mut cmd = assert_cmd::Command::cargo_bin("forage")?;
    cmd.current_dir(cwd);
    cmd.env("XDG_CONFIG_HOME", config_home);
    for var in [
        "FORAGE_CONFIG_DIR",
        "FORAGE_TOOLING_STRATEGY",
        "FORAGE_TOOLING_DIRECTORY",
        "FORAGE_TOOLING_CATALOG_PATH",
        "FORAGE_RUNTIME",
        "QUARKUS_PROFILE",
        "SPRING_PROFILES_ACTIVE",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    Ok(cmd)
}

struct Context {
    dir: TempDir,
    config_home: TempDir,
}

impl Context {
    fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
            config_home: TempDir::new()?,
        })
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn command(&self) -> Result<assert_cmd::Command> {
        forage_command(self.dir.path(), self.config_home.path())
    }

    fn file(&self, name: &str) -> Result<String> {
        Ok(fs::read_to_string(self.path().join(name))?)
    }
}

fn json(output: &std::process::Output) -> Result<JsonValue> {
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn read_of_empty_directory_succeeds() -> Result<()> {
    let ctx = Context::new()?;
    let output = ctx.command()?.arg("read").output()?;
    assert_eq!(output.status.code(), Some(0));

    let doc = json(&output)?;
    assert_eq!(doc["success"], JsonValue::Bool(true));
    assert_eq!(doc["instances"], serde_json::json!([]));
    Ok(())
}

#[test]
fn write_from_input_then_read_back() -> Result<()> {
    let ctx = Context::new()?;
    let batch = serde_json::json!({
        "forage.orders.jdbc.url": "jdbc:postgresql://db/orders",
        "forage.orders.jdbc.db.kind": "postgresql",
        "forage.orders.jdbc.pool.max.size": 20,
    });
    ctx.command()?
        .args(["write", "--input", &batch.to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""success": true"#));

    assert!(
        ctx.file(JDBC_FILE)?
            .contains("forage.orders.jdbc.pool.max.size=20")
    );

    let output = ctx
        .command()?
        .args(["read", "--factory", "jdbc"])
        .output()?;
    let doc = json(&output)?;
    assert_eq!(doc["instances"][0]["name"], "orders");
    assert_eq!(doc["instances"][0]["kind"], "postgresql");
    assert_eq!(
        doc["dependencies"]["base"],
        serde_json::json!(["io.kaoto.forage:forage-jdbc-postgresql"])
    );
    Ok(())
}

#[test]
fn write_reads_batch_from_stdin() -> Result<()> {
    let ctx = Context::new()?;
    ctx.command()?
        .arg("write")
        .write_stdin(r#"{"forage.agent.id":"assistant","forage.ollama.model.name":"granite4:3b"}"#)
        .assert()
        .success();

    assert!(
        ctx.file("forage-agent-factory.properties")?
            .contains("forage.assistant.ollama.model.name=granite4:3b")
    );
    Ok(())
}

#[test]
fn strategy_comes_from_flag_property_or_environment() -> Result<()> {
    let batch = r#"{"forage.orders.jdbc.url":"jdbc:h2:mem:orders"}"#;

    let by_flag = Context::new()?;
    by_flag
        .command()?
        .args(["write", "--strategy", "application", "--input", batch])
        .assert()
        .success();

    let by_property = Context::new()?;
    by_property
        .command()?
        .args(["-D", "forage.tooling.strategy=application", "write", "--input", batch])
        .assert()
        .success();

    let by_env = Context::new()?;
    by_env
        .command()?
        .env("FORAGE_TOOLING_STRATEGY", "application")
        .args(["write", "--input", batch])
        .assert()
        .success();

    for ctx in [&by_flag, &by_property, &by_env] {
        assert!(!ctx.path().join(JDBC_FILE).exists());
        assert!(
            ctx.file("application.properties")?
                .contains("forage.orders.jdbc.url=jdbc:h2:mem:orders")
        );
    }
    Ok(())
}

#[test]
fn detected_host_settings_feed_the_strategy() -> Result<()> {
    let batch = r#"{"forage.orders.jdbc.url":"jdbc:h2:mem:orders"}"#;
    let host_file = "forage.tooling.strategy=application\n";

    let hosted = Context::new()?;
    fs::write(hosted.path().join("application.properties"), host_file)?;
    hosted
        .command()?
        .env("FORAGE_RUNTIME", "quarkus")
        .args(["write", "--input", batch])
        .assert()
        .success();
    assert!(!hosted.path().join(JDBC_FILE).exists());
    assert!(
        hosted
            .file("application.properties")?
            .contains("forage.orders.jdbc.url=jdbc:h2:mem:orders")
    );

    // Without a host runtime the same file is only a write target.
    let plain = Context::new()?;
    fs::write(plain.path().join("application.properties"), host_file)?;
    plain
        .command()?
        .args(["write", "--input", batch])
        .assert()
        .success();
    assert!(plain.path().join(JDBC_FILE).exists());
    Ok(())
}

#[test]
fn flag_overrides_environment() -> Result<()> {
    let ctx = Context::new()?;
    ctx.command()?
        .env("FORAGE_TOOLING_STRATEGY", "application")
        .args([
            "write",
            "--strategy",
            "per-factory",
            "--input",
            r#"{"forage.orders.jdbc.url":"u"}"#,
        ])
        .assert()
        .success();
    assert!(ctx.path().join(JDBC_FILE).exists());
    Ok(())
}

#[test]
fn dir_flag_targets_another_directory() -> Result<()> {
    let ctx = Context::new()?;
    let target = TempDir::new()?;
    ctx.command()?
        .arg("write")
        .arg("--dir")
        .arg(target.path())
        .args(["--input", r#"{"forage.orders.jdbc.url":"u"}"#])
        .assert()
        .success();
    assert!(target.path().join(JDBC_FILE).exists());
    assert!(!ctx.path().join(JDBC_FILE).exists());
    Ok(())
}

#[test]
fn delete_removes_instance_and_reports_pruned_coordinates() -> Result<()> {
    let ctx = Context::new()?;
    ctx.command()?
        .args([
            "write",
            "--input",
            r#"{"forage.myPG.jdbc.url":"jdbc:postgresql://db/pg","forage.myPG.jdbc.db.kind":"postgresql"}"#,
        ])
        .assert()
        .success();

    let output = ctx
        .command()?
        .args(["write", "--delete", "--name", "myPG"])
        .output()?;
    assert_eq!(output.status.code(), Some(0));
    let doc = json(&output)?;
    assert_eq!(doc["instance"], "myPG");
    assert_eq!(
        doc["removedDependencies"]["base"],
        serde_json::json!(["io.kaoto.forage:forage-jdbc-postgresql"])
    );
    assert!(!ctx.file(JDBC_FILE)?.contains("myPG"));
    Ok(())
}

#[test]
fn delete_of_unknown_instance_fails_with_envelope() -> Result<()> {
    let ctx = Context::new()?;
    let output = ctx
        .command()?
        .args(["write", "--delete", "--name", "billing"])
        .output()?;
    assert_eq!(output.status.code(), Some(1));

    let doc = json(&output)?;
    assert_eq!(doc["success"], JsonValue::Bool(false));
    assert!(
        doc["error"]
            .as_str()
            .is_some_and(|error| error.contains("billing"))
    );
    Ok(())
}

#[test]
fn invalid_input_fails_with_envelope() -> Result<()> {
    let ctx = Context::new()?;
    for input in ["not json", r#"{"logging.level.root":"INFO"}"#, ""] {
        ctx.command()?
            .args(["write", "--input", input])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#""success": false"#));
    }
    assert!(fs::read_dir(ctx.path())?.next().is_none());
    Ok(())
}

#[test]
fn usage_errors_use_the_envelope_too() -> Result<()> {
    let ctx = Context::new()?;
    ctx.command()?
        .args(["write", "--delete"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(r#""success": false"#));
    ctx.command()?
        .args(["read", "--strategy", "yaml"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("yaml"));
    Ok(())
}

#[test]
fn custom_catalog_replaces_builtin() -> Result<()> {
    let ctx = Context::new()?;
    let catalog = ctx.config_home.path().join("catalog.json");
    fs::write(
        &catalog,
        r#"{
            "version": "test",
            "factories": [{
                "key": "kv",
                "propertiesFileName": "forage-kv.properties",
                "beanKinds": [{ "name": "memory" }]
            }]
        }"#,
    )?;

    ctx.command()?
        .arg("write")
        .arg("--catalog")
        .arg(&catalog)
        .args(["--input", r#"{"forage.sessions.memory.size":"64"}"#])
        .assert()
        .success();
    assert_eq!(
        ctx.file("forage-kv.properties")?.lines().last(),
        Some("forage.sessions.memory.size=64")
    );
    Ok(())
}
