//! `forage` command line.
//!
//! Every invocation prints exactly one JSON document on stdout:
//! `{"success":true,...}` with the command's report, or
//! `{"success":false,"error":"..."}` with exit code 1.

pub mod read_cmd;
pub mod settings;
pub mod write_cmd;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use forage_config::{ConfigRegistry, RuntimeSettings};
use forage_tooling::{APPLICATION_PROPERTIES, Catalog, FileStrategy, Workspace};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::read_cmd::ReadArgs;
use crate::settings::ToolingSettings;
use crate::write_cmd::WriteArgs;

#[derive(Debug, Parser)]
#[command(name = "forage", version, about = "Read and write Forage configuration files")]
pub struct Cli {
    /// Process property, repeatable (e.g. `-D forage.tooling.strategy=application`).
    #[arg(
        short = 'D',
        value_name = "KEY=VALUE",
        value_parser = parse_property,
        global = true
    )]
    pub properties: Vec<(String, String)>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List configured instances, implied beans and dependency lists.
    Read(ReadArgs),
    /// Apply a batch of properties, or delete a named instance.
    Write(WriteArgs),
}

impl Command {
    fn dir(&self) -> Option<&Path> {
        match self {
            Self::Read(args) => args.workspace.dir.as_deref(),
            Self::Write(args) => args.workspace.dir.as_deref(),
        }
    }
}

/// Options shared by every command that opens a directory.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct WorkspaceArgs {
    /// Directory holding the configuration files.
    #[arg(long = "dir", value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// File strategy: per-factory or application.
    #[arg(long = "strategy", value_name = "STRATEGY")]
    pub strategy: Option<String>,

    /// Catalog JSON replacing the built-in one.
    #[arg(long = "catalog", value_name = "PATH")]
    pub catalog: Option<PathBuf>,
}

impl WorkspaceArgs {
    /// Flags first, then resolved settings.
    pub fn open(&self, settings: &ToolingSettings) -> anyhow::Result<Workspace> {
        let strategy = match &self.strategy {
            Some(raw) => raw.parse::<FileStrategy>()?,
            None => settings.strategy,
        };
        let catalog = match self.catalog.as_ref().or(settings.catalog_path.as_ref()) {
            Some(path) => Catalog::load(path)
                .with_context(|| format!("failed to load catalog {}", path.display()))?,
            None => Catalog::builtin()?,
        };
        let dir = self
            .dir
            .clone()
            .unwrap_or_else(|| settings.directory.clone());
        tracing::debug!("Opening {} with strategy {strategy}", dir.display());
        Ok(Workspace::new(dir, catalog, strategy))
    }
}

fn parse_property(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty property name in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Run `cli`, reading batch input from `stdin` when a command needs it.
pub fn run(cli: Cli, stdin: impl Read) -> anyhow::Result<Value> {
    let registry = ConfigRegistry::new().with_runtime(host_settings(cli.command.dir())?);
    for (key, value) in &cli.properties {
        registry.set_property(key.as_str(), value.as_str());
    }
    let settings = ToolingSettings::load(&registry)?;

    match cli.command {
        Command::Read(args) => read_cmd::run(&args, &settings),
        Command::Write(args) => write_cmd::run(&args, &settings, stdin),
    }
}

/// The detected host's `application.properties` in the target directory.
fn host_settings(dir: Option<&Path>) -> anyhow::Result<Option<RuntimeSettings>> {
    let Some(kind) = forage_config::detected_runtime() else {
        return Ok(None);
    };
    let path = dir.unwrap_or_else(|| Path::new(".")).join(APPLICATION_PROPERTIES);
    if !path.is_file() {
        return Ok(None);
    }
    tracing::debug!("Using {} as {}", path.display(), kind.label());
    RuntimeSettings::from_file(kind, &path)
        .map(Some)
        .with_context(|| format!("failed to load {}", path.display()))
}

/// Serialize a command report as the body of a success envelope.
pub(crate) fn report<T: Serialize>(report: &T) -> anyhow::Result<Value> {
    serde_json::to_value(report).context("failed to serialize report")
}

/// Wrap a command outcome in the output envelope.
pub fn envelope(outcome: anyhow::Result<Value>) -> (Value, ExitCode) {
    match outcome {
        Ok(body) => {
            let mut document = Map::new();
            document.insert("success".to_string(), Value::Bool(true));
            match body {
                Value::Object(fields) => document.extend(fields),
                Value::Null => {}
                other => {
                    document.insert("result".to_string(), other);
                }
            }
            (Value::Object(document), ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::debug!("Command failed: {err:?}");
            (failure(&format!("{err:#}")), ExitCode::FAILURE)
        }
    }
}

/// Error envelope for `message`.
pub fn failure(message: &str) -> Value {
    serde_json::json!({
        "success": false,
        "error": message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn property_flags_split_on_first_equals() {
        let cli = Cli::try_parse_from([
            "forage",
            "-D",
            "forage.tooling.strategy=application",
            "read",
            "-Dforage.jdbc.url=jdbc:h2:mem:a=b",
        ])
        .expect("parse");
        assert_eq!(
            cli.properties,
            vec![
                ("forage.tooling.strategy".to_string(), "application".to_string()),
                ("forage.jdbc.url".to_string(), "jdbc:h2:mem:a=b".to_string()),
            ]
        );
    }

    #[test]
    fn property_without_equals_is_rejected() {
        assert!(Cli::try_parse_from(["forage", "-D", "novalue", "read"]).is_err());
        assert!(Cli::try_parse_from(["forage", "-D", "=x", "read"]).is_err());
    }

    #[test]
    fn success_envelope_leads_with_success_flag() {
        let (document, _) = envelope(Ok(serde_json::json!({ "instances": [] })));
        assert_eq!(
            serde_json::to_string(&document).expect("serialize"),
            r#"{"success":true,"instances":[]}"#
        );
    }

    #[test]
    fn error_envelope_carries_the_error_chain() {
        let err = anyhow::anyhow!("instance not found").context("delete failed");
        let (document, _) = envelope(Err(err));
        assert_eq!(
            document,
            serde_json::json!({
                "success": false,
                "error": "delete failed: instance not found",
            })
        );
    }

    #[test]
    fn flags_override_resolved_settings() -> anyhow::Result<()> {
        let settings = ToolingSettings {
            catalog_path: None,
            strategy: FileStrategy::PerFactory,
            directory: PathBuf::from("/from/settings"),
        };
        let args = WorkspaceArgs {
            dir: Some(PathBuf::from("/from/flag")),
            strategy: Some("application".to_string()),
            catalog: None,
        };
        let workspace = args.open(&settings)?;
        assert_eq!(workspace.dir(), std::path::Path::new("/from/flag"));
        assert_eq!(workspace.strategy(), FileStrategy::Application);

        let workspace = WorkspaceArgs::default().open(&settings)?;
        assert_eq!(workspace.dir(), std::path::Path::new("/from/settings"));
        assert_eq!(workspace.strategy(), FileStrategy::PerFactory);
        Ok(())
    }
}
