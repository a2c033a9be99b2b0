//! `forage write`
//!
//! The batch is a flat JSON object, taken from `--input` or stdin. String,
//! number and boolean values are accepted; numbers and booleans are written
//! in their JSON spelling.

use std::io::Read;

use anyhow::{Context, bail};
use clap::Parser;
use indexmap::IndexMap;
use serde_json::Value;

use crate::WorkspaceArgs;
use crate::settings::ToolingSettings;

#[derive(Debug, Clone, Default, Parser)]
pub struct WriteArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Batch as a JSON object; read from stdin when omitted.
    #[arg(long = "input", value_name = "JSON", conflicts_with = "delete")]
    pub input: Option<String>,

    /// Delete the instance given by `--name` instead of writing.
    #[arg(long = "delete", requires = "name")]
    pub delete: bool,

    /// Instance to delete.
    #[arg(long = "name", value_name = "NAME", requires = "delete")]
    pub name: Option<String>,
}

pub fn run(args: &WriteArgs, settings: &ToolingSettings, stdin: impl Read) -> anyhow::Result<Value> {
    let workspace = args.workspace.open(settings)?;

    if args.delete {
        let Some(name) = args.name.as_deref() else {
            bail!("--delete requires --name");
        };
        let report = workspace
            .delete(name)
            .with_context(|| format!("failed to delete instance {name:?}"))?;
        return crate::report(&report);
    }

    let text = match &args.input {
        Some(text) => text.clone(),
        None => std::io::read_to_string(stdin).context("failed to read input from stdin")?,
    };
    let batch = parse_batch(&text)?;
    let report = workspace.write(&batch)?;
    crate::report(&report)
}

/// Flatten a JSON object into ordered string pairs.
pub fn parse_batch(text: &str) -> anyhow::Result<IndexMap<String, String>> {
    if text.trim().is_empty() {
        bail!("no input: pass --input or a JSON object on stdin");
    }
    let raw: IndexMap<String, Value> =
        serde_json::from_str(text).context("input must be a JSON object")?;

    raw.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(text) => text,
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                other => bail!("value of {key:?} must be a string, number or boolean, got {other}"),
            };
            Ok((key, value))
        })
        .collect()
}
