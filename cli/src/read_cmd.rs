//! `forage read`

use clap::Parser;
use serde_json::Value;

use crate::WorkspaceArgs;
use crate::settings::ToolingSettings;

#[derive(Debug, Clone, Default, Parser)]
pub struct ReadArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Only report instances of this factory type (e.g. `jdbc`).
    #[arg(long = "factory", value_name = "FACTORY")]
    pub factory: Option<String>,
}

pub fn run(args: &ReadArgs, settings: &ToolingSettings) -> anyhow::Result<Value> {
    let workspace = args.workspace.open(settings)?;
    let report = workspace.read(args.factory.as_deref())?;
    tracing::debug!(
        "Read {} instances from {}",
        report.instances.len(),
        workspace.dir().display()
    );
    crate::report(&report)
}
