use anyhow::{bail, Result};
use clap::Args;
use serde_json::json;

use super::commands::ProcessArgs;
use super::context::CliContext;
use crate::workspace::Workspace;

#[derive(Args, Clone, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub process: ProcessArgs,
}

pub async fn cmd_validate(args: ValidateArgs, ctx: &CliContext) -> Result<()> {
    let workspace = Workspace::load(&args.process.options(), ctx.config())?;
    let issues = workspace.manager.validate();

    let payload = json!({
        "process": workspace.process,
        "valid": issues.is_empty(),
        "issues": issues,
    });
    if !ctx.output().emit(&payload)? {
        if issues.is_empty() {
            println!("{}: ok", workspace.process.display());
        } else {
            println!("{}: {} issue(s)", workspace.process.display(), issues.len());
            for issue in &issues {
                println!("  - {issue}");
            }
        }
    }

    if !issues.is_empty() {
        bail!("process has {} validation issue(s)", issues.len());
    }
    Ok(())
}
