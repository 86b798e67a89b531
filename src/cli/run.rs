use std::sync::Arc;

use action_primitives::{ActorRegistry, FailureStrategy, ProcessRunner, RunReport, RunStatus};
use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use tracing::info;

use super::commands::ProcessArgs;
use super::context::CliContext;
use crate::config::Config;
use crate::workspace::Workspace;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyOpt {
    Abort,
    Continue,
    Retry,
}

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub process: ProcessArgs,

    /// Failure strategy (defaults to the configured one)
    #[arg(long)]
    pub strategy: Option<StrategyOpt>,

    /// Attempts per step with `--strategy retry`
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,

    /// Initial retry backoff in milliseconds
    #[arg(long, default_value_t = 500)]
    pub backoff_ms: u64,

    /// Skip validation before running
    #[arg(long)]
    pub no_validate: bool,
}

impl RunArgs {
    pub fn failure_strategy(&self, config: &Config) -> FailureStrategy {
        match self.strategy {
            None => config.failure_strategy,
            Some(StrategyOpt::Abort) => FailureStrategy::Abort,
            Some(StrategyOpt::Continue) => FailureStrategy::Continue,
            Some(StrategyOpt::Retry) => FailureStrategy::Retry {
                max_attempts: self.max_attempts,
                backoff_ms: self.backoff_ms,
            },
        }
    }
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext) -> Result<()> {
    let config = ctx.config();
    let workspace = Workspace::load(&args.process.options(), config)?;
    let strategy = args.failure_strategy(config);
    info!(?strategy, process = %workspace.process.display(), "running process");

    let mut runner = ProcessRunner::new(
        Arc::clone(&workspace.manager),
        Arc::new(ActorRegistry::with_builtins()),
    )
    .with_default_strategy(strategy);
    if args.no_validate || !config.validate_before_run {
        runner = runner.without_validation();
    }

    let report = runner.run().await?;
    if !ctx.output().emit(&report)? {
        print_report(&report);
    }

    match report.status {
        RunStatus::Aborted => bail!(
            "run aborted: {}",
            report
                .error
                .as_ref()
                .map(|failure| failure.message.as_str())
                .unwrap_or("unknown error")
        ),
        RunStatus::Completed if !report.succeeded() => bail!(
            "run completed with {} failed step(s)",
            report.failed_steps().count()
        ),
        RunStatus::Completed => Ok(()),
    }
}

fn print_report(report: &RunReport) {
    println!("Run {} ({:?})", report.run_id, report.status);
    for (index, step) in report.steps.iter().enumerate() {
        let mark = if step.ok { "ok" } else { "FAILED" };
        let retries = if step.attempts > 1 {
            format!(" after {} attempts", step.attempts)
        } else {
            String::new()
        };
        println!(
            "  {:>3}. {} [{}] {}{} ({} ms)",
            index + 1,
            step.name,
            step.actor_type,
            mark,
            retries,
            step.latency_ms
        );
        if let Some(error) = &step.error {
            println!("       {}: {}", error.class, error.message);
        }
    }
    println!(
        "{} step(s), {} failed, {} ms",
        report.steps.len(),
        report.failed_steps().count(),
        report.latency_ms()
    );
}
