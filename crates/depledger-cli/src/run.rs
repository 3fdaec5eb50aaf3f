//! # Run Subcommand
//!
//! Replays a script against a fresh ledger and prints every step followed
//! by a summary of the resulting state.
//!
//! `depledger run <script> [--genesis <file>] [--json]`

use std::path::PathBuf;

use clap::Args;
use depledger_core::{AccountId, Amount, ContentDigest, RepositoryId};
use depledger_state::{Ledger, Listing};
use serde::Serialize;

use crate::replay::{open_ledger, replay, ReplayReport, StepResult};
use crate::script::Script;

/// Arguments for the run subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the operation script (YAML, or JSON by extension).
    pub script: PathBuf,

    /// Genesis file seeding balances and developers.
    #[arg(long)]
    pub genesis: Option<PathBuf>,

    /// Emit the report as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// State of one developer after replay.
#[derive(Debug, Serialize)]
pub struct DeveloperSummary {
    pub account: AccountId,
    pub repository: RepositoryId,
    pub tokens: usize,
}

/// Ledger state after replay.
#[derive(Debug, Serialize)]
pub struct StateSummary {
    pub developers: Vec<DeveloperSummary>,
    pub balances: Vec<(AccountId, Amount)>,
    pub active_listings: Vec<Listing>,
    pub journal_length: usize,
    pub journal_head: ContentDigest,
}

impl StateSummary {
    /// Snapshot the queryable state of `ledger`.
    pub fn of(ledger: &Ledger) -> Self {
        let developers = ledger
            .developers()
            .into_iter()
            .map(|(account, repository)| DeveloperSummary {
                account,
                repository,
                tokens: ledger
                    .tokens_of(&repository)
                    .map(|tokens| tokens.len())
                    .unwrap_or_default(),
            })
            .collect();
        Self {
            developers,
            balances: ledger
                .balances()
                .accounts()
                .map(|(account, amount)| (*account, *amount))
                .collect(),
            active_listings: ledger.active_listings().into_iter().cloned().collect(),
            journal_length: ledger.journal().len(),
            journal_head: ledger.journal().head(),
        }
    }
}

/// Everything `run` prints.
#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub applied: usize,
    pub rejected: usize,
    #[serde(flatten)]
    pub report: ReplayReport,
    pub state: StateSummary,
}

/// Replay the script named by `args`.
pub fn execute(args: &RunArgs) -> anyhow::Result<RunOutput> {
    let script = Script::load(&args.script)?;
    if let Some(description) = &script.description {
        tracing::info!(%description, "running script");
    }
    let mut ledger = open_ledger(args.genesis.as_deref())?;
    let report = replay(&mut ledger, script.operations);
    Ok(RunOutput {
        applied: report.applied(),
        rejected: report.rejected(),
        report,
        state: StateSummary::of(&ledger),
    })
}

/// Render `output` as plain text.
pub fn render_text(output: &RunOutput) -> String {
    let mut lines = Vec::new();
    for step in &output.report.steps {
        let detail = match &step.result {
            StepResult::Applied { outcome } => {
                serde_json::to_string(outcome).unwrap_or_else(|_| "applied".to_string())
            }
            StepResult::Rejected { code, message, .. } => format!("REJECTED {code}: {message}"),
        };
        lines.push(format!("[{:>3}] {:<20} {detail}", step.index, step.op));
    }
    lines.push(String::new());
    lines.push(format!(
        "{} applied, {} rejected",
        output.applied, output.rejected
    ));

    let state = &output.state;
    lines.push(String::new());
    lines.push("developers:".to_string());
    for dev in &state.developers {
        lines.push(format!(
            "  {} repository={} tokens={}",
            dev.account, dev.repository, dev.tokens
        ));
    }
    lines.push("balances:".to_string());
    for (account, amount) in &state.balances {
        lines.push(format!("  {account} {amount}"));
    }
    lines.push("active listings:".to_string());
    for listing in &state.active_listings {
        lines.push(format!(
            "  {} {} price={}",
            listing.id, listing.token, listing.price
        ));
    }
    lines.push(format!(
        "journal: {} receipts, head {}",
        state.journal_length, state.journal_head
    ));
    lines.join("\n")
}

/// Entry point for `depledger run`.
pub fn run(args: &RunArgs) -> anyhow::Result<()> {
    let output = execute(args)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", render_text(&output));
    }
    Ok(())
}
