//! # Script Replay
//!
//! Applies a script's operations to a ledger one at a time. A rejected
//! operation is recorded and replay continues with the next one; the
//! ledger is unchanged by the rejection.

use std::path::Path;

use anyhow::Context;
use depledger_state::{ErrorClass, GenesisConfig, Ledger, LedgerError, Outcome};
use serde::Serialize;

use crate::script::ScriptOp;

/// Result of one replayed operation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepResult {
    /// The operation committed.
    Applied {
        /// What it produced.
        outcome: Outcome,
    },
    /// The ledger refused the operation.
    Rejected {
        /// Machine-readable error code.
        code: &'static str,
        /// Error class.
        class: ErrorClass,
        /// Human-readable message.
        message: String,
    },
}

impl From<Result<Outcome, LedgerError>> for StepResult {
    fn from(result: Result<Outcome, LedgerError>) -> Self {
        match result {
            Ok(outcome) => Self::Applied { outcome },
            Err(err) => Self::Rejected {
                code: err.code(),
                class: err.class(),
                message: err.to_string(),
            },
        }
    }
}

/// One line of a replay report.
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    /// Zero-based position in the script.
    pub index: usize,
    /// The operation's `op` tag.
    pub op: &'static str,
    #[serde(flatten)]
    pub result: StepResult,
}

impl Step {
    /// Whether the operation committed.
    pub fn is_applied(&self) -> bool {
        matches!(self.result, StepResult::Applied { .. })
    }
}

/// Every step of a replay.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<Step>,
}

impl ReplayReport {
    /// Operations that committed.
    pub fn applied(&self) -> usize {
        self.steps.iter().filter(|s| s.is_applied()).count()
    }

    /// Operations the ledger refused.
    pub fn rejected(&self) -> usize {
        self.steps.len() - self.applied()
    }
}

/// Fresh ledger, seeded from `genesis` when given.
pub fn open_ledger(genesis: Option<&Path>) -> anyhow::Result<Ledger> {
    match genesis {
        Some(path) => {
            let config = GenesisConfig::load(path)?;
            let ledger = Ledger::from_genesis(&config)
                .with_context(|| format!("applying genesis {}", path.display()))?;
            tracing::info!(path = %path.display(), "loaded genesis configuration");
            Ok(ledger)
        }
        None => Ok(Ledger::new()),
    }
}

/// Apply `operations` in order. Each operation's repository references
/// are resolved against the state left by the operations before it.
pub fn replay(ledger: &mut Ledger, operations: Vec<ScriptOp>) -> ReplayReport {
    let steps = operations
        .into_iter()
        .enumerate()
        .map(|(index, operation)| {
            let op = operation.name();
            let applied = operation
                .resolve(ledger)
                .and_then(|resolved| ledger.apply(resolved));
            let result = StepResult::from(applied);
            if let StepResult::Rejected { code, .. } = &result {
                tracing::warn!(index, op, code, "operation rejected");
            }
            Step { index, op, result }
        })
        .collect();
    ReplayReport { steps }
}
