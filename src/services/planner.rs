//! Proposed → Confirmed → Executed workflow shared by every destructive
//! command.

use crate::domain::CleanupError;
use anyhow::Result;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use tracing::{error, info, warn};

/// Asks the operator to approve a plan.
pub trait Confirm: Send + Sync {
    /// Shows `plan` and asks `question`; true only on an explicit yes.
    fn confirm(&self, plan: &str, question: &str) -> bool;
}

/// Prompts on stdout and reads the answer from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, plan: &str, question: &str) -> bool {
        let mut stdout = io::stdout().lock();
        if write!(stdout, "{plan}{question} [y/N] ")
            .and_then(|_| stdout.flush())
            .is_err()
        {
            return false;
        }
        drop(stdout);

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_affirmative(&answer),
            Err(_) => false,
        }
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// The force-or-prompt decision.
pub struct ConfirmGate<'a> {
    force: bool,
    prompt: &'a dyn Confirm,
}

impl<'a> ConfirmGate<'a> {
    pub fn new(force: bool, prompt: &'a dyn Confirm) -> Self {
        Self { force, prompt }
    }

    pub fn confirm(&self, plan: &str, question: &str) -> bool {
        if self.force {
            return true;
        }
        self.prompt.confirm(plan, question)
    }
}

/// One step of a batch, applied to each confirmed item independently.
pub trait ItemAction<T> {
    /// Log prefix for the action, e.g. "removing dangling image"
    fn describe(&self) -> &str;

    fn apply(&self, item: &T) -> Result<()>;
}

/// Candidates that have been computed but not acted on.
#[derive(Debug)]
pub struct Proposal<T> {
    items: Vec<T>,
}

impl<T: Display> Proposal<T> {
    /// `None` for an empty candidate set: the operation is a silent no-op.
    /// Items are ordered and de-duplicated by their display form.
    pub fn new<I: IntoIterator<Item = T>>(candidates: I) -> Option<Self> {
        let mut keyed: Vec<(String, T)> = candidates
            .into_iter()
            .map(|item| (item.to_string(), item))
            .collect();
        if keyed.is_empty() {
            return None;
        }

        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        keyed.dedup_by(|a, b| a.0 == b.0);

        Some(Self {
            items: keyed.into_iter().map(|(_, item)| item).collect(),
        })
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn render(&self, heading: &str) -> String {
        let mut plan = format!("{heading}\n");
        for item in &self.items {
            plan.push_str(&format!(" - {item}\n"));
        }
        plan
    }

    pub fn confirm(self, gate: &ConfirmGate, heading: &str, question: &str) -> Option<Confirmed<T>> {
        if gate.confirm(&self.render(heading), question) {
            Some(Confirmed { items: self.items })
        } else {
            info!("declined, nothing done");
            None
        }
    }

    /// Skips confirmation; only for non-destructive batches.
    pub fn accept(self) -> Confirmed<T> {
        Confirmed { items: self.items }
    }
}

/// Candidates approved for execution.
#[derive(Debug)]
pub struct Confirmed<T> {
    items: Vec<T>,
}

impl<T: Display> Confirmed<T> {
    /// Runs `action` on every item in order. A failure is recorded against
    /// its item and never stops the batch; completed items are not rolled
    /// back.
    pub fn execute(self, action: &dyn ItemAction<T>) -> ExecutionReport {
        let mut report = ExecutionReport::default();

        for item in &self.items {
            info!("{}: {}", action.describe(), item);
            match action.apply(item) {
                Ok(()) => report.succeeded.push(item.to_string()),
                Err(e) => {
                    error!("{} failed for {}: {:#}", action.describe(), item, e);
                    report.failures.push(CleanupError::ItemActionFailed {
                        item: item.to_string(),
                        reason: format!("{e:#}"),
                    });
                }
            }
        }

        if !report.failures.is_empty() {
            warn!(
                "{} of {} actions failed",
                report.failures.len(),
                report.attempted()
            );
        }

        report
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub succeeded: Vec<String>,
    pub failures: Vec<CleanupError>,
}

impl ExecutionReport {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of a planned command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No candidates
    Nothing,
    /// The operator said no
    Declined,
    Executed(ExecutionReport),
}

impl Outcome {
    pub fn report(&self) -> Option<&ExecutionReport> {
        match self {
            Self::Executed(report) => Some(report),
            _ => None,
        }
    }
}

/// Proposes, confirms and executes `candidates` with `action`.
pub fn run_plan<T: Display>(
    candidates: impl IntoIterator<Item = T>,
    gate: &ConfirmGate,
    heading: &str,
    question: &str,
    action: &dyn ItemAction<T>,
) -> Outcome {
    let Some(proposal) = Proposal::new(candidates) else {
        return Outcome::Nothing;
    };

    match proposal.confirm(gate, heading, question) {
        Some(confirmed) => Outcome::Executed(confirmed.execute(action)),
        None => Outcome::Declined,
    }
}
