mod actions;
mod auditor;
mod cleanup_service;
mod inventory;
pub mod matcher;
pub mod planner;
mod usage;

pub use auditor::Auditor;
pub use cleanup_service::{CleanupService, CommandOptions, DoctorReport, ReportSection, Severity};
pub use inventory::{Inventory, Scope};
pub use matcher::{Matcher, select};
pub use planner::{
    Confirm, ConfirmGate, Confirmed, ExecutionReport, ItemAction, Outcome, Proposal,
    StdinConfirm,
};
pub use usage::UsageGraph;
