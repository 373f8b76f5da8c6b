//! Phase 3: plan and execute removals.
//!
//! The planner turns assessments into batches of [`ExecutionStep`]s; the
//! [`Executor`] runs them with prerequisites, linked tools, per-step
//! commits, validation and rollback.

mod executor;
pub mod linked_tool;
pub mod operator;
mod planner;
mod types;
pub mod validation;

pub use executor::Executor;
pub use linked_tool::{CommandLinkedTool, LinkedTool};
pub use operator::{AutoApprove, Operator, ScriptedOperator, TerminalOperator};
pub use planner::{plan_batches, plan_from_rows, plan_rows, PlanRow};
pub use types::{
    Batch, BatchResult, BatchStatus, ExecutionReport, ExecutionStep, ExecutionSummary, RemovalPlan,
    StepStatus,
};
pub use validation::Validator;
