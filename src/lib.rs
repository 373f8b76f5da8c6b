//! decruft: find legacy technology in a repository, assess the impact of
//! removing it, and remove it in validated, rollback-capable phases.
//!
//! The pipeline runs detection, graph building, assessment, planning and
//! execution in that order:
//!
//! ```ignore
//! use decruft::{assessment::ImpactAssessor, detection::Detector, graph};
//!
//! let items = Detector::new(root, &config.detection, &history).detect(&[])?;
//! let graph = graph::build(root, &items, &config.detection);
//! let assessments = ImpactAssessor::new(root, &config.assessment, &config.risk_thresholds)
//!     .assess_all(&items, &graph);
//! let plan = decruft::execution::plan_batches(&assessments, &config.execution, &config.linked_tools);
//! ```

pub mod assessment;
pub mod cli;
pub mod commands;
pub mod config;
pub mod detection;
pub mod errors;
pub mod execution;
pub mod graph;
pub mod io;
pub mod observability;
pub mod process;
pub mod report;
pub mod snapshot;
pub mod vcs;

pub use crate::assessment::{assess, ImpactAssessment, ImpactAssessor, RiskCategory};
pub use crate::config::{load_config, DecruftConfig, ExecutionMode};
pub use crate::detection::{detect, Detector, FocusArea, ItemType, LegacyItem};
pub use crate::errors::{DecruftError, Result};
pub use crate::execution::{plan_batches, Executor, ExecutionReport, RemovalPlan};
pub use crate::graph::{build as build_graph, DependencyGraph};
