//! CLI command implementations.
//!
//! Available commands:
//! - **detect**: Phase 1 scan and inventory
//! - **assess**: Phase 2 impact assessment and removal plan
//! - **execute**: Phase 3 execution of a saved removal plan
//! - **run**: every phase up to a chosen mode, plus the session reports
//! - **init**: write a default `.decruft.yml`
//!
//! Each phase function takes an open [`Session`] so `run` can chain them
//! inside one run directory.

pub mod assess;
pub mod detect;
pub mod execute;
pub mod init;
pub mod run;
pub mod session;

pub use assess::{assess_legacy, run_assessment, AssessConfig, AssessmentOutcome};
pub use detect::{detect_legacy, run_detection, DetectConfig};
pub use execute::{execute_plan, operator_for, run_execution, ExecuteConfig};
pub use init::init_config;
pub use run::{run_pipeline, RunConfig};
pub use session::{resolve_root, session_id, Session};
