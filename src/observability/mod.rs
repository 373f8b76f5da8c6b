//! Logging setup, pipeline context tracking and crash reports.
//!
//! Install the panic hook and subscriber once at startup:
//!
//! ```ignore
//! use decruft::observability::{init_logging, install_panic_hook};
//!
//! install_panic_hook();
//! init_logging(cli.verbose, !cli.plain);
//! ```
//!
//! Then mark phases and items as the pipeline advances:
//!
//! ```ignore
//! let _phase = set_phase(PipelinePhase::Detection);
//! let _item = set_current_item("src/legacy");
//! ```

pub mod context;
pub mod logging;
pub mod panic_hook;

pub use context::{
    get_current_context, get_progress, increment_processed, set_current_item, set_phase,
    set_progress, ContextGuard, PipelineContext, PipelinePhase,
};
pub use logging::init_logging;
pub use panic_hook::install_panic_hook;
