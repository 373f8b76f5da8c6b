//! Thread-local pipeline context for crash reports.
//!
//! Records which pipeline phase is running and which legacy item or plan
//! step is being handled, so the panic hook can say where a run died.
//! Guards restore the previous context on drop, which keeps nested
//! phase/item scopes correct.

use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};

static ITEMS_PROCESSED: AtomicUsize = AtomicUsize::new(0);
static ITEMS_TOTAL: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static CURRENT_CONTEXT: RefCell<PipelineContext> = const { RefCell::new(PipelineContext::new()) };
}

/// Snapshot of what the pipeline was doing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineContext {
    pub phase: Option<PipelinePhase>,
    /// Item path or step id currently in flight
    pub current_item: Option<String>,
}

impl PipelineContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: None,
            current_item: None,
        }
    }
}

/// Major stages of a removal run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Detection,
    GraphBuilding,
    Assessment,
    Planning,
    Execution,
    Reporting,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Detection => write!(f, "detection"),
            Self::GraphBuilding => write!(f, "graph_building"),
            Self::Assessment => write!(f, "assessment"),
            Self::Planning => write!(f, "planning"),
            Self::Execution => write!(f, "execution"),
            Self::Reporting => write!(f, "reporting"),
        }
    }
}

/// Restores the previous context when dropped.
pub struct ContextGuard {
    previous: PipelineContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = self.previous.clone();
        });
    }
}

fn update(apply: impl FnOnce(&mut PipelineContext)) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        apply(&mut *ctx.borrow_mut());
        ContextGuard { previous }
    })
}

/// Enter a pipeline phase until the returned guard drops.
///
/// ```ignore
/// let _phase = set_phase(PipelinePhase::Assessment);
/// for item in &items {
///     let _item = set_current_item(&item.path);
///     assessor.assess(item);
/// }
/// ```
#[must_use]
pub fn set_phase(phase: PipelinePhase) -> ContextGuard {
    update(|ctx| {
        ctx.phase = Some(phase);
        ctx.current_item = None;
    })
}

/// Mark `item` as in flight until the returned guard drops.
#[must_use]
pub fn set_current_item(item: impl Into<String>) -> ContextGuard {
    let item = item.into();
    update(move |ctx| ctx.current_item = Some(item))
}

pub fn set_progress(processed: usize, total: usize) {
    ITEMS_PROCESSED.store(processed, Ordering::Relaxed);
    ITEMS_TOTAL.store(total, Ordering::Relaxed);
}

pub fn increment_processed() {
    ITEMS_PROCESSED.fetch_add(1, Ordering::Relaxed);
}

#[must_use]
pub fn get_current_context() -> PipelineContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// Current progress as (processed, total).
#[must_use]
pub fn get_progress() -> (usize, usize) {
    (
        ITEMS_PROCESSED.load(Ordering::Relaxed),
        ITEMS_TOTAL.load(Ordering::Relaxed),
    )
}

pub fn reset_context() {
    CURRENT_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = PipelineContext::new();
    });
}
