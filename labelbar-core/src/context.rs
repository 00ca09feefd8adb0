//! Read-only review snapshot and the in-flight latch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::capability::{self, Capabilities};

/// Everything the resolvers need to know about the host, captured at one instant.
///
/// Built fresh by the host before every render; never mutated by the resolvers.
#[derive(Debug, Clone, Default)]
pub struct ReviewContext {
    pub capabilities: Capabilities,
    /// A historical (read-only) revision is selected in the history panel.
    pub history_selected: bool,
    /// A gated action is currently in flight (see [`InFlightLatch`]).
    pub is_in_progress: bool,
    /// The store is writing a submit or update.
    pub is_submitting: bool,
    /// Reviewer browses tasks without a prior user-generated result.
    pub explore: bool,
    /// All annotations are shown side by side.
    pub viewing_all: bool,
    pub enable_tooltips: bool,
    /// The task carries instructions that can be toggled.
    pub has_description: bool,
}

impl ReviewContext {
    pub fn is_review(&self) -> bool {
        self.capabilities.has(capability::REVIEW)
    }

    /// True when every state-changing control must render disabled.
    pub fn is_locked(&self, annotation_editable: bool) -> bool {
        !annotation_editable || self.is_submitting || self.history_selected || self.is_in_progress
    }
}

/// Boolean latch preventing overlapping gated actions.
///
/// Cloning shares the flag. [`InFlightLatch::try_acquire`] returns a guard that
/// clears the flag when dropped, so every exit path of the holder releases it.
#[derive(Debug, Clone, Default)]
pub struct InFlightLatch {
    flag: Arc<AtomicBool>,
}

impl InFlightLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Sets the latch if it is clear. Returns `None` when already held.
    pub fn try_acquire(&self) -> Option<LatchGuard> {
        self.flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LatchGuard {
                flag: Arc::clone(&self.flag),
            })
    }
}

/// Holds the in-flight latch; dropping it clears the latch.
#[derive(Debug)]
#[must_use = "the latch is released as soon as the guard is dropped"]
pub struct LatchGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for LatchGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
