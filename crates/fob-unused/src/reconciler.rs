//! Reconciliation state machine
//!
//! Candidate discovery and builds race. Whichever finishes last triggers
//! the report:
//!
//! ```text
//!                  build finished                 candidates arrive
//! Awaiting{false} ───────────────▶ Awaiting{true} ─────────────────▶ Ready + report
//!        │                                                               ▲
//!        └──────────── candidates arrive ──▶ Ready ── build finished ────┘
//! ```
//!
//! Once `Ready`, every build-finished signal produces a report. The
//! deferred report fires once, no matter how many builds finished while
//! discovery was still running.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::candidates::CandidateSet;
use crate::report::UnusedReport;
use crate::usage::{ResolvedModule, UsedSet};

/// Availability of the candidate set
#[derive(Debug, Clone)]
pub enum CandidateState {
    /// Discovery still running. `pending` records that a build finished first.
    Awaiting { pending: bool },
    /// Discovery finished; the set never changes afterwards.
    Ready(Arc<CandidateSet>),
}

/// What a build-finished signal resulted in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Reconcile(UnusedReport),
    Deferred,
}

#[derive(Debug)]
pub struct Reconciler {
    candidates: CandidateState,
    used: UsedSet,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            candidates: CandidateState::Awaiting { pending: false },
            used: UsedSet::new(),
        }
    }

    pub fn state(&self) -> &CandidateState {
        &self.candidates
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.candidates, CandidateState::Ready(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.candidates, CandidateState::Awaiting { pending: true })
    }

    pub fn used(&self) -> &UsedSet {
        &self.used
    }

    /// Record one used file.
    pub fn add_used(&mut self, path: &Path) -> bool {
        self.used.insert(path)
    }

    /// Record the resolved modules of a finished build.
    pub fn collect<I>(&mut self, modules: I) -> usize
    where
        I: IntoIterator,
        I::Item: ResolvedModule,
    {
        self.used.collect(modules)
    }

    /// Handle a build-finished signal.
    pub fn build_finished(&mut self) -> Trigger {
        match &mut self.candidates {
            CandidateState::Ready(candidates) => {
                Trigger::Reconcile(difference(candidates, &self.used))
            }
            CandidateState::Awaiting { pending } => {
                if !*pending {
                    debug!("[fob-unused] build finished before candidate discovery; deferring report");
                }
                *pending = true;
                Trigger::Deferred
            }
        }
    }

    /// Store the discovered candidate set.
    ///
    /// Returns the deferred report if a build already finished. A second
    /// candidate set is ignored; the first one stays authoritative.
    pub fn candidates_available(&mut self, candidates: CandidateSet) -> Option<UnusedReport> {
        let pending = match self.candidates {
            CandidateState::Ready(_) => {
                warn!("[fob-unused] candidate set already assigned; ignoring rediscovery");
                return None;
            }
            CandidateState::Awaiting { pending } => pending,
        };

        let candidates = Arc::new(candidates);
        self.candidates = CandidateState::Ready(Arc::clone(&candidates));

        pending.then(|| difference(&candidates, &self.used))
    }

    /// Current unused set, if candidates are known. Does not trigger anything.
    pub fn unused(&self) -> Option<UnusedReport> {
        match &self.candidates {
            CandidateState::Ready(candidates) => Some(difference(candidates, &self.used)),
            CandidateState::Awaiting { .. } => None,
        }
    }
}

/// `candidates \ used`, keeping candidate order.
pub fn difference(candidates: &CandidateSet, used: &UsedSet) -> UnusedReport {
    UnusedReport::new(
        candidates
            .iter()
            .filter(|path| !used.contains(path))
            .cloned()
            .collect(),
    )
}
