//! Process-wide re-entrancy state for compaction analyses

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Why an invocation ended before reaching the analyzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The process was spawned by the analyzer itself
    InternalInvocation,
    /// Another analysis is already running in this process
    Busy,
    /// This session already has an analysis in flight
    SessionInFlight { session_id: String },
    /// The session belongs to the analyzer's own traffic
    InternalSession { session_id: String },
    HistoryTooShort { chars: usize },
    WindowTooShort { chars: usize },
}

/// Single-flight flag plus the in-flight and internal session sets.
///
/// One instance lives for the whole process and is shared by reference
/// with every hook invocation.
#[derive(Debug, Default)]
pub struct CuratorState {
    busy: AtomicBool,
    in_flight: Mutex<HashSet<String>>,
    internal_sessions: Mutex<HashSet<String>>,
}

impl CuratorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the analyzer for `session_id`.
    ///
    /// The returned permit releases both the single-flight flag and the
    /// session's in-flight entry when dropped.
    pub fn try_begin(&self, session_id: &str) -> Result<AnalysisPermit<'_>, SkipReason> {
        if self.is_internal(session_id) {
            return Err(SkipReason::InternalSession {
                session_id: session_id.to_string(),
            });
        }

        let mut in_flight = lock(&self.in_flight);
        if in_flight.contains(session_id) {
            return Err(SkipReason::SessionInFlight {
                session_id: session_id.to_string(),
            });
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SkipReason::Busy);
        }
        in_flight.insert(session_id.to_string());

        Ok(AnalysisPermit {
            state: self,
            session_id: session_id.to_string(),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn is_in_flight(&self, session_id: &str) -> bool {
        lock(&self.in_flight).contains(session_id)
    }

    /// Mark a session as created by the analyzer
    pub fn register_internal(&self, session_id: &str) {
        lock(&self.internal_sessions).insert(session_id.to_string());
    }

    pub fn unregister_internal(&self, session_id: &str) {
        lock(&self.internal_sessions).remove(session_id);
    }

    pub fn is_internal(&self, session_id: &str) -> bool {
        lock(&self.internal_sessions).contains(session_id)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Exclusive right to run one analysis
#[derive(Debug)]
pub struct AnalysisPermit<'a> {
    state: &'a CuratorState,
    session_id: String,
}

impl AnalysisPermit<'_> {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl Drop for AnalysisPermit<'_> {
    fn drop(&mut self) {
        lock(&self.state.in_flight).remove(&self.session_id);
        self.state.busy.store(false, Ordering::Release);
    }
}
