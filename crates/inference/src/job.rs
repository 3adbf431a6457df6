//! Per-call inference job bookkeeping
//!
//! A job exists only for the duration of one orchestrator call: it carries
//! the deadline, identifies the work in logs, and walks the state machine
//! `Pending -> Running -> {Succeeded | Failed | TimedOut}`. Jobs are never
//! shared, retried, or persisted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle of one inference job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Created, engine call not yet started
    Pending,
    /// Engine call and deadline timer both running
    Running,
    /// Engine settled first with a usable result
    Succeeded,
    /// Engine settled first with a failure
    Failed,
    /// Deadline fired first; the engine call was abandoned
    TimedOut,
}

impl JobState {
    /// Whether this state is terminal
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::TimedOut)
    }
}

/// One execution of the orchestrator's run operation
#[derive(Debug)]
pub struct InferenceJob {
    id: u64,
    input_name: String,
    deadline: Duration,
    started_at: Instant,
    state: JobState,
}

impl InferenceJob {
    /// Create a pending job for the given input
    pub fn new(input_name: impl Into<String>, deadline: Duration) -> Self {
        Self {
            id: NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed),
            input_name: input_name.into(),
            deadline,
            started_at: Instant::now(),
            state: JobState::Pending,
        }
    }

    /// Job identifier for log correlation
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Name of the input artifact
    #[must_use]
    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    /// Configured deadline
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> JobState {
        self.state
    }

    /// Time since the engine call started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Mark the engine call as started
    pub fn start(&mut self) {
        debug_assert_eq!(self.state, JobState::Pending);
        self.started_at = Instant::now();
        self.state = JobState::Running;
    }

    /// Record the terminal state; jobs never transition back
    pub fn finish(&mut self, state: JobState) {
        debug_assert!(state.is_terminal());
        debug_assert!(!self.state.is_terminal());
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ids_are_unique() {
        let a = InferenceJob::new("a.jpg", Duration::from_secs(120));
        let b = InferenceJob::new("b.jpg", Duration::from_secs(120));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_state_machine_walk() {
        let mut job = InferenceJob::new("a.jpg", Duration::from_secs(120));
        assert_eq!(job.state(), JobState::Pending);

        job.start();
        assert_eq!(job.state(), JobState::Running);
        assert!(!job.state().is_terminal());

        job.finish(JobState::TimedOut);
        assert_eq!(job.state(), JobState::TimedOut);
        assert!(job.state().is_terminal());
    }
}
