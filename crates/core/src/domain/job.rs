// FSC job lifecycle

use crate::domain::error::{DomainError, Result};
use crate::domain::layout::JobLayout;
use serde::{Deserialize, Serialize};

/// Job ID (UUID v4 in production)
pub type JobId = String;

/// Job state
///
/// `NotStarted -> InputsPrepared -> Invoked -> {Succeeded, Failed}`.
/// Failure is terminal; a failed job is never resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    NotStarted,
    InputsPrepared,
    Invoked,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::NotStarted => write!(f, "NOT_STARTED"),
            JobState::InputsPrepared => write!(f, "INPUTS_PREPARED"),
            JobState::Invoked => write!(f, "INVOKED"),
            JobState::Succeeded => write!(f, "SUCCEEDED"),
            JobState::Failed => write!(f, "FAILED"),
        }
    }
}

/// One 3DFSC job and its working tree
#[derive(Debug, Clone)]
pub struct FscJob {
    pub id: JobId,
    pub layout: JobLayout,
    pub state: JobState,
    pub created_at: i64, // epoch ms
    pub invoked_at: Option<i64>,
    pub finished_at: Option<i64>,
}

impl FscJob {
    /// Create a job with injected id and timestamp
    pub fn new(id: impl Into<String>, layout: JobLayout, created_at: i64) -> Self {
        Self {
            id: id.into(),
            layout,
            state: JobState::NotStarted,
            created_at,
            invoked_at: None,
            finished_at: None,
        }
    }

    /// Fails unless the job has never been started
    pub fn ensure_not_started(&self) -> Result<()> {
        if self.state != JobState::NotStarted {
            return Err(self.invalid(JobState::InputsPrepared));
        }
        Ok(())
    }

    pub fn inputs_prepared(&mut self) -> Result<()> {
        self.transition(JobState::NotStarted, JobState::InputsPrepared)
    }

    pub fn invoke(&mut self, now_millis: i64) -> Result<()> {
        self.transition(JobState::InputsPrepared, JobState::Invoked)?;
        self.invoked_at = Some(now_millis);
        Ok(())
    }

    pub fn succeed(&mut self, now_millis: i64) -> Result<()> {
        self.transition(JobState::Invoked, JobState::Succeeded)?;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Mark as Failed from any non-terminal state
    pub fn fail(&mut self, now_millis: i64) -> Result<()> {
        if self.state.is_terminal() {
            return Err(self.invalid(JobState::Failed));
        }
        self.state = JobState::Failed;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Wall time between invocation and completion
    pub fn run_duration_ms(&self) -> Option<i64> {
        Some(self.finished_at? - self.invoked_at?)
    }

    fn transition(&mut self, from: JobState, to: JobState) -> Result<()> {
        if self.state != from {
            return Err(self.invalid(to));
        }
        self.state = to;
        Ok(())
    }

    fn invalid(&self, to: JobState) -> DomainError {
        DomainError::InvalidStateTransition {
            from: self.state.to_string(),
            to: to.to_string(),
        }
    }
}
