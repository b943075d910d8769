//! Execution domain entity (one metered program run on a device)

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::program::Program;

/// Execution lifecycle state
///
/// `Running -> Finished` (billed), `Running -> Expired` (no finish signal),
/// `Expired -> Finished` (billed by the reconciler) or
/// `Expired -> Deleted` (discarded without billing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Running,
    Finished,
    Expired,
    Deleted,
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Finished => write!(f, "Finished"),
            Self::Expired => write!(f, "Expired"),
            Self::Deleted => write!(f, "Deleted"),
        }
    }
}

/// One metered session of a program on a device
#[derive(Debug, Clone)]
pub struct Execution {
    pub id: Uuid,
    pub device_id: i32,
    pub program_id: i32,
    pub user_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub state: ExecutionState,
    /// Final discounted price, set exactly once at finish
    pub price: Option<Decimal>,
}

impl Execution {
    pub fn new(device_id: i32, program_id: i32, user_id: Uuid, start_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            device_id,
            program_id,
            user_id,
            start_date,
            end_date: None,
            state: ExecutionState::Running,
            price: None,
        }
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        now - self.start_date
    }

    pub fn is_running(&self) -> bool {
        self.state == ExecutionState::Running
    }

    pub fn is_finished(&self) -> bool {
        self.state == ExecutionState::Finished
    }

    /// Whether this execution has outlived its program without a finish
    /// signal. Only running executions can expire; the grace period is an
    /// operational constant, not a program field.
    pub fn is_expired(&self, program: &Program, now: DateTime<Utc>, grace: Duration) -> bool {
        self.is_running() && self.elapsed(now) > program.max_duration + grace
    }

    /// The latest point in time the execution could have legitimately run
    /// to. Used as the effective end when billing an expired execution.
    pub fn billing_deadline(&self, program: &Program) -> DateTime<Utc> {
        self.start_date + program.max_duration
    }
}

// ── Tests ──────────────────────────────────────────────────────
