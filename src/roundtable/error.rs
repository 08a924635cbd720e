//! Error taxonomy for the orchestration engine.

use std::error::Error;
use std::fmt;

/// Everything that can go wrong while initializing or running a task.
///
/// Timeouts, backend faults, and empty attempts are absorbed by the exchange
/// driver's retry loop and only surface once the attempt budget is exhausted.
/// Cancellation is never retried. Consumer faults are isolated per message.
#[derive(Debug, Clone)]
pub enum OrchestratorError {
    /// Missing/invalid credentials or a failed agent construction at
    /// initialize. Fatal; the orchestrator stays uninitialized.
    Configuration(String),

    /// `start_task` was called while another task run was active.
    AlreadyInFlight,

    /// `start_task` was called before a successful initialize.
    NotInitialized,

    /// No message arrived within the sliding window (seconds). Retryable.
    Timeout(u64),

    /// Any other exchange-time fault raised by an agent backend. Retryable.
    Backend(String),

    /// Explicit caller cancellation. Terminates the run, never retried.
    Cancelled,

    /// Every attempt ended without a single produced message.
    NoResponse,

    /// The host's awaited message-received hook failed.
    Consumer(String),
}

impl OrchestratorError {
    /// Whether the exchange driver may spend another attempt on this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrchestratorError::Timeout(_)
                | OrchestratorError::Backend(_)
                | OrchestratorError::NoResponse
        )
    }
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            OrchestratorError::AlreadyInFlight => write!(f, "A task is already running"),
            OrchestratorError::NotInitialized => write!(f, "Orchestrator not initialized"),
            OrchestratorError::Timeout(secs) => {
                write!(f, "Message timeout after {} seconds", secs)
            }
            OrchestratorError::Backend(msg) => write!(f, "Backend fault: {}", msg),
            OrchestratorError::Cancelled => write!(f, "Task cancelled"),
            OrchestratorError::NoResponse => {
                write!(f, "All retry attempts exhausted with no response")
            }
            OrchestratorError::Consumer(msg) => write!(f, "Consumer fault: {}", msg),
        }
    }
}

impl Error for OrchestratorError {}
