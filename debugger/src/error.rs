//! Error types for the debugger.

use mockasm_asm::EngineError;
use thiserror::Error;

/// Errors returned by session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The program could not be loaded, assembled or run to completion.
    #[error(transparent)]
    Run(#[from] EngineError),

    /// The last run failed; stepping is refused until a new run succeeds.
    #[error("The last run failed, there is nothing to step through")]
    SessionFailed,

    /// No program has been run in this session yet.
    #[error("No program has been run in this session")]
    NoActiveRun,

    /// The cursor is already on the last snapshot.
    #[error("There are no more steps to execute")]
    NoMoreSteps,
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
