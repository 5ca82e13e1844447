use thiserror::Error;

use crate::{assembler::AssemblerError, execution::ExecutionFailure, source::LoadError};

/// Any error that can stop a program from producing a complete trace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Assemble(#[from] AssemblerError),

    #[error(transparent)]
    Execution(Box<ExecutionFailure>),
}

impl From<ExecutionFailure> for EngineError {
    fn from(failure: ExecutionFailure) -> Self {
        Self::Execution(Box::new(failure))
    }
}

impl EngineError {
    /// Source line the error points at, if any.
    pub fn line_num(&self) -> Option<usize> {
        match self {
            Self::Load(_) => None,
            Self::Assemble(err) => err.line_num(),
            Self::Execution(failure) => Some(failure.line_num),
        }
    }
}
