mod alu;
pub(crate) mod emulator;
pub(crate) mod trace;

use std::path::Path;

pub use emulator::{ExecutionStatus, Interpreter, InterpreterError};
use thiserror::Error;
pub use trace::{HaltReason, Snapshot, Trace, TraceRecorder};

use crate::{
    assembler::{Assembler, Program},
    error::EngineError,
    source::SourceFile,
    EngineConfig,
};

/// A run that stopped on a runtime error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line_num}: {error}")]
pub struct ExecutionFailure {
    /// Line of the instruction (or `DW` directive) that failed.
    pub line_num: usize,
    #[source]
    pub error: InterpreterError,
    /// Snapshots of the instructions executed before the failure.
    pub partial_trace: Trace,
}

/// A program together with the trace of its complete run.
#[derive(Debug, Clone)]
pub struct Execution {
    program: Program,
    trace: Trace,
}

impl Execution {
    /// Loads, assembles and runs the file at `path`.
    pub fn from_file(path: impl AsRef<Path>, config: &EngineConfig) -> Result<Self, EngineError> {
        let source = SourceFile::load(path)?;
        Self::from_source(source, config)
    }

    pub fn from_source(source: SourceFile, config: &EngineConfig) -> Result<Self, EngineError> {
        let program = Assembler::from_source(source)?;
        let trace = Trace::generate(&program, config)?;
        Ok(Self { program, trace })
    }

    pub const fn program(&self) -> &Program {
        &self.program
    }

    pub const fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn into_parts(self) -> (Program, Trace) {
        (self.program, self.trace)
    }
}
