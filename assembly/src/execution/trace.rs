use std::collections::BTreeMap;

use serde::Serialize;

use super::{ExecutionFailure, Interpreter};
use crate::{
    assembler::Program,
    memory::{Flags, RegisterFile},
    EngineConfig,
};

/// The machine state right after one instruction executed.
///
/// A snapshot owns all of its data, so later execution can never change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Source line of the instruction that produced this state.
    pub line_num: usize,
    pub registers: RegisterFile,
    pub flags: Flags,
    /// Memory words that have been written, by ascending address.
    pub memory: BTreeMap<u32, i32>,
    /// Stack values, bottom first.
    pub stack: Vec<i32>,
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    /// A `HLT` instruction.
    Hlt,
    /// A `RET` with no active `CALL`.
    Return,
    /// The program counter moved past the last instruction.
    EndOfProgram,
}

/// The ordered list of snapshots of a run.
///
/// A trace returned by [`Trace::generate`] is complete and carries the halt
/// reason and the program output. A trace attached to an
/// [`ExecutionFailure`] is partial and carries neither.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Trace {
    snapshots: Vec<Snapshot>,
    halt_reason: Option<HaltReason>,
    output: Option<i32>,
}

impl Trace {
    /// Executes `program` to completion and returns its trace.
    pub fn generate(program: &Program, config: &EngineConfig) -> Result<Self, ExecutionFailure> {
        Interpreter::new(program, *config).run()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    pub fn first(&self) -> Option<&Snapshot> {
        self.snapshots.first()
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub const fn halt_reason(&self) -> Option<HaltReason> {
        self.halt_reason
    }

    /// Value of `AX` when the program halted.
    pub const fn output(&self) -> Option<i32> {
        self.output
    }

    pub const fn is_complete(&self) -> bool {
        self.halt_reason.is_some()
    }
}

/// Collects snapshots while the interpreter runs.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    snapshots: Vec<Snapshot>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub(crate) fn finish(self, halt_reason: HaltReason, output: i32) -> Trace {
        Trace {
            snapshots: self.snapshots,
            halt_reason: Some(halt_reason),
            output: Some(output),
        }
    }

    pub(crate) fn abort(self) -> Trace {
        Trace {
            snapshots: self.snapshots,
            halt_reason: None,
            output: None,
        }
    }
}
