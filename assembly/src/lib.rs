//! Assembler and interpreter for mockasm programs.
//!
//! A program goes through three stages:
//! - [`SourceFile`] loads the text and numbers its lines,
//! - [`Assembler`] parses and decodes it into a [`Program`],
//! - [`Trace::generate`] runs it and records one [`Snapshot`] per executed
//!   instruction.
//!
//! [`Execution`] chains the three.

mod assembler;
mod config;
mod error;
mod execution;
mod isa;
pub mod memory;
mod opcodes;
mod parser;
mod source;
mod stats;
mod util;

pub use assembler::{Assembler, AssemblerError, DataWord, Program};
pub use config::{EngineConfig, DEFAULT_MEMORY_SIZE, DEFAULT_STACK_SIZE, DEFAULT_STEP_LIMIT};
pub use error::EngineError;
pub use execution::{
    Execution, ExecutionFailure, ExecutionStatus, HaltReason, Interpreter, InterpreterError,
    Snapshot, Trace, TraceRecorder,
};
pub use isa::{BinaryOp, CompareOp, Instruction, Location, MemRef, Op, ShiftOp, Source, UnaryOp};
pub use memory::{Flags, MachineState, MemoryError, Register, RegisterFile};
pub use opcodes::{Condition, Opcode};
pub use parser::{
    parse_line, parse_program, Argument, Arguments, BadArgumentError, InstructionKind,
    InstructionsWithLabels, Labels, MemoryArg, MemoryBase, Symbol,
};
pub use source::{LoadError, SourceFile};
pub use stats::ExecutionStats;
pub use util::init_logger;
