#![allow(dead_code)]

use mockasm_asm::{Assembler, EngineConfig, ExecutionFailure, Register, Snapshot, Trace};

/// Assembles and runs `code` with the default configuration.
pub fn run_code(code: &str) -> Result<Trace, ExecutionFailure> {
    run_with_config(code, &EngineConfig::default())
}

pub fn run_with_config(code: &str, config: &EngineConfig) -> Result<Trace, ExecutionFailure> {
    let program = Assembler::from_code(code).expect("program should assemble");
    Trace::generate(&program, config)
}

/// Source lines of every trace entry, in execution order.
pub fn line_nums(trace: &Trace) -> Vec<usize> {
    trace.snapshots().iter().map(|s| s.line_num).collect()
}

/// Values of one register across the whole trace.
pub fn register_history(trace: &Trace, register: Register) -> Vec<i32> {
    trace
        .snapshots()
        .iter()
        .map(|s| s.registers[register])
        .collect()
}

pub fn last(trace: &Trace) -> &Snapshot {
    trace.last().expect("trace should not be empty")
}
