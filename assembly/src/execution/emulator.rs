use thiserror::Error;
use tracing::{debug, instrument, trace, warn};

use super::{alu, ExecutionFailure, HaltReason, Trace, TraceRecorder};
use crate::{
    assembler::Program,
    isa::{BinaryOp, CompareOp, Instruction, Location, MemRef, Op, ShiftOp, Source, UnaryOp},
    memory::{MachineState, MemoryError, Register},
    stats::ExecutionStats,
    EngineConfig,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpreterError {
    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Division overflow: {dividend} / {divisor} does not fit in 32 bits")]
    DivisionOverflow { dividend: i64, divisor: i64 },

    #[error("Return address {0} is outside the program")]
    BadReturnAddress(i32),

    #[error("Step limit of {limit} instructions exceeded")]
    StepLimitExceeded { limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    NotStarted,
    Running,
    Halted(HaltReason),
    Failed,
}

/// What to do with the program counter after an instruction.
enum Control {
    Next,
    Jump(usize),
    Halt(HaltReason),
}

/// Executes a [`Program`] one instruction at a time.
#[derive(Debug)]
pub struct Interpreter<'a> {
    program: &'a Program,
    config: EngineConfig,
    state: MachineState,
    /// Index of the next instruction to execute.
    pc: usize,
    steps: usize,
    /// Number of `CALL`s not yet matched by a `RET`.
    call_depth: usize,
    status: ExecutionStatus,
    stats: ExecutionStats,
}

impl<'a> Interpreter<'a> {
    pub fn new(program: &'a Program, config: EngineConfig) -> Self {
        Self {
            program,
            config,
            state: MachineState::new(&config),
            pc: 0,
            steps: 0,
            call_depth: 0,
            status: ExecutionStatus::NotStarted,
            stats: ExecutionStats::default(),
        }
    }

    pub const fn state(&self) -> &MachineState {
        &self.state
    }

    pub const fn pc(&self) -> usize {
        self.pc
    }

    pub const fn steps(&self) -> usize {
        self.steps
    }

    pub const fn status(&self) -> ExecutionStatus {
        self.status
    }

    pub const fn stats(&self) -> &ExecutionStats {
        &self.stats
    }

    /// Value of `AX`, the program output once halted.
    pub const fn output(&self) -> i32 {
        self.state.register(Register::Ax)
    }

    pub const fn is_halted(&self) -> bool {
        matches!(self.status, ExecutionStatus::Halted(_))
    }

    /// Runs the program until it halts or fails.
    #[instrument(level = "debug", skip_all, fields(instructions = self.program.len()))]
    pub fn run(mut self) -> Result<Trace, ExecutionFailure> {
        let mut recorder = TraceRecorder::new();
        if let Err((line_num, error)) = self.load_data() {
            return Err(self.fail(line_num, error, recorder));
        }

        loop {
            match self.step(&mut recorder) {
                Ok(ExecutionStatus::Halted(reason)) => {
                    let output = self.output();
                    debug!(
                        steps = self.steps,
                        ?reason,
                        output,
                        "program halted"
                    );
                    self.stats.log();
                    return Ok(recorder.finish(reason, output));
                }
                Ok(_) => {}
                Err(error) => {
                    let line_num = self.current_line_num();
                    return Err(self.fail(line_num, error, recorder));
                }
            }
        }
    }

    /// Writes the `DW` words into memory. Errors carry the directive's line.
    fn load_data(&mut self) -> Result<(), (usize, InterpreterError)> {
        for word in self.program.data() {
            self.state
                .write(i64::from(word.address), word.value)
                .map_err(|err| (word.line_num, err.into()))?;
        }
        Ok(())
    }

    fn current_line_num(&self) -> usize {
        self.program
            .instruction(self.pc)
            .map_or(0, |instruction| instruction.line_num)
    }

    fn fail(
        &mut self,
        line_num: usize,
        error: InterpreterError,
        recorder: TraceRecorder,
    ) -> ExecutionFailure {
        self.status = ExecutionStatus::Failed;
        warn!(line_num, %error, steps = self.steps, "execution failed");
        self.stats.log();
        ExecutionFailure {
            line_num,
            error,
            partial_trace: recorder.abort(),
        }
    }

    /// Executes the instruction at the program counter and records the
    /// resulting state. Does nothing once the program has halted or failed.
    pub fn step(
        &mut self,
        recorder: &mut TraceRecorder,
    ) -> Result<ExecutionStatus, InterpreterError> {
        match self.status {
            ExecutionStatus::Halted(_) | ExecutionStatus::Failed => return Ok(self.status),
            ExecutionStatus::NotStarted => self.status = ExecutionStatus::Running,
            ExecutionStatus::Running => {}
        }

        let Some(instruction) = self.program.instruction(self.pc).copied() else {
            self.status = ExecutionStatus::Halted(HaltReason::EndOfProgram);
            return Ok(self.status);
        };

        if self.steps >= self.config.step_limit {
            self.status = ExecutionStatus::Failed;
            return Err(InterpreterError::StepLimitExceeded {
                limit: self.config.step_limit,
            });
        }

        let control = match self.execute(&instruction) {
            Ok(control) => control,
            Err(error) => {
                self.status = ExecutionStatus::Failed;
                return Err(error);
            }
        };
        self.steps += 1;
        self.stats.record(instruction.opcode);
        recorder.record(self.state.snapshot(instruction.line_num));
        trace!(
            pc = self.pc,
            line_num = instruction.line_num,
            %instruction,
            "executed"
        );

        match control {
            Control::Next => self.pc += 1,
            Control::Jump(target) => self.pc = target,
            Control::Halt(reason) => self.status = ExecutionStatus::Halted(reason),
        }
        Ok(self.status)
    }

    fn address(&self, mem: MemRef) -> i64 {
        let base = mem
            .base
            .map_or(0, |register| i64::from(self.state.register(register)));
        base.saturating_add(mem.displacement)
    }

    fn read(&self, src: Source) -> Result<i32, InterpreterError> {
        Ok(match src {
            Source::Register(register) => self.state.register(register),
            Source::Immediate(value) => value,
            Source::Memory(mem) => self.state.read(self.address(mem))?,
        })
    }

    fn load(&self, location: Location) -> Result<i32, InterpreterError> {
        self.read(location.into())
    }

    fn store(&mut self, location: Location, value: i32) -> Result<(), InterpreterError> {
        match location {
            Location::Register(register) => self.state.set_register(register, value),
            Location::Memory(mem) => self.state.write(self.address(mem), value)?,
        }
        Ok(())
    }

    fn execute(&mut self, instruction: &Instruction) -> Result<Control, InterpreterError> {
        let flags = self.state.flags();
        match instruction.op {
            Op::Mov { dst, src } => {
                let value = self.read(src)?;
                self.store(dst, value)?;
            }
            Op::Binary { op, dst, src } => {
                let lhs = self.load(dst)?;
                let rhs = self.read(src)?;
                let (result, flags) = match op {
                    BinaryOp::Add => alu::add(lhs, rhs, flags),
                    BinaryOp::Sub => alu::sub(lhs, rhs, flags),
                    BinaryOp::And => alu::logic(lhs & rhs, flags),
                    BinaryOp::Or => alu::logic(lhs | rhs, flags),
                    BinaryOp::Xor => alu::logic(lhs ^ rhs, flags),
                };
                self.store(dst, result)?;
                self.state.set_flags(flags);
            }
            Op::Imul { dst, src } => {
                let rhs = self.read(src)?;
                let (result, flags) = alu::imul(self.state.register(dst), rhs, flags);
                self.state.set_register(dst, result);
                self.state.set_flags(flags);
            }
            Op::Idiv { src } => {
                let divisor = self.read(src)?;
                let (quotient, remainder) = alu::idiv(
                    self.state.register(Register::Dx),
                    self.state.register(Register::Ax),
                    divisor,
                )?;
                self.state.set_register(Register::Ax, quotient);
                self.state.set_register(Register::Dx, remainder);
            }
            Op::Cqo => {
                let extension = alu::sign_extension(self.state.register(Register::Ax));
                self.state.set_register(Register::Dx, extension);
            }
            Op::Unary { op, dst } => {
                let value = self.load(dst)?;
                let (result, flags) = match op {
                    UnaryOp::Neg => alu::neg(value, flags),
                    UnaryOp::Not => (!value, flags),
                    UnaryOp::Inc => alu::inc(value, flags),
                    UnaryOp::Dec => alu::dec(value, flags),
                };
                self.store(dst, result)?;
                self.state.set_flags(flags);
            }
            Op::Shift { op, dst, count } => {
                let value = self.load(dst)?;
                let count = self.read(count)?;
                let (result, flags) = match op {
                    ShiftOp::Shl => alu::shl(value, count, flags),
                    ShiftOp::Shr => alu::shr(value, count, flags),
                    ShiftOp::Sar => alu::sar(value, count, flags),
                };
                self.store(dst, result)?;
                self.state.set_flags(flags);
            }
            Op::Compare { op, lhs, rhs } => {
                let lhs = self.load(lhs)?;
                let rhs = self.read(rhs)?;
                let (_, flags) = match op {
                    CompareOp::Cmp => alu::sub(lhs, rhs, flags),
                    CompareOp::Test => alu::logic(lhs & rhs, flags),
                };
                self.state.set_flags(flags);
            }
            Op::Jump { condition, target } => {
                if condition.map_or(true, |condition| condition.evaluate(flags)) {
                    return Ok(Control::Jump(target));
                }
            }
            Op::Loop { target } => {
                let counter = self.state.register(Register::Cx).wrapping_sub(1);
                self.state.set_register(Register::Cx, counter);
                if counter != 0 {
                    return Ok(Control::Jump(target));
                }
            }
            Op::Call { target } => {
                self.state.push(self.pc as i32 + 1)?;
                self.call_depth += 1;
                return Ok(Control::Jump(target));
            }
            Op::Ret => {
                if self.call_depth == 0 {
                    return Ok(Control::Halt(HaltReason::Return));
                }
                let address = self.state.pop()?;
                self.call_depth -= 1;
                return match usize::try_from(address) {
                    Ok(target) if target <= self.program.len() => Ok(Control::Jump(target)),
                    _ => Err(InterpreterError::BadReturnAddress(address)),
                };
            }
            Op::Push { src } => {
                let value = self.read(src)?;
                self.state.push(value)?;
            }
            Op::Pop { dst } => {
                let value = self.state.pop()?;
                self.store(dst, value)?;
            }
            Op::Nop => {}
            Op::Hlt => return Ok(Control::Halt(HaltReason::Hlt)),
        }
        Ok(Control::Next)
    }
}
