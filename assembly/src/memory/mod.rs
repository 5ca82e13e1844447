mod flags;
mod ram;
mod registers;
mod stack;

pub use flags::Flags;
pub use ram::Ram;
pub use registers::{Register, RegisterFile};
pub use stack::Stack;
use thiserror::Error;

use crate::{execution::Snapshot, EngineConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("Memory address {address} is out of bounds (memory has {size} words)")]
    OutOfBounds { address: i64, size: u32 },

    #[error("Cannot pop from an empty stack")]
    StackUnderflow,

    #[error("Stack overflow: the stack holds at most {capacity} values")]
    StackOverflow { capacity: usize },
}

/// The live state of the machine: registers, flags, data memory and stack.
///
/// Only the interpreter mutates it. Past states are observed exclusively
/// through [`MachineState::snapshot`], which returns an owned copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineState {
    registers: RegisterFile,
    flags: Flags,
    ram: Ram,
    stack: Stack,
}

impl MachineState {
    pub fn new(config: &EngineConfig) -> Self {
        let stack = Stack::new(config.stack_size);
        let mut registers = RegisterFile::default();
        registers.set(Register::Sp, stack.pointer());
        Self {
            registers,
            flags: Flags::default(),
            ram: Ram::new(config.memory_size),
            stack,
        }
    }

    pub const fn register(&self, register: Register) -> i32 {
        self.registers.get(register)
    }

    /// Writes a register. `SP` is kept in sync with the stack and is never
    /// written through here.
    pub fn set_register(&mut self, register: Register, value: i32) {
        debug_assert_ne!(register, Register::Sp, "SP is managed by the stack");
        self.registers.set(register, value);
    }

    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub const fn flags(&self) -> Flags {
        self.flags
    }

    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }

    pub fn set_flags(&mut self, flags: Flags) {
        self.flags = flags;
    }

    /// Reads a word of data memory.
    pub fn read(&self, address: i64) -> Result<i32, MemoryError> {
        self.ram.read(address)
    }

    /// Writes a word of data memory.
    pub fn write(&mut self, address: i64, value: i32) -> Result<(), MemoryError> {
        self.ram.write(address, value)
    }

    pub const fn ram(&self) -> &Ram {
        &self.ram
    }

    pub fn push(&mut self, value: i32) -> Result<(), MemoryError> {
        self.stack.push(value)?;
        self.registers.set(Register::Sp, self.stack.pointer());
        Ok(())
    }

    pub fn pop(&mut self) -> Result<i32, MemoryError> {
        let value = self.stack.pop()?;
        self.registers.set(Register::Sp, self.stack.pointer());
        Ok(value)
    }

    pub const fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Takes a deep copy of the current state, tagged with a source line.
    pub fn snapshot(&self, line_num: usize) -> Snapshot {
        Snapshot {
            line_num,
            registers: self.registers,
            flags: self.flags,
            memory: self.ram.words().clone(),
            stack: self.stack.values().to_vec(),
        }
    }
}
