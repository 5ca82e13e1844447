//! Decoded instructions.
//!
//! Each [`Op`] variant only carries the operand shapes its instruction
//! accepts, so shape errors are all caught by the assembler and the
//! interpreter never has to re-check them.

use std::fmt;

use crate::{memory::Register, opcodes::Condition, Opcode};

/// A memory operand with its labels resolved. The effective address is the
/// value of `base` (if any) plus `displacement`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemRef {
    pub base: Option<Register>,
    pub displacement: i64,
}

/// Somewhere a value can be written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Register(Register),
    Memory(MemRef),
}

/// Somewhere a value can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Register(Register),
    Immediate(i32),
    Memory(MemRef),
}

impl From<Location> for Source {
    fn from(location: Location) -> Self {
        match location {
            Location::Register(register) => Source::Register(register),
            Location::Memory(mem) => Source::Memory(mem),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    Inc,
    Dec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    Shl,
    Shr,
    Sar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Flags of `lhs - rhs`.
    Cmp,
    /// Flags of `lhs & rhs`.
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Mov {
        dst: Location,
        src: Source,
    },
    Binary {
        op: BinaryOp,
        dst: Location,
        src: Source,
    },
    Imul {
        dst: Register,
        src: Source,
    },
    /// `DX:AX / src`, quotient to `AX`, remainder to `DX`.
    Idiv {
        src: Source,
    },
    /// Sign-extends `AX` into `DX`.
    Cqo,
    Unary {
        op: UnaryOp,
        dst: Location,
    },
    Shift {
        op: ShiftOp,
        dst: Location,
        count: Source,
    },
    Compare {
        op: CompareOp,
        lhs: Location,
        rhs: Source,
    },
    /// Unconditional when `condition` is `None`. `target` is an instruction
    /// index.
    Jump {
        condition: Option<Condition>,
        target: usize,
    },
    Loop {
        target: usize,
    },
    Call {
        target: usize,
    },
    Ret,
    Push {
        src: Source,
    },
    Pop {
        dst: Location,
    },
    Nop,
    Hlt,
}

/// A decoded instruction and the source line it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub op: Op,
    /// 1-based source line.
    pub line_num: usize,
}

impl fmt::Display for MemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.base, self.displacement) {
            (Some(base), 0) => write!(f, "[{base}]"),
            (Some(base), d) if d > 0 => write!(f, "[{base}+{d}]"),
            (Some(base), d) => write!(f, "[{base}{d}]"),
            (None, d) => write!(f, "[{d}]"),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Register(register) => write!(f, "{register}"),
            Location::Memory(mem) => write!(f, "{mem}"),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Register(register) => write!(f, "{register}"),
            Source::Immediate(value) => write!(f, "{value}"),
            Source::Memory(mem) => write!(f, "{mem}"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opcode = self.opcode;
        match self.op {
            Op::Mov { dst, src } | Op::Binary { dst, src, .. } => {
                write!(f, "{opcode} {dst}, {src}")
            }
            Op::Imul { dst, src } => write!(f, "{opcode} {dst}, {src}"),
            Op::Shift { dst, count, .. } => write!(f, "{opcode} {dst}, {count}"),
            Op::Compare { lhs, rhs, .. } => write!(f, "{opcode} {lhs}, {rhs}"),
            Op::Idiv { src } | Op::Push { src } => write!(f, "{opcode} {src}"),
            Op::Unary { dst, .. } | Op::Pop { dst } => write!(f, "{opcode} {dst}"),
            Op::Jump { target, .. } | Op::Loop { target } | Op::Call { target } => {
                write!(f, "{opcode} @{target}")
            }
            Op::Cqo | Op::Ret | Op::Nop | Op::Hlt => write!(f, "{opcode}"),
        }
    }
}
