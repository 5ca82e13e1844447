use std::fmt;

use ahash::HashMap;
use smallvec::SmallVec;

use super::instruction_args::{Argument, MemoryArg, MemoryBase};
use crate::{
    assembler::{AssemblerError, DataWord},
    isa::{BinaryOp, CompareOp, Instruction, Location, MemRef, Op, ShiftOp, Source, UnaryOp},
    memory::Register,
    Opcode,
};

/// Operand list of a parsed instruction. Almost never more than two.
pub type Arguments = SmallVec<[Argument; 2]>;

/// What a parsed source line contributes to the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionKind {
    Label(String),
    /// `DW` directive: consecutive words of initialized data.
    Data(Vec<i64>),
    Instruction {
        opcode: Opcode,
        args: Arguments,
    },
}

/// A parsed statement with its source line, before label resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionsWithLabels {
    pub kind: InstructionKind,
    pub line_num: usize,
}

impl InstructionsWithLabels {
    pub const fn new(kind: InstructionKind, line_num: usize) -> Self {
        Self { kind, line_num }
    }

    pub const fn is_label(&self) -> bool {
        matches!(self.kind, InstructionKind::Label(_))
    }

    pub fn label_name(&self) -> Option<&str> {
        if let InstructionKind::Label(name) = &self.kind {
            Some(name)
        } else {
            None
        }
    }
}

/// What a label points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// Index of the instruction following the label.
    Code(usize),
    /// Address of the first word of a `DW` directive.
    Data(u32),
}

/// A mapping from label names to what they designate.
pub type Labels = HashMap<String, Symbol>;

/// Collect labels and what they point at.
///
/// A label binds to the next instruction or data directive; a trailing label
/// binds to the end of the program.
pub(crate) fn get_labels(instructions: &[InstructionsWithLabels]) -> Result<Labels, AssemblerError> {
    let mut labels = Labels::default();
    let mut pending = Vec::new();
    let mut pc = 0;
    let mut data_addr: u32 = 0;

    for instruction in instructions {
        match &instruction.kind {
            InstructionKind::Label(name) => pending.push((name.as_str(), instruction.line_num)),
            InstructionKind::Data(values) => {
                bind_pending(&mut labels, &mut pending, Symbol::Data(data_addr))?;
                data_addr = data_addr.saturating_add(values.len() as u32);
            }
            InstructionKind::Instruction { .. } => {
                bind_pending(&mut labels, &mut pending, Symbol::Code(pc))?;
                pc += 1;
            }
        }
    }
    bind_pending(&mut labels, &mut pending, Symbol::Code(pc))?;

    Ok(labels)
}

fn bind_pending(
    labels: &mut Labels,
    pending: &mut Vec<(&str, usize)>,
    symbol: Symbol,
) -> Result<(), AssemblerError> {
    for (name, line_num) in pending.drain(..) {
        if name.parse::<Register>().is_ok() {
            return Err(AssemblerError::ParseError {
                line_num,
                message: format!("label `{name}` shadows a register"),
            });
        }
        if labels.insert(name.to_string(), symbol).is_some() {
            return Err(AssemblerError::DuplicateLabel {
                line_num,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Resolves labels and decodes every statement.
///
/// Returns the decoded instructions, the label table and the initial data
/// words.
pub(crate) fn get_full_program_and_labels(
    instructions: &[InstructionsWithLabels],
) -> Result<(Vec<Instruction>, Labels, Vec<DataWord>), AssemblerError> {
    let labels = get_labels(instructions)?;

    let mut program = Vec::new();
    let mut data = Vec::new();
    for instruction in instructions {
        match &instruction.kind {
            InstructionKind::Label(_) => {}
            InstructionKind::Data(values) => {
                for value in values {
                    let address = data.len() as u32;
                    let value = to_word(*value).ok_or_else(|| AssemblerError::InvalidOperand {
                        line_num: instruction.line_num,
                        message: format!("`{value}` does not fit in a 32-bit word"),
                    })?;
                    data.push(DataWord {
                        address,
                        value,
                        line_num: instruction.line_num,
                    });
                }
            }
            InstructionKind::Instruction { opcode, args } => {
                let decoder = Decoder {
                    labels: &labels,
                    opcode: *opcode,
                    line_num: instruction.line_num,
                };
                program.push(decoder.decode(args)?);
            }
        }
    }

    if program.is_empty() {
        return Err(AssemblerError::EmptyProgram);
    }

    Ok((program, labels, data))
}

/// Immediates may be written signed or as unsigned 32-bit patterns
/// (`0xFFFFFFFF` is `-1`).
fn to_word(value: i64) -> Option<i32> {
    if (i64::from(i32::MIN)..=i64::from(u32::MAX)).contains(&value) {
        Some(value as u32 as i32)
    } else {
        None
    }
}

/// Checks the operands of one instruction against the shape its opcode
/// expects.
struct Decoder<'a> {
    labels: &'a Labels,
    opcode: Opcode,
    line_num: usize,
}

impl Decoder<'_> {
    fn decode(&self, args: &[Argument]) -> Result<Instruction, AssemblerError> {
        let expected = self.opcode.num_args();
        if args.len() != expected {
            return Err(AssemblerError::ParseError {
                line_num: self.line_num,
                message: format!(
                    "{} expects {expected} operand{}, found {}",
                    self.opcode,
                    if expected == 1 { "" } else { "s" },
                    args.len()
                ),
            });
        }

        let op = match self.opcode {
            Opcode::Mov => {
                let (dst, src) = self.location_and_source(&args[0], &args[1])?;
                Op::Mov { dst, src }
            }
            Opcode::Add | Opcode::Sub | Opcode::And | Opcode::Or | Opcode::Xor => {
                let op = match self.opcode {
                    Opcode::Add => BinaryOp::Add,
                    Opcode::Sub => BinaryOp::Sub,
                    Opcode::And => BinaryOp::And,
                    Opcode::Or => BinaryOp::Or,
                    _ => BinaryOp::Xor,
                };
                let (dst, src) = self.location_and_source(&args[0], &args[1])?;
                Op::Binary { op, dst, src }
            }
            Opcode::Imul => {
                let dst = match self.location(&args[0], true)? {
                    Location::Register(register) => register,
                    Location::Memory(_) => {
                        return Err(self.invalid("IMUL destination must be a register"))
                    }
                };
                Op::Imul {
                    dst,
                    src: self.source(&args[1])?,
                }
            }
            Opcode::Idiv => Op::Idiv {
                src: self.source(&args[0])?,
            },
            Opcode::Cqo => Op::Cqo,
            Opcode::Neg | Opcode::Not | Opcode::Inc | Opcode::Dec => {
                let op = match self.opcode {
                    Opcode::Neg => UnaryOp::Neg,
                    Opcode::Not => UnaryOp::Not,
                    Opcode::Inc => UnaryOp::Inc,
                    _ => UnaryOp::Dec,
                };
                Op::Unary {
                    op,
                    dst: self.location(&args[0], true)?,
                }
            }
            Opcode::Shl | Opcode::Shr | Opcode::Sar => {
                let op = match self.opcode {
                    Opcode::Shl => ShiftOp::Shl,
                    Opcode::Shr => ShiftOp::Shr,
                    _ => ShiftOp::Sar,
                };
                let dst = self.location(&args[0], true)?;
                let count = match self.source(&args[1])? {
                    Source::Memory(_) => {
                        return Err(self.invalid("shift count must be a register or an immediate"))
                    }
                    count => count,
                };
                Op::Shift { op, dst, count }
            }
            Opcode::Cmp | Opcode::Test => {
                let op = if self.opcode == Opcode::Cmp {
                    CompareOp::Cmp
                } else {
                    CompareOp::Test
                };
                let lhs = self.location(&args[0], false)?;
                let rhs = self.source(&args[1])?;
                self.check_not_memory_to_memory(lhs, rhs)?;
                Op::Compare { op, lhs, rhs }
            }
            Opcode::Jmp => Op::Jump {
                condition: None,
                target: self.target(&args[0])?,
            },
            Opcode::Je
            | Opcode::Jne
            | Opcode::Jg
            | Opcode::Jge
            | Opcode::Jl
            | Opcode::Jle
            | Opcode::Ja
            | Opcode::Jae
            | Opcode::Jb
            | Opcode::Jbe
            | Opcode::Js
            | Opcode::Jns
            | Opcode::Jo
            | Opcode::Jno => Op::Jump {
                condition: self.opcode.condition(),
                target: self.target(&args[0])?,
            },
            Opcode::Loop => Op::Loop {
                target: self.target(&args[0])?,
            },
            Opcode::Call => Op::Call {
                target: self.target(&args[0])?,
            },
            Opcode::Ret => Op::Ret,
            Opcode::Push => Op::Push {
                src: self.source(&args[0])?,
            },
            Opcode::Pop => Op::Pop {
                dst: self.location(&args[0], true)?,
            },
            Opcode::Nop => Op::Nop,
            Opcode::Hlt => Op::Hlt,
        };

        Ok(Instruction {
            opcode: self.opcode,
            op,
            line_num: self.line_num,
        })
    }

    fn invalid(&self, message: impl Into<String>) -> AssemblerError {
        AssemblerError::InvalidOperand {
            line_num: self.line_num,
            message: message.into(),
        }
    }

    fn location_and_source(
        &self,
        dst: &Argument,
        src: &Argument,
    ) -> Result<(Location, Source), AssemblerError> {
        let dst = self.location(dst, true)?;
        let src = self.source(src)?;
        self.check_not_memory_to_memory(dst, src)?;
        Ok((dst, src))
    }

    fn check_not_memory_to_memory(&self, lhs: Location, rhs: Source) -> Result<(), AssemblerError> {
        if matches!((lhs, rhs), (Location::Memory(_), Source::Memory(_))) {
            return Err(self.invalid(format!(
                "{} cannot take two memory operands",
                self.opcode
            )));
        }
        Ok(())
    }

    fn location(&self, arg: &Argument, writable: bool) -> Result<Location, AssemblerError> {
        match arg {
            Argument::Register(Register::Sp) if writable => Err(self.invalid(
                "SP is maintained by the stack and cannot be written directly",
            )),
            Argument::Register(register) => Ok(Location::Register(*register)),
            Argument::Memory(mem) => Ok(Location::Memory(self.mem_ref(mem)?)),
            Argument::Symbol(name) => Err(self.not_a_value(name)),
            Argument::Immediate(_) => Err(self.invalid(format!(
                "{} expects a register or memory reference, found an immediate",
                self.opcode
            ))),
        }
    }

    fn source(&self, arg: &Argument) -> Result<Source, AssemblerError> {
        match arg {
            Argument::Register(register) => Ok(Source::Register(*register)),
            Argument::Immediate(value) => to_word(*value)
                .map(Source::Immediate)
                .ok_or_else(|| self.invalid(format!("`{value}` does not fit in a 32-bit word"))),
            Argument::Memory(mem) => Ok(Source::Memory(self.mem_ref(mem)?)),
            Argument::Symbol(name) => Err(self.not_a_value(name)),
        }
    }

    fn not_a_value(&self, name: &str) -> AssemblerError {
        match self.labels.get(name) {
            Some(Symbol::Data(_)) => {
                self.invalid(format!("use `[{name}]` to access the data labelled `{name}`"))
            }
            Some(Symbol::Code(_)) => {
                self.invalid(format!("code label `{name}` cannot be used as a value"))
            }
            None => self.invalid(format!("`{name}` is not a register")),
        }
    }

    fn mem_ref(&self, mem: &MemoryArg) -> Result<MemRef, AssemblerError> {
        let (base, offset) = match &mem.base {
            MemoryBase::Register(register) => (Some(*register), 0),
            MemoryBase::Absolute(address) => (None, *address),
            MemoryBase::Symbol(name) => match self.labels.get(name) {
                Some(Symbol::Data(address)) => (None, i64::from(*address)),
                Some(Symbol::Code(_)) => {
                    return Err(self.invalid(format!(
                        "code label `{name}` cannot be used as a memory reference"
                    )))
                }
                None => {
                    return Err(AssemblerError::UnknownLabel {
                        line_num: self.line_num,
                        name: name.clone(),
                    })
                }
            },
        };
        let displacement = offset
            .checked_add(mem.displacement)
            .ok_or_else(|| self.invalid(format!("memory reference {mem} overflows")))?;
        Ok(MemRef { base, displacement })
    }

    fn target(&self, arg: &Argument) -> Result<usize, AssemblerError> {
        let Argument::Symbol(name) = arg else {
            return Err(self.invalid(format!(
                "{} expects a label, found a {}",
                self.opcode,
                arg.kind()
            )));
        };
        match self.labels.get(name) {
            Some(Symbol::Code(pc)) => Ok(*pc),
            Some(Symbol::Data(_)) => Err(self.invalid(format!(
                "`{name}` labels data and cannot be a jump target"
            ))),
            None => Err(AssemblerError::UnknownLabel {
                line_num: self.line_num,
                name: name.clone(),
            }),
        }
    }
}

impl fmt::Display for InstructionsWithLabels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            InstructionKind::Label(label) => write!(f, "{label}:"),
            InstructionKind::Data(values) => {
                write!(f, "DW ")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                Ok(())
            }
            InstructionKind::Instruction { opcode, args } => {
                write!(f, "{opcode}")?;
                for (i, arg) in args.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{sep}{arg}")?;
                }
                Ok(())
            }
        }
    }
}
