use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

use crate::memory::Flags;

/// Mnemonics understood by the assembler.
///
/// Parsing is case-insensitive. Conditional jumps accept the usual aliases
/// (`JZ` for `JE`, `JC` for `JB`, ...), which display as their canonical
/// mnemonic.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumCount,
    EnumIter,
    EnumString,
    IntoStaticStr,
    TryFromPrimitive,
    IntoPrimitive,
)]
#[repr(u8)]
#[strum(ascii_case_insensitive, serialize_all = "UPPERCASE")]
#[allow(clippy::upper_case_acronyms)]
pub enum Opcode {
    // Data movement
    Mov = 0x00,
    Push = 0x01,
    Pop = 0x02,

    // Integer arithmetic
    Add = 0x03,
    Sub = 0x04,
    Imul = 0x05,
    Idiv = 0x06,
    Cqo = 0x07,
    Neg = 0x08,
    Inc = 0x09,
    Dec = 0x0a,

    // Bitwise
    And = 0x0b,
    Or = 0x0c,
    Xor = 0x0d,
    Not = 0x0e,
    Shl = 0x0f,
    Shr = 0x10,
    Sar = 0x11,

    // Comparison
    Cmp = 0x12,
    Test = 0x13,

    // Jumps
    Jmp = 0x14,
    #[strum(to_string = "JE", serialize = "JZ")]
    Je = 0x15,
    #[strum(to_string = "JNE", serialize = "JNZ")]
    Jne = 0x16,
    #[strum(to_string = "JG", serialize = "JNLE")]
    Jg = 0x17,
    #[strum(to_string = "JGE", serialize = "JNL")]
    Jge = 0x18,
    #[strum(to_string = "JL", serialize = "JNGE")]
    Jl = 0x19,
    #[strum(to_string = "JLE", serialize = "JNG")]
    Jle = 0x1a,
    #[strum(to_string = "JA", serialize = "JNBE")]
    Ja = 0x1b,
    #[strum(to_string = "JAE", serialize = "JNB", serialize = "JNC")]
    Jae = 0x1c,
    #[strum(to_string = "JB", serialize = "JNAE", serialize = "JC")]
    Jb = 0x1d,
    #[strum(to_string = "JBE", serialize = "JNA")]
    Jbe = 0x1e,
    Js = 0x1f,
    Jns = 0x20,
    Jo = 0x21,
    Jno = 0x22,
    Loop = 0x23,

    // Procedures
    Call = 0x24,
    Ret = 0x25,

    // Misc
    Nop = 0x26,
    Hlt = 0x27,
}

impl Opcode {
    /// Returns the number of operands expected by the given opcode.
    pub const fn num_args(&self) -> usize {
        match self {
            Opcode::Cqo | Opcode::Ret | Opcode::Nop | Opcode::Hlt => 0,
            Opcode::Push
            | Opcode::Pop
            | Opcode::Idiv
            | Opcode::Neg
            | Opcode::Inc
            | Opcode::Dec
            | Opcode::Not
            | Opcode::Jmp
            | Opcode::Je
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
            | Opcode::Jno
            | Opcode::Loop
            | Opcode::Call => 1,
            Opcode::Mov
            | Opcode::Add
            | Opcode::Sub
            | Opcode::Imul
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor
            | Opcode::Shl
            | Opcode::Shr
            | Opcode::Sar
            | Opcode::Cmp
            | Opcode::Test => 2,
        }
    }

    /// The branch condition of a conditional jump, `None` for anything else.
    pub const fn condition(&self) -> Option<Condition> {
        let condition = match self {
            Opcode::Je => Condition::Equal,
            Opcode::Jne => Condition::NotEqual,
            Opcode::Jg => Condition::Greater,
            Opcode::Jge => Condition::GreaterOrEqual,
            Opcode::Jl => Condition::Less,
            Opcode::Jle => Condition::LessOrEqual,
            Opcode::Ja => Condition::Above,
            Opcode::Jae => Condition::AboveOrEqual,
            Opcode::Jb => Condition::Below,
            Opcode::Jbe => Condition::BelowOrEqual,
            Opcode::Js => Condition::Sign,
            Opcode::Jns => Condition::NotSign,
            Opcode::Jo => Condition::Overflow,
            Opcode::Jno => Condition::NotOverflow,
            _ => return None,
        };
        Some(condition)
    }
}

/// Condition evaluated by conditional jumps against the current flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Equal,
    NotEqual,
    /// Signed `>`.
    Greater,
    GreaterOrEqual,
    /// Signed `<`.
    Less,
    LessOrEqual,
    /// Unsigned `>`.
    Above,
    AboveOrEqual,
    /// Unsigned `<`.
    Below,
    BelowOrEqual,
    Sign,
    NotSign,
    Overflow,
    NotOverflow,
}

impl Condition {
    pub const fn evaluate(self, flags: Flags) -> bool {
        match self {
            Condition::Equal => flags.zero,
            Condition::NotEqual => !flags.zero,
            Condition::Greater => !flags.zero && flags.sign == flags.overflow,
            Condition::GreaterOrEqual => flags.sign == flags.overflow,
            Condition::Less => flags.sign != flags.overflow,
            Condition::LessOrEqual => flags.zero || flags.sign != flags.overflow,
            Condition::Above => !flags.carry && !flags.zero,
            Condition::AboveOrEqual => !flags.carry,
            Condition::Below => flags.carry,
            Condition::BelowOrEqual => flags.carry || flags.zero,
            Condition::Sign => flags.sign,
            Condition::NotSign => !flags.sign,
            Condition::Overflow => flags.overflow,
            Condition::NotOverflow => !flags.overflow,
        }
    }
}
