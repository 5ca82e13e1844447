use std::fmt;

use thiserror::Error;

use crate::memory::Register;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BadArgumentError {
    #[error("`{0}` is not a valid number")]
    Number(String),
}

/// An operand as written in the source, before labels are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    Register(Register),
    Immediate(i64),
    Memory(MemoryArg),
    /// An identifier that is not a register name, i.e. a label reference.
    Symbol(String),
}

/// A bracketed memory operand: `[base]`, `[base + n]` or `[base - n]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryArg {
    pub base: MemoryBase,
    pub displacement: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryBase {
    Register(Register),
    Absolute(i64),
    Symbol(String),
}

impl Argument {
    /// Classifies a bare identifier: register names win over labels.
    pub(crate) fn from_identifier(ident: &str) -> Self {
        match ident.parse::<Register>() {
            Ok(register) => Argument::Register(register),
            Err(_) => Argument::Symbol(ident.to_string()),
        }
    }

    /// Short description of the operand kind, for error messages.
    pub(crate) const fn kind(&self) -> &'static str {
        match self {
            Argument::Register(_) => "register",
            Argument::Immediate(_) => "immediate",
            Argument::Memory(_) => "memory reference",
            Argument::Symbol(_) => "label",
        }
    }
}

impl MemoryBase {
    pub(crate) fn from_identifier(ident: &str) -> Self {
        match ident.parse::<Register>() {
            Ok(register) => MemoryBase::Register(register),
            Err(_) => MemoryBase::Symbol(ident.to_string()),
        }
    }
}

/// Parses a decimal, `0x` hexadecimal or `0b` binary literal with an optional
/// leading minus sign.
pub(crate) fn parse_number(text: &str) -> Result<i64, BadArgumentError> {
    let bad = || BadArgumentError::Number(text.to_string());
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let magnitude = if let Some(hex) = strip_prefix_ignore_case(digits, "0x") {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = strip_prefix_ignore_case(digits, "0b") {
        i64::from_str_radix(bin, 2)
    } else {
        digits.parse::<i64>()
    }
    .map_err(|_| bad())?;

    if negative {
        magnitude.checked_neg().ok_or_else(bad)
    } else {
        Ok(magnitude)
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    match text.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => text.get(prefix.len()..),
        _ => None,
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Register(register) => write!(f, "{register}"),
            Argument::Immediate(value) => write!(f, "{value}"),
            Argument::Memory(mem) => write!(f, "{mem}"),
            Argument::Symbol(name) => write!(f, "{name}"),
        }
    }
}

impl fmt::Display for MemoryArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            MemoryBase::Register(register) => write!(f, "[{register}")?,
            MemoryBase::Absolute(address) => write!(f, "[{address}")?,
            MemoryBase::Symbol(name) => write!(f, "[{name}")?,
        }
        match self.displacement {
            0 => write!(f, "]"),
            d if d > 0 => write!(f, "+{d}]"),
            d => write!(f, "{d}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), Ok(42));
        assert_eq!(parse_number("-42"), Ok(-42));
        assert_eq!(parse_number("0x1F"), Ok(31));
        assert_eq!(parse_number("0XfF"), Ok(255));
        assert_eq!(parse_number("0b101"), Ok(5));
        assert_eq!(parse_number("-0x10"), Ok(-16));
        assert!(parse_number("99999999999999999999").is_err());
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(Argument::from_identifier("cx"), Argument::Register(Register::Cx));
        assert_eq!(
            Argument::from_identifier("done"),
            Argument::Symbol("done".to_string())
        );
    }

    #[test]
    fn test_display() {
        let mem = MemoryArg {
            base: MemoryBase::Register(Register::Bx),
            displacement: -2,
        };
        assert_eq!(mem.to_string(), "[BX-2]");
        let mem = MemoryArg {
            base: MemoryBase::Symbol("counter".to_string()),
            displacement: 1,
        };
        assert_eq!(mem.to_string(), "[counter+1]");
    }
}
