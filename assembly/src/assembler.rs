use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    isa::Instruction,
    parser::{get_full_program_and_labels, parse_program, Labels, Symbol},
    source::SourceFile,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("line {line_num}: {message}")]
    ParseError { line_num: usize, message: String },

    #[error("line {line_num}: unknown opcode `{mnemonic}`")]
    UnknownOpcode { line_num: usize, mnemonic: String },

    #[error("line {line_num}: {message}")]
    InvalidOperand { line_num: usize, message: String },

    #[error("line {line_num}: label `{name}` is not defined")]
    UnknownLabel { line_num: usize, name: String },

    #[error("line {line_num}: label `{name}` is already defined")]
    DuplicateLabel { line_num: usize, name: String },

    #[error("the program does not contain any instruction")]
    EmptyProgram,
}

impl AssemblerError {
    /// Source line the error was found on, if it relates to one.
    pub const fn line_num(&self) -> Option<usize> {
        match self {
            Self::ParseError { line_num, .. }
            | Self::UnknownOpcode { line_num, .. }
            | Self::InvalidOperand { line_num, .. }
            | Self::UnknownLabel { line_num, .. }
            | Self::DuplicateLabel { line_num, .. } => Some(*line_num),
            Self::EmptyProgram => None,
        }
    }
}

/// A word of initialized data declared with `DW`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataWord {
    pub address: u32,
    pub value: i32,
    pub line_num: usize,
}

/// A fully decoded program. Immutable once assembled.
#[derive(Debug, Clone)]
pub struct Program {
    instructions: Vec<Instruction>,
    labels: Labels,
    data: Vec<DataWord>,
    source: SourceFile,
}

impl Program {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn instruction(&self, pc: usize) -> Option<&Instruction> {
        self.instructions.get(pc)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn data(&self) -> &[DataWord] {
        &self.data
    }

    pub const fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Instruction index of a code label.
    pub fn code_label(&self, name: &str) -> Option<usize> {
        match self.labels.get(name) {
            Some(Symbol::Code(pc)) => Some(*pc),
            _ => None,
        }
    }

    pub const fn source(&self) -> &SourceFile {
        &self.source
    }
}

pub struct Assembler;

impl Assembler {
    #[instrument(level = "debug", skip_all, fields(path = ?source.path()))]
    pub fn from_source(source: SourceFile) -> Result<Program, AssemblerError> {
        let statements = parse_program(&source)?;
        let (instructions, labels, data) = get_full_program_and_labels(&statements)?;
        debug!(
            instructions = instructions.len(),
            labels = labels.len(),
            data_words = data.len(),
            "assembled program"
        );

        Ok(Program {
            instructions,
            labels,
            data,
            source,
        })
    }

    pub fn from_code(code: &str) -> Result<Program, AssemblerError> {
        Self::from_source(SourceFile::from_text(code))
    }
}
