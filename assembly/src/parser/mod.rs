use std::str::FromStr;

use pest::{error::LineColLocation, iterators::Pair, Parser};
use tracing::trace;

mod instruction_args;
mod instructions_with_labels;
mod tests;

pub use instruction_args::{Argument, BadArgumentError, MemoryArg, MemoryBase};
pub(crate) use instructions_with_labels::get_full_program_and_labels;
pub use instructions_with_labels::{
    Arguments, InstructionKind, InstructionsWithLabels, Labels, Symbol,
};

use crate::{assembler::AssemblerError, source::SourceFile, Opcode};

#[derive(pest_derive::Parser)]
#[grammar = "parser/asm.pest"]
struct AsmParser;

#[inline]
fn get_first_inner<'a>(pair: Pair<'a, Rule>, msg: &str) -> Pair<'a, Rule> {
    pair.into_inner().next().expect(msg)
}

/// Parses one source line. A line may hold a label, an instruction, both, or
/// nothing at all (blank or comment-only lines).
pub fn parse_line(
    text: &str,
    line_num: usize,
) -> Result<Vec<InstructionsWithLabels>, AssemblerError> {
    let line = AsmParser::parse(Rule::line, text)
        .map_err(|err| {
            let column = match err.line_col {
                LineColLocation::Pos((_, col)) | LineColLocation::Span((_, col), _) => col,
            };
            AssemblerError::ParseError {
                line_num,
                message: format!("column {column}: {}", err.variant.message()),
            }
        })?
        .next()
        .expect("line rule always produces a pair");

    let mut instrs = Vec::new();
    for pair in line.into_inner() {
        match pair.as_rule() {
            Rule::label => {
                let name = get_first_inner(pair, "label must have a name");
                instrs.push(InstructionsWithLabels::new(
                    InstructionKind::Label(name.as_str().to_string()),
                    line_num,
                ));
            }
            Rule::instruction => instrs.push(parse_instruction(pair, line_num)?),
            Rule::EOI => (),
            _ => unreachable!("line only holds labels and instructions"),
        }
    }

    Ok(instrs)
}

fn parse_instruction(
    instruction: Pair<'_, Rule>,
    line_num: usize,
) -> Result<InstructionsWithLabels, AssemblerError> {
    let mut inner = instruction.into_inner();
    let mnemonic = inner.next().expect("instruction has a mnemonic").as_str();
    let args = match inner.next() {
        Some(operands) => operands
            .into_inner()
            .map(|operand| parse_operand(operand, line_num))
            .collect::<Result<Arguments, _>>()?,
        None => Arguments::new(),
    };

    if mnemonic.eq_ignore_ascii_case("DW") {
        return parse_data(args, line_num);
    }

    let opcode = Opcode::from_str(mnemonic).map_err(|_| AssemblerError::UnknownOpcode {
        line_num,
        mnemonic: mnemonic.to_string(),
    })?;

    Ok(InstructionsWithLabels::new(
        InstructionKind::Instruction { opcode, args },
        line_num,
    ))
}

fn parse_data(args: Arguments, line_num: usize) -> Result<InstructionsWithLabels, AssemblerError> {
    if args.is_empty() {
        return Err(AssemblerError::ParseError {
            line_num,
            message: "DW expects at least one value".to_string(),
        });
    }

    let values = args
        .into_iter()
        .map(|arg| match arg {
            Argument::Immediate(value) => Ok(value),
            other => Err(AssemblerError::InvalidOperand {
                line_num,
                message: format!("DW expects numeric values, found a {}", other.kind()),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(InstructionsWithLabels::new(
        InstructionKind::Data(values),
        line_num,
    ))
}

fn parse_operand(operand: Pair<'_, Rule>, line_num: usize) -> Result<Argument, AssemblerError> {
    let operand = get_first_inner(operand, "operand has inner tokens");
    match operand.as_rule() {
        Rule::number => parse_immediate(operand.as_str(), line_num).map(Argument::Immediate),
        Rule::identifier => Ok(Argument::from_identifier(operand.as_str())),
        Rule::memory => {
            let mut inner = operand.into_inner();
            let base = get_first_inner(
                inner.next().expect("memory operand has a base"),
                "memory base has inner tokens",
            );
            let base = match base.as_rule() {
                Rule::number => MemoryBase::Absolute(parse_immediate(base.as_str(), line_num)?),
                Rule::identifier => MemoryBase::from_identifier(base.as_str()),
                _ => unreachable!("memory base is a number or an identifier"),
            };

            let displacement = match inner.next() {
                Some(displacement) => {
                    let mut parts = displacement.into_inner();
                    let sign = parts.next().expect("displacement has a sign").as_str();
                    let magnitude = parse_immediate(
                        parts.next().expect("displacement has a value").as_str(),
                        line_num,
                    )?;
                    if sign == "-" {
                        -magnitude
                    } else {
                        magnitude
                    }
                }
                None => 0,
            };

            Ok(Argument::Memory(MemoryArg { base, displacement }))
        }
        _ => unreachable!("operand is a memory reference, number or identifier"),
    }
}

fn parse_immediate(text: &str, line_num: usize) -> Result<i64, AssemblerError> {
    instruction_args::parse_number(text).map_err(|err| AssemblerError::InvalidOperand {
        line_num,
        message: err.to_string(),
    })
}

/// Parses a whole program, line by line. Line numbering is kept even for
/// lines that produce nothing.
pub fn parse_program(source: &SourceFile) -> Result<Vec<InstructionsWithLabels>, AssemblerError> {
    let mut instrs = Vec::new();
    for (line_num, text) in source.lines() {
        let parsed = parse_line(text, line_num)?;
        trace!(line_num, statements = parsed.len(), "parsed line");
        instrs.extend(parsed);
    }
    Ok(instrs)
}
