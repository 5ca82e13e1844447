#[cfg(test)]
mod test_parser {
    use pest::Parser;

    use crate::assembler::AssemblerError;
    use crate::memory::Register;
    use crate::parser::{
        parse_line, parse_program, Argument, AsmParser, InstructionKind, MemoryArg, MemoryBase,
        Rule,
    };
    use crate::source::SourceFile;
    use crate::Opcode;

    fn ensure_parser_succeeds(rule: Rule, asm: &str) {
        let parser = AsmParser::parse(rule, asm);
        assert!(parser.is_ok(), "assembly failed to parse: {}", asm);
    }

    fn ensure_parser_fails(rule: Rule, asm: &str) {
        let parser = AsmParser::parse(rule, asm);
        assert!(parser.is_err(), "assembly should not parse: {}", asm);
    }

    #[test]
    fn test_simple_lines() {
        let ok_lines = [
            "",
            "   ",
            "; just a comment",
            "start:",
            "start: mov ax, 5",
            "MOV AX, BX ; copy",
            "mov\tax,\t-3",
            "mov [bx+2], ax",
            "mov ax, [ 0x10 ]",
            "mov ax, [counter - 1]",
            "add cx, 0b1010",
            "ret",
            "done:hlt",
            "nums: dw 1, 2, 3",
            "jnz loop_top",
            "push 0xFFFFFFFF",
        ];
        for asm in ok_lines {
            ensure_parser_succeeds(Rule::line, asm);
        }

        let err_lines = [
            "mov ax 5",
            "mov ax,",
            "mov , ax",
            "mov ax, [bx",
            "mov ax, [bx + cx]",
            "mov ax, 0x",
            ": mov ax, 1",
            "a: b: nop",
            "1abc: nop",
            "mov ax, 5 garbage",
        ];
        for asm in err_lines {
            ensure_parser_fails(Rule::line, asm);
        }
    }

    #[test]
    fn test_parse_line_statements() {
        let parsed = parse_line("top: ADD ax, [bx-2] ; comment", 7).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].label_name(), Some("top"));
        assert_eq!(parsed[0].line_num, 7);

        let InstructionKind::Instruction { opcode, args } = &parsed[1].kind else {
            panic!("expected an instruction, got {:?}", parsed[1]);
        };
        assert_eq!(*opcode, Opcode::Add);
        assert_eq!(args[0], Argument::Register(Register::Ax));
        assert_eq!(
            args[1],
            Argument::Memory(MemoryArg {
                base: MemoryBase::Register(Register::Bx),
                displacement: -2,
            })
        );
        assert_eq!(parsed[1].to_string(), "ADD AX, [BX-2]");

        assert!(parse_line("   ; nothing here", 3).unwrap().is_empty());
    }

    #[test]
    fn test_parse_data_directive() {
        let parsed = parse_line("table: DW 1, -2, 0x10", 1).unwrap();
        assert_eq!(parsed[1].kind, InstructionKind::Data(vec![1, -2, 16]));

        assert!(matches!(
            parse_line("DW ax", 4),
            Err(AssemblerError::InvalidOperand { line_num: 4, .. })
        ));
        assert!(matches!(
            parse_line("dw", 5),
            Err(AssemblerError::ParseError { line_num: 5, .. })
        ));
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        assert_eq!(
            parse_line("frob ax", 2),
            Err(AssemblerError::UnknownOpcode {
                line_num: 2,
                mnemonic: "frob".to_string()
            })
        );

        match parse_line("mov ax 5", 9) {
            Err(AssemblerError::ParseError { line_num, message }) => {
                assert_eq!(line_num, 9);
                assert!(message.starts_with("column"), "{message}");
            }
            other => panic!("expected a parse error, got {other:?}"),
        }

        assert!(matches!(
            parse_line("mov ax, 99999999999999999999", 1),
            Err(AssemblerError::InvalidOperand { line_num: 1, .. })
        ));
    }

    #[test]
    fn test_parse_program_keeps_line_numbers() {
        let source = SourceFile::from_text("; header\n\nstart:\n  mov ax, 1\n\n  hlt\n");
        let statements = parse_program(&source).unwrap();
        let line_nums: Vec<_> = statements.iter().map(|s| s.line_num).collect();
        assert_eq!(line_nums, vec![3, 4, 6]);
        assert!(statements[0].is_label());
    }
}

#[cfg(test)]
mod test_decoder {
    use crate::assembler::{Assembler, AssemblerError};
    use crate::isa::{Location, MemRef, Op, Source};
    use crate::memory::Register;
    use crate::opcodes::Condition;

    fn decode_one(line: &str) -> Result<Op, AssemblerError> {
        Assembler::from_code(line).map(|program| program.instructions()[0].op)
    }

    fn invalid(line: &str) {
        match decode_one(line) {
            Err(AssemblerError::InvalidOperand { line_num: 1, .. }) => {}
            other => panic!("`{line}` should be an invalid operand, got {other:?}"),
        }
    }

    #[test]
    fn test_operand_shapes() {
        assert_eq!(
            decode_one("mov [bx+1], 0xFFFFFFFF").unwrap(),
            Op::Mov {
                dst: Location::Memory(MemRef {
                    base: Some(Register::Bx),
                    displacement: 1
                }),
                src: Source::Immediate(-1),
            }
        );
        assert_eq!(
            decode_one("push sp").unwrap(),
            Op::Push {
                src: Source::Register(Register::Sp)
            }
        );
        assert_eq!(
            decode_one("cmp [4], 2").unwrap(),
            Op::Compare {
                op: crate::isa::CompareOp::Cmp,
                lhs: Location::Memory(MemRef {
                    base: None,
                    displacement: 4
                }),
                rhs: Source::Immediate(2),
            }
        );

        invalid("mov 5, ax");
        invalid("mov [1], [2]");
        invalid("mov sp, 1");
        invalid("pop sp");
        invalid("imul [0], ax");
        invalid("shl ax, [0]");
        invalid("add ax, 0x1FFFFFFFF");
        invalid("jmp ax");
    }

    #[test]
    fn test_arity() {
        for line in ["mov ax", "hlt ax", "push", "add ax, bx, cx"] {
            assert!(
                matches!(
                    decode_one(line),
                    Err(AssemblerError::ParseError { line_num: 1, .. })
                ),
                "{line}"
            );
        }
    }

    #[test]
    fn test_labels() {
        let program = Assembler::from_code(
            "
        value: dw 5
        start:
            mov ax, [value]
            jz start
            call start
        ",
        )
        .unwrap();
        assert_eq!(
            program.instructions()[1].op,
            Op::Jump {
                condition: Some(Condition::Equal),
                target: 0
            }
        );
        assert_eq!(program.instructions()[2].op, Op::Call { target: 0 });

        // Labels are case-sensitive, registers are not.
        assert!(matches!(
            Assembler::from_code("Start: nop\njmp start"),
            Err(AssemblerError::UnknownLabel { line_num: 2, .. })
        ));
        assert!(matches!(
            Assembler::from_code("AX: nop"),
            Err(AssemblerError::ParseError { line_num: 1, .. })
        ));

        // Code and data labels are not interchangeable.
        let err = Assembler::from_code("d: dw 1\nc: jmp d").unwrap_err();
        assert!(matches!(err, AssemblerError::InvalidOperand { line_num: 2, .. }));
        let err = Assembler::from_code("c: mov ax, [c]").unwrap_err();
        assert!(matches!(err, AssemblerError::InvalidOperand { line_num: 1, .. }));
        let err = Assembler::from_code("mov ax, [missing]").unwrap_err();
        assert_eq!(
            err,
            AssemblerError::UnknownLabel {
                line_num: 1,
                name: "missing".to_string()
            }
        );
    }
}
