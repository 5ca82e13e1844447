pub mod common;

use common::{last, line_nums, register_history, run_code};
use mockasm_asm::{
    Assembler, AssemblerError, EngineConfig, Execution, HaltReason, Register, SourceFile,
};

#[test]
fn test_mov_add_hlt() {
    let trace = run_code("MOV AX, 5\nADD AX, 3\nHLT").unwrap();

    assert_eq!(trace.len(), 3);
    assert_eq!(line_nums(&trace), vec![1, 2, 3]);
    assert_eq!(register_history(&trace, Register::Ax), vec![5, 8, 8]);
    assert!(!trace.get(1).unwrap().flags.zero);
    // HLT records the state unchanged.
    assert_eq!(
        trace.get(1).unwrap().registers,
        trace.get(2).unwrap().registers
    );
    assert_eq!(trace.halt_reason(), Some(HaltReason::Hlt));
    assert_eq!(trace.output(), Some(8));
}

#[test]
fn test_jump_to_undefined_label() {
    let err = Assembler::from_code("mov ax, 1\njmp nowhere\nhlt").unwrap_err();
    assert_eq!(
        err,
        AssemblerError::UnknownLabel {
            line_num: 2,
            name: "nowhere".to_string()
        }
    );
}

#[test]
fn test_loop_records_every_iteration() {
    let code = "
        mov cx, 3
    again:
        add ax, cx
        loop again
    ";
    let trace = run_code(code).unwrap();

    // mov, then 3 iterations of the 2-instruction body.
    assert_eq!(trace.len(), 7);
    let body: Vec<_> = line_nums(&trace).into_iter().skip(1).collect();
    assert_eq!(body, vec![4, 5, 4, 5, 4, 5]);
    assert_eq!(trace.halt_reason(), Some(HaltReason::EndOfProgram));
    assert_eq!(trace.output(), Some(6));
}

#[test]
fn test_trace_length_bounds() {
    // Straight-line code: one entry per instruction, and nothing for the
    // implicit end of the program.
    let trace = run_code("nop\nnop\nnop").unwrap();
    assert_eq!(trace.len(), 3);

    // A forward jump skips instructions.
    let trace = run_code("jmp end\nnop\nnop\nend: hlt").unwrap();
    assert_eq!(line_nums(&trace), vec![1, 4]);
}

#[test]
fn test_every_line_num_is_in_the_source() {
    let code = include_str!("../../demos/gcd.asm");
    let execution = Execution::from_source(SourceFile::from_text(code), &EngineConfig::default())
        .unwrap();
    let source = execution.program().source();
    for snapshot in execution.trace().snapshots() {
        let line = source.line(snapshot.line_num).unwrap();
        assert!(!line.trim().is_empty());
        assert!(!line.trim_start().starts_with(';'));
    }
}

#[test]
fn test_demo_programs() {
    let factorial = run_code(include_str!("../../demos/factorial.asm")).unwrap();
    assert_eq!(factorial.output(), Some(120));
    assert_eq!(factorial.len(), 13);

    let sum = run_code(include_str!("../../demos/sum_array.asm")).unwrap();
    assert_eq!(sum.output(), Some(51));
    assert_eq!(last(&sum).memory.get(&8), Some(&51));
    assert_eq!(last(&sum).registers[Register::Si], 5);

    let gcd = run_code(include_str!("../../demos/gcd.asm")).unwrap();
    assert_eq!(gcd.output(), Some(6));
    assert_eq!(gcd.halt_reason(), Some(HaltReason::Return));
    assert!(last(&gcd).stack.is_empty());
}

#[test]
fn test_state_accumulates() {
    let code = "
    data: dw 1
        push 10
        mov [3], 4
        add [data], 5
        push 20
        hlt
    ";
    let trace = run_code(code).unwrap();
    let snapshots = trace.snapshots();

    assert_eq!(snapshots[0].stack, vec![10]);
    assert_eq!(snapshots[0].memory.len(), 1);
    assert_eq!(snapshots[1].memory.get(&3), Some(&4));
    assert_eq!(snapshots[2].memory.get(&0), Some(&6));
    assert_eq!(snapshots[2].memory.get(&3), Some(&4));
    assert_eq!(snapshots[3].stack, vec![10, 20]);
    assert_eq!(snapshots[3].registers[Register::Sp], 254);
}

#[test]
fn test_runtime_failure_keeps_partial_trace() {
    let err = Execution::from_source(
        SourceFile::from_text("mov ax, 1\nmov bx, 0\nidiv bx\nhlt"),
        &EngineConfig::default(),
    )
    .unwrap_err();

    assert_eq!(err.line_num(), Some(3));
    let mockasm_asm::EngineError::Execution(failure) = err else {
        panic!("expected an execution failure");
    };
    assert_eq!(line_nums(&failure.partial_trace), vec![1, 2]);
    assert!(!failure.partial_trace.is_complete());
}
