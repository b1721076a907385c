use rstest::rstest;
use x366_vm::prelude::*;

mod common;
use common::{boot, flags, reg, run};

#[rstest]
#[case("JE", 5, 5, true)]
#[case("JNE", 5, 5, false)]
#[case("JNE", 5, 6, true)]
#[case("JL", 3, 7, true)]
#[case("JL", 7, 3, false)]
#[case("JG", 7, 3, true)]
#[case("JG", 3, 3, false)]
#[case("JLE", 3, 3, true)]
#[case("JLE", 7, 3, false)]
#[case("JGE", 3, 3, true)]
#[case("JGE", 3, 7, false)]
fn branch_condition_table(
    #[case] jump: &str,
    #[case] a: u16,
    #[case] b: u16,
    #[case] taken: bool,
) {
    let source = format!(
        "MOV AX, {a}\nCMP AX, {b}\n{jump} hit\nMOV BX, 0\nHLT\nhit: MOV BX, 1\nHLT\n"
    );
    let mut vm = boot(&source);
    run(&mut vm);
    assert_eq!(reg(&vm, Reg::BX), u16::from(taken));
}

#[test]
fn countdown_loop_halts_with_zero() {
    let mut vm = boot("MOV CX, 5\nloop: DEC CX\nCMP CX, 0\nJNE loop\nHLT\n");
    run(&mut vm);

    assert_eq!(reg(&vm, Reg::CX), 0);
    assert!(flags(&vm).contains(Flags::ZERO));
}

#[test]
fn loop_decrements_cx_and_branches_until_zero() {
    let mut vm = boot("MOV CX, 4\nMOV AX, 0\nagain: ADD AX, 2\nLOOP again\nHLT\n");
    run(&mut vm);

    assert_eq!(reg(&vm, Reg::AX), 8);
    assert_eq!(reg(&vm, Reg::CX), 0);
}

#[test]
fn push_pop_round_trip_restores_sp() {
    let mut vm = boot("MOV AX, 0x1234\nPUSH AX\nPOP BX\nHLT\n");
    let sp_before = reg(&vm, Reg::SP);
    run(&mut vm);

    assert_eq!(reg(&vm, Reg::BX), 0x1234);
    assert_eq!(reg(&vm, Reg::SP), sp_before);
}

#[test]
fn call_and_ret_restore_pc_and_sp() {
    let mut vm = boot("MOV AX, 100\nPUSH AX\nMOV AX, 1\nCALL f\nPOP AX\nHLT\nf: MOV AX, 7\nRET\n");
    let sp_before = reg(&vm, Reg::SP);
    run(&mut vm);

    // The callee's AX is overwritten by the caller-saved POP.
    assert_eq!(reg(&vm, Reg::AX), 100);
    assert_eq!(reg(&vm, Reg::SP), sp_before);
}

#[test]
fn stacked_labels_share_one_target() {
    let mut vm = boot("L1:\nL2:\nL3:\nMOV AX, 42\nJMP done\ndone: HLT\n");
    run(&mut vm);
    assert_eq!(reg(&vm, Reg::AX), 42);
}

#[test]
fn conditional_jumps_follow_signed_comparisons() {
    // 5 < 10 signed: JL taken.
    let mut vm = boot(
        "MOV AX, 5\nCMP AX, 10\nJL less\nMOV BX, 0\nHLT\nless: MOV BX, 1\nHLT\n",
    );
    run(&mut vm);
    assert_eq!(reg(&vm, Reg::BX), 1);

    // -1 < 1 signed, even though 0xFFFF > 1 unsigned.
    let mut vm = boot(
        "MOV AX, 0xFFFF\nCMP AX, 1\nJL less\nMOV BX, 0\nHLT\nless: MOV BX, 1\nHLT\n",
    );
    run(&mut vm);
    assert_eq!(reg(&vm, Reg::BX), 1);
}

#[test]
fn jg_and_jge_on_equal_values() {
    let mut vm = boot("MOV AX, 7\nCMP AX, 7\nJG above\nJGE at_least\nHLT\nabove: HLT\nat_least: MOV BX, 1\nHLT\n");
    run(&mut vm);
    // Equal: JG not taken, JGE taken.
    assert_eq!(reg(&vm, Reg::BX), 1);
}

#[test]
fn jle_taken_on_equal() {
    let mut vm = boot("MOV AX, 3\nCMP AX, 3\nJLE le\nMOV BX, 0\nHLT\nle: MOV BX, 1\nHLT\n");
    run(&mut vm);
    assert_eq!(reg(&vm, Reg::BX), 1);
}

#[test]
fn frame_prologue_and_epilogue() {
    let mut vm = boot(
        "MOV AX, 11\nCALL f\nHLT\n\
         f: PUSH FP\nMOV FP, SP\nSUB SP, 4\n\
         MOV [FP-2], AX\nMOV BX, [FP-2]\n\
         MOV SP, FP\nPOP FP\nRET\n",
    );
    let sp_before = reg(&vm, Reg::SP);
    run(&mut vm);

    assert_eq!(reg(&vm, Reg::BX), 11);
    assert_eq!(reg(&vm, Reg::SP), sp_before);
    assert_eq!(reg(&vm, Reg::FP), 0);
}

#[test]
fn pop_from_an_empty_stack_underflows() {
    let mut vm = boot("POP AX\nHLT\n");
    let err = vm.step().expect_err("pop should underflow");
    assert_eq!(err, ExecutionError::StackUnderflow { pc: 0x20 });
    assert!(vm.is_halted());
}

#[test]
fn pc_advances_by_size_or_jumps() {
    let mut vm = boot("NOP\nMOV AX, 1\nJMP target\nNOP\ntarget: HLT\n");
    assert_eq!(vm.registers().pc(), 0x20);

    vm.step().expect("nop");
    assert_eq!(vm.registers().pc(), 0x22);
    vm.step().expect("mov");
    assert_eq!(vm.registers().pc(), 0x26);
    vm.step().expect("jmp");
    assert_eq!(vm.registers().pc(), 0x2c);
}

#[test]
fn halted_machine_refuses_more_steps() {
    let mut vm = boot("HLT\n");
    assert_eq!(vm.step(), Ok(ExecuteState::Halt));
    let pc = vm.registers().pc();
    assert_eq!(vm.step(), Ok(ExecuteState::Halt));
    assert_eq!(vm.registers().pc(), pc);
}

#[test]
fn run_reports_halt_and_notifies_the_host() {
    let mut vm = boot("MOV CX, 100\nspin: LOOP spin\nHLT\n");
    let state = vm
        .run(&Pacing::default(), || false)
        .expect("run");
    assert_eq!(state, RunState::Halted);
    assert!(vm.host().halt_notified);
}

#[test]
fn run_honors_the_cancel_signal() {
    // An infinite loop, cancelled at the first yield boundary.
    let mut vm = boot("spin: JMP spin\n");
    let pacing = Pacing { instructions_per_yield: 64, deadline: None };
    let state = vm.run(&pacing, || true).expect("run");
    assert_eq!(state, RunState::Cancelled);
    assert!(!vm.is_halted());
}
