use x366_vm::prelude::*;

mod common;
use common::{boot, reg};

/// Snapshot the observable machine state.
fn snapshot(vm: &Interpreter<BufferedHost>) -> (Vec<u8>, [u16; 8], u16, Flags) {
    (
        vm.memory().as_slice().to_vec(),
        *vm.registers().gp(),
        vm.registers().pc(),
        vm.registers().flags(),
    )
}

#[test]
fn step_back_restores_a_register_write() {
    let mut vm = boot("MOV AX, 1\nMOV AX, 2\nHLT\n");
    vm.step().expect("first mov");
    let before = snapshot(&vm);

    vm.step().expect("second mov");
    assert_eq!(reg(&vm, Reg::AX), 2);

    assert!(vm.step_back());
    assert_eq!(snapshot(&vm), before);
    assert_eq!(reg(&vm, Reg::AX), 1);
}

#[test]
fn step_back_restores_memory_and_flags() {
    let mut vm = boot(
        "MOV AX, 0xFFFF\nADD AX, 1\nMOV [buf], AX\nINC [buf]\nHLT\nbuf: DW 0x0102\n",
    );
    vm.step().expect("mov");
    vm.step().expect("add");
    vm.step().expect("store");
    let before = snapshot(&vm);

    vm.step().expect("inc");
    assert!(vm.step_back());
    assert_eq!(snapshot(&vm), before);
    assert!(vm.registers().flags().contains(Flags::CARRY));
}

#[test]
fn step_back_restores_stack_operations() {
    let mut vm = boot("MOV AX, 0xAA\nPUSH AX\nPOP BX\nHLT\n");
    vm.step().expect("mov");
    let before_push = snapshot(&vm);

    vm.step().expect("push");
    vm.step().expect("pop");

    assert!(vm.step_back());
    assert!(vm.step_back());
    assert_eq!(snapshot(&vm), before_push);
}

#[test]
fn a_long_run_can_be_unwound_completely() {
    let mut vm = boot("MOV CX, 20\nloop: ADD AX, 3\nDEC CX\nCMP CX, 0\nJNE loop\nHLT\n");

    let mut snapshots = vec![snapshot(&vm)];
    while !vm.is_halted() {
        vm.step().expect("step");
        snapshots.push(snapshot(&vm));
    }
    let executed = snapshots.len() - 1;
    assert!(executed <= 100, "history bound exceeded by the test itself");

    for expected in snapshots.iter().rev().skip(1) {
        assert!(vm.step_back());
        assert_eq!(&snapshot(&vm), expected);
    }
    assert!(!vm.step_back(), "history exhausted");
}

#[test]
fn history_is_bounded_to_100_steps() {
    let mut vm = boot("MOV CX, 200\nspin: DEC CX\nJNE spin\nHLT\n");
    let mut steps = 0;
    while !vm.is_halted() {
        vm.step().expect("step");
        steps += 1;
    }
    assert!(steps > 100);
    assert_eq!(vm.history_len(), 100);

    let mut unwound = 0;
    while vm.step_back() {
        unwound += 1;
    }
    assert_eq!(unwound, 100);
}

#[test]
fn stepping_back_over_halt_resumes_the_machine() {
    let mut vm = boot("MOV AX, 9\nHLT\n");
    vm.step().expect("mov");
    vm.step().expect("hlt");
    assert!(vm.is_halted());

    assert!(vm.step_back());
    assert!(!vm.is_halted());
    assert_eq!(vm.registers().pc(), 0x24);
}

#[test]
fn output_is_not_unprinted() {
    let mut vm = boot("MOV AX, 7\nSYSCALL PRINT_INT\nHLT\n");
    vm.step().expect("mov");
    vm.step().expect("print");
    assert_eq!(vm.host().output, "7");

    // Machine state rolls back, the console does not.
    assert!(vm.step_back());
    assert_eq!(vm.host().output, "7");
    assert_eq!(vm.registers().pc(), 0x24);
}
