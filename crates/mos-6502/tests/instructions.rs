//! Instruction behaviour and timing.

use emu_core::{Bus, Cpu};
use mos_6502::{CpuError, Mos6502, flags};

/// Flat 64K RAM.
struct RamBus {
    memory: Vec<u8>,
}

impl RamBus {
    fn new() -> Self {
        Self {
            memory: vec![0; 0x10000],
        }
    }

    fn load(&mut self, addr: u16, data: &[u8]) {
        let start = usize::from(addr);
        self.memory[start..start + data.len()].copy_from_slice(data);
    }
}

impl Bus for RamBus {
    fn read(&mut self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
    }
}

/// Load a program at $0200 and point the reset vector at it.
fn boot(program: &[u8]) -> (Mos6502, RamBus) {
    let mut bus = RamBus::new();
    bus.load(0x0200, program);
    bus.load(0xFFFC, &[0x00, 0x02]);
    let mut cpu = Mos6502::new();
    cpu.reset(&mut bus);
    (cpu, bus)
}

fn run(cpu: &mut Mos6502, bus: &mut RamBus, instructions: usize) -> u32 {
    (0..instructions)
        .map(|_| cpu.step(bus).expect("instruction should execute"))
        .sum()
}

#[test]
fn reset_loads_vector_and_power_on_registers() {
    let (cpu, _) = boot(&[]);
    let state = cpu.state();
    assert_eq!(state.pc, 0x0200);
    assert_eq!(state.sp, 0xFD);
    assert_eq!(state.p, 0x24);
    assert_eq!(state.to_string(), "PC:0200 A:00 X:00 Y:00 P:24 SP:FD CYC:7");
}

#[test]
fn load_sets_zero_and_negative() {
    let (mut cpu, mut bus) = boot(&[0xA9, 0x00, 0xA2, 0x80, 0xA0, 0x01]);
    run(&mut cpu, &mut bus, 1);
    assert!(cpu.regs.flag(flags::Z));
    run(&mut cpu, &mut bus, 1);
    assert!(cpu.regs.flag(flags::N));
    assert!(!cpu.regs.flag(flags::Z));
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs.y, 1);
    assert!(!cpu.regs.flag(flags::N));
}

#[test]
fn store_and_indexed_addressing() {
    // LDA #$5A; LDX #$03; STA $10,X; LDY #$04; STA $0300,Y
    let (mut cpu, mut bus) = boot(&[0xA9, 0x5A, 0xA2, 0x03, 0x95, 0x10, 0xA0, 0x04, 0x99, 0x00, 0x03]);
    run(&mut cpu, &mut bus, 5);
    assert_eq!(bus.memory[0x13], 0x5A);
    assert_eq!(bus.memory[0x0304], 0x5A);
}

#[test]
fn adc_sets_carry_and_overflow() {
    // CLC; LDA #$7F; ADC #$01
    let (mut cpu, mut bus) = boot(&[0x18, 0xA9, 0x7F, 0x69, 0x01]);
    run(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.regs.a, 0x80);
    assert!(cpu.regs.flag(flags::V));
    assert!(!cpu.regs.flag(flags::C));

    // SEC; LDA #$FF; ADC #$01
    let (mut cpu, mut bus) = boot(&[0x38, 0xA9, 0xFF, 0x69, 0x01]);
    run(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.regs.a, 0x01);
    assert!(cpu.regs.flag(flags::C));
    assert!(!cpu.regs.flag(flags::V));
}

#[test]
fn sbc_borrows_through_carry() {
    // SEC; LDA #$10; SBC #$20
    let (mut cpu, mut bus) = boot(&[0x38, 0xA9, 0x10, 0xE9, 0x20]);
    run(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.regs.a, 0xF0);
    assert!(!cpu.regs.flag(flags::C));
    assert!(cpu.regs.flag(flags::N));
}

#[test]
fn decimal_flag_does_not_change_arithmetic() {
    // SED; CLC; LDA #$09; ADC #$01
    let (mut cpu, mut bus) = boot(&[0xF8, 0x18, 0xA9, 0x09, 0x69, 0x01]);
    run(&mut cpu, &mut bus, 4);
    assert_eq!(cpu.regs.a, 0x0A);
    assert!(cpu.regs.flag(flags::D));
}

#[test]
fn compare_sets_carry_when_greater_or_equal() {
    // LDA #$40; CMP #$40; CPX #$01
    let (mut cpu, mut bus) = boot(&[0xA9, 0x40, 0xC9, 0x40, 0xE0, 0x01]);
    run(&mut cpu, &mut bus, 2);
    assert!(cpu.regs.flag(flags::C));
    assert!(cpu.regs.flag(flags::Z));
    run(&mut cpu, &mut bus, 1);
    assert!(!cpu.regs.flag(flags::C));
}

#[test]
fn rotate_through_carry_in_memory() {
    // SEC; ROL $10; ROR $11
    let (mut cpu, mut bus) = boot(&[0x38, 0x26, 0x10, 0x66, 0x11]);
    bus.memory[0x10] = 0x80;
    bus.memory[0x11] = 0x02;
    run(&mut cpu, &mut bus, 2);
    assert_eq!(bus.memory[0x10], 0x01);
    assert!(cpu.regs.flag(flags::C));
    run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.memory[0x11], 0x81);
    assert!(!cpu.regs.flag(flags::C));
}

#[test]
fn page_cross_costs_a_cycle_on_reads_only() {
    // LDX #$01; LDA $02FF,X; STA $02FF,X
    let (mut cpu, mut bus) = boot(&[0xA2, 0x01, 0xBD, 0xFF, 0x02, 0x9D, 0xFF, 0x02]);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.step(&mut bus), Ok(5));
    assert_eq!(cpu.step(&mut bus), Ok(5));
}

#[test]
fn branch_timing() {
    // LDX #$00; BEQ +2 (taken); NOP; NOP; BNE +0 (not taken)
    let (mut cpu, mut bus) = boot(&[0xA2, 0x00, 0xF0, 0x02, 0xEA, 0xEA, 0xD0, 0x00]);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.step(&mut bus), Ok(3));
    assert_eq!(cpu.pc(), 0x0206);
    assert_eq!(cpu.step(&mut bus), Ok(2));

    // Taken branch onto the next page.
    let mut bus = RamBus::new();
    bus.load(0x02F0, &[0xF0, 0x7F]);
    bus.load(0xFFFC, &[0xF0, 0x02]);
    let mut cpu = Mos6502::new();
    cpu.reset(&mut bus);
    cpu.regs.set_flag(flags::Z, true);
    assert_eq!(cpu.step(&mut bus), Ok(4));
    assert_eq!(cpu.pc(), 0x0371);
}

#[test]
fn jsr_rts_round_trip() {
    // JSR $0210; LDY #$01 ... $0210: LDX #$07; RTS
    let (mut cpu, mut bus) = boot(&[0x20, 0x10, 0x02, 0xA0, 0x01]);
    bus.load(0x0210, &[0xA2, 0x07, 0x60]);
    assert_eq!(run(&mut cpu, &mut bus, 4), 6 + 2 + 6 + 2);
    assert_eq!(cpu.regs.x, 0x07);
    assert_eq!(cpu.regs.y, 0x01);
    assert_eq!(cpu.regs.s, 0xFD);
}

#[test]
fn jmp_indirect_wraps_within_page() {
    // JMP ($02FF): low from $02FF, high from $0200 (not $0300)
    let mut bus = RamBus::new();
    bus.load(0x0400, &[0x6C, 0xFF, 0x02]);
    bus.load(0xFFFC, &[0x00, 0x04]);
    bus.memory[0x02FF] = 0x34;
    bus.memory[0x0200] = 0x12;
    bus.memory[0x0300] = 0x56;
    let mut cpu = Mos6502::new();
    cpu.reset(&mut bus);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc(), 0x1234);
}

#[test]
fn brk_and_rti() {
    // LDX #$FF; TXS; BRK; <pad>; LDA #$01   handler at $0300: RTI
    let (mut cpu, mut bus) = boot(&[0xA2, 0xFF, 0x9A, 0x00, 0xEA, 0xA9, 0x01]);
    bus.load(0xFFFE, &[0x00, 0x03]);
    bus.load(0x0300, &[0x40]);

    run(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.pc(), 0x0300);
    assert!(cpu.regs.flag(flags::I));
    // Return address skips the padding byte; pushed P has B set.
    assert_eq!(bus.memory[0x01FF], 0x02);
    assert_eq!(bus.memory[0x01FE], 0x05);
    assert_ne!(bus.memory[0x01FD] & flags::B, 0);

    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs.a, 0x01);
    assert_eq!(cpu.regs.s, 0xFF);
}

#[test]
fn nmi_entry_takes_seven_cycles() {
    let (mut cpu, mut bus) = boot(&[0xEA]);
    bus.load(0xFFFA, &[0x00, 0x05]);
    cpu.nmi();
    assert_eq!(cpu.step(&mut bus), Ok(7));
    assert_eq!(cpu.pc(), 0x0500);
    // Pushed P has B clear.
    assert_eq!(bus.memory[0x01FB] & flags::B, 0);
    assert_eq!(cpu.cycles(), 14);
}

#[test]
fn irq_is_masked_by_interrupt_disable() {
    // CLI; NOP
    let (mut cpu, mut bus) = boot(&[0x58, 0xEA]);
    bus.load(0xFFFE, &[0x00, 0x06]);
    cpu.set_irq(true);
    // I is set after reset, so CLI executes first.
    assert_eq!(cpu.step(&mut bus), Ok(2));
    assert_eq!(cpu.step(&mut bus), Ok(7));
    assert_eq!(cpu.pc(), 0x0600);
}

#[test]
fn unofficial_nops_consume_operands() {
    // NOP #$00 (80); NOP $0300,X (1C); LDA #$09
    let (mut cpu, mut bus) = boot(&[0x80, 0x00, 0x1C, 0x00, 0x03, 0xA9, 0x09]);
    assert_eq!(run(&mut cpu, &mut bus, 3), 2 + 4 + 2);
    assert_eq!(cpu.regs.a, 0x09);
}

#[test]
fn jam_is_an_error() {
    let (mut cpu, mut bus) = boot(&[0xEA, 0x02]);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(
        cpu.step(&mut bus),
        Err(CpuError::Jam {
            opcode: 0x02,
            pc: 0x0201
        })
    );
    assert_eq!(cpu.pc(), 0x0201);
}

#[test]
fn other_unofficial_opcodes_are_unsupported() {
    // LAX ($A7)
    let (mut cpu, mut bus) = boot(&[0xA7, 0x00]);
    assert!(matches!(
        cpu.step(&mut bus),
        Err(CpuError::Unsupported { opcode: 0xA7, pc: 0x0200 })
    ));
}

#[test]
fn usable_through_the_cpu_trait() {
    fn drive<C: Cpu<RamBus>>(cpu: &mut C, bus: &mut RamBus) -> u32 {
        cpu.reset(bus);
        cpu.step(bus).unwrap_or(0)
    }

    let mut bus = RamBus::new();
    bus.load(0x0200, &[0xA9, 0x01]);
    bus.load(0xFFFC, &[0x00, 0x02]);
    let mut cpu = Mos6502::new();
    assert_eq!(drive(&mut cpu, &mut bus), 2);
    assert_eq!(Cpu::<RamBus>::pc(&cpu), 0x0202);
}
