//! MOS 6502 CPU core, as built into the Ricoh 2A03.
//!
//! Instruction-stepped: [`Mos6502::step`] executes one whole instruction (or
//! one interrupt entry) against a [`Bus`] and returns the cycles it took,
//! including page-cross and branch penalties. The 2A03 has no decimal mode,
//! so D is stored but ADC/SBC are always binary.
//!
//! Opcodes that would jam a real 6502, and unofficial opcodes outside the
//! NOP family, are returned as [`CpuError`] instead of being emulated.

use std::fmt;

use emu_core::{Bus, Cpu};
use thiserror::Error;

mod decode;
pub mod flags;
mod registers;

use decode::{Instruction, Mode, Op, decode, is_jam};
use flags::{C, D, I, N, V, Z};
pub use registers::Registers;

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Cycles taken by reset and by NMI/IRQ entry.
const INTERRUPT_CYCLES: u32 = 7;

/// Fatal CPU conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU jammed on opcode ${opcode:02X} at ${pc:04X}")]
    Jam { opcode: u8, pc: u16 },

    #[error("unsupported opcode ${opcode:02X} at ${pc:04X}")]
    Unsupported { opcode: u8, pc: u16 },
}

/// Register snapshot handed to observers after each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuState {
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
    pub sp: u8,
    /// Total cycles since power-on.
    pub cycles: u64,
}

impl fmt::Display for CpuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PC:{:04X} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            self.pc, self.a, self.x, self.y, self.p, self.sp, self.cycles
        )
    }
}

/// Resolved operand of an instruction.
#[derive(Debug, Clone, Copy)]
enum Operand {
    Implied,
    Accumulator,
    Address(u16),
}

/// MOS 6502 CPU.
#[derive(Debug, Clone)]
pub struct Mos6502 {
    pub regs: Registers,
    cycles: u64,
    /// Level of the IRQ input.
    irq_line: bool,
    /// Latched NMI edge.
    nmi_pending: bool,
}

impl Default for Mos6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mos6502 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            cycles: 0,
            irq_line: false,
            nmi_pending: false,
        }
    }

    /// Reset: load PC from $FFFC, SP=$FD, P=$24.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        self.regs = Registers::new();
        self.regs.pc = read_word(bus, RESET_VECTOR);
        self.cycles = u64::from(INTERRUPT_CYCLES);
        self.irq_line = false;
        self.nmi_pending = false;
    }

    /// Execute one instruction, or enter a pending interrupt.
    pub fn step(&mut self, bus: &mut impl Bus) -> Result<u32, CpuError> {
        if self.nmi_pending {
            self.nmi_pending = false;
            self.interrupt(bus, NMI_VECTOR);
            return Ok(INTERRUPT_CYCLES);
        }
        if self.irq_line && !self.regs.flag(I) {
            self.interrupt(bus, IRQ_VECTOR);
            return Ok(INTERRUPT_CYCLES);
        }

        let pc = self.regs.pc;
        let opcode = self.fetch(bus);
        let Some(instruction) = decode(opcode) else {
            self.regs.pc = pc;
            return Err(if is_jam(opcode) {
                CpuError::Jam { opcode, pc }
            } else {
                CpuError::Unsupported { opcode, pc }
            });
        };

        let cycles = self.execute(bus, instruction);
        self.cycles += u64::from(cycles);
        Ok(cycles)
    }

    /// Latch an NMI edge; taken before the next instruction.
    pub fn nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Drive the level-sensitive IRQ input.
    pub fn set_irq(&mut self, asserted: bool) {
        self.irq_line = asserted;
    }

    #[must_use]
    pub fn pc(&self) -> u16 {
        self.regs.pc
    }

    /// Total cycles since reset, counting the reset sequence itself.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    #[must_use]
    pub fn state(&self) -> CpuState {
        CpuState {
            pc: self.regs.pc,
            a: self.regs.a,
            x: self.regs.x,
            y: self.regs.y,
            p: self.regs.p,
            sp: self.regs.s,
            cycles: self.cycles,
        }
    }

    fn interrupt(&mut self, bus: &mut impl Bus, vector: u16) {
        self.push_word(bus, self.regs.pc);
        let p = self.regs.status_for_push(false);
        self.push(bus, p);
        self.regs.set_flag(I, true);
        self.regs.pc = read_word(bus, vector);
        self.cycles += u64::from(INTERRUPT_CYCLES);
    }

    // =========================================================================
    // Bus helpers
    // =========================================================================

    fn fetch(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    fn fetch_word(&mut self, bus: &mut impl Bus) -> u16 {
        let low = self.fetch(bus);
        let high = self.fetch(bus);
        u16::from_le_bytes([low, high])
    }

    fn push(&mut self, bus: &mut impl Bus, value: u8) {
        let addr = self.regs.push();
        bus.write(addr, value);
    }

    fn pull(&mut self, bus: &mut impl Bus) -> u8 {
        let addr = self.regs.pop();
        bus.read(addr)
    }

    fn push_word(&mut self, bus: &mut impl Bus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, value as u8);
    }

    fn pull_word(&mut self, bus: &mut impl Bus) -> u16 {
        let low = self.pull(bus);
        let high = self.pull(bus);
        u16::from_le_bytes([low, high])
    }

    /// Resolve the operand for `mode`. The flag reports an indexed page cross.
    fn resolve(&mut self, bus: &mut impl Bus, mode: Mode) -> (Operand, bool) {
        match mode {
            Mode::Implied => (Operand::Implied, false),
            Mode::Accumulator => (Operand::Accumulator, false),
            Mode::Immediate => {
                let addr = self.regs.pc;
                self.regs.pc = self.regs.pc.wrapping_add(1);
                (Operand::Address(addr), false)
            }
            Mode::ZeroPage => (Operand::Address(u16::from(self.fetch(bus))), false),
            Mode::ZeroPageX => {
                let base = self.fetch(bus);
                (Operand::Address(u16::from(base.wrapping_add(self.regs.x))), false)
            }
            Mode::ZeroPageY => {
                let base = self.fetch(bus);
                (Operand::Address(u16::from(base.wrapping_add(self.regs.y))), false)
            }
            Mode::Absolute => (Operand::Address(self.fetch_word(bus)), false),
            Mode::AbsoluteX => {
                let base = self.fetch_word(bus);
                indexed(base, self.regs.x)
            }
            Mode::AbsoluteY => {
                let base = self.fetch_word(bus);
                indexed(base, self.regs.y)
            }
            Mode::Indirect => {
                let ptr = self.fetch_word(bus);
                (Operand::Address(read_word_page_bug(bus, ptr)), false)
            }
            Mode::IndexedIndirect => {
                let ptr = self.fetch(bus).wrapping_add(self.regs.x);
                (Operand::Address(read_zero_page_word(bus, ptr)), false)
            }
            Mode::IndirectIndexed => {
                let ptr = self.fetch(bus);
                let base = read_zero_page_word(bus, ptr);
                indexed(base, self.regs.y)
            }
            Mode::Relative => {
                let offset = self.fetch(bus) as i8;
                let target = self.regs.pc.wrapping_add(offset as u16);
                (Operand::Address(target), false)
            }
        }
    }

    fn read_operand(&self, bus: &mut impl Bus, operand: Operand) -> u8 {
        match operand {
            Operand::Address(addr) => bus.read(addr),
            Operand::Accumulator => self.regs.a,
            Operand::Implied => 0,
        }
    }

    /// Read-modify-write on memory or the accumulator.
    fn modify(&mut self, bus: &mut impl Bus, operand: Operand, f: impl FnOnce(&mut Self, u8) -> u8) {
        match operand {
            Operand::Accumulator => {
                let value = self.regs.a;
                self.regs.a = f(self, value);
            }
            Operand::Address(addr) => {
                let value = bus.read(addr);
                let result = f(self, value);
                bus.write(addr, result);
            }
            Operand::Implied => {}
        }
    }

    // =========================================================================
    // Execution
    // =========================================================================

    fn execute(&mut self, bus: &mut impl Bus, instruction: Instruction) -> u32 {
        let Instruction { op, mode, cycles } = instruction;
        let (operand, page_crossed) = self.resolve(bus, mode);
        let mut cycles = cycles;
        if page_crossed && op.page_penalty() {
            cycles += 1;
        }
        let target = match operand {
            Operand::Address(addr) => addr,
            _ => 0,
        };

        match op {
            // Loads and stores
            Op::Lda => {
                self.regs.a = self.read_operand(bus, operand);
                self.regs.set_zn(self.regs.a);
            }
            Op::Ldx => {
                self.regs.x = self.read_operand(bus, operand);
                self.regs.set_zn(self.regs.x);
            }
            Op::Ldy => {
                self.regs.y = self.read_operand(bus, operand);
                self.regs.set_zn(self.regs.y);
            }
            Op::Sta => bus.write(target, self.regs.a),
            Op::Stx => bus.write(target, self.regs.x),
            Op::Sty => bus.write(target, self.regs.y),

            // Transfers
            Op::Tax => {
                self.regs.x = self.regs.a;
                self.regs.set_zn(self.regs.x);
            }
            Op::Tay => {
                self.regs.y = self.regs.a;
                self.regs.set_zn(self.regs.y);
            }
            Op::Tsx => {
                self.regs.x = self.regs.s;
                self.regs.set_zn(self.regs.x);
            }
            Op::Txa => {
                self.regs.a = self.regs.x;
                self.regs.set_zn(self.regs.a);
            }
            Op::Txs => self.regs.s = self.regs.x,
            Op::Tya => {
                self.regs.a = self.regs.y;
                self.regs.set_zn(self.regs.a);
            }

            // Stack
            Op::Pha => self.push(bus, self.regs.a),
            Op::Php => {
                let p = self.regs.status_for_push(true);
                self.push(bus, p);
            }
            Op::Pla => {
                self.regs.a = self.pull(bus);
                self.regs.set_zn(self.regs.a);
            }
            Op::Plp => {
                let p = self.pull(bus);
                self.regs.set_status_from_stack(p);
            }

            // Arithmetic and logic
            Op::Adc => {
                let value = self.read_operand(bus, operand);
                self.add(value);
            }
            Op::Sbc => {
                let value = self.read_operand(bus, operand);
                self.add(!value);
            }
            Op::And => {
                self.regs.a &= self.read_operand(bus, operand);
                self.regs.set_zn(self.regs.a);
            }
            Op::Ora => {
                self.regs.a |= self.read_operand(bus, operand);
                self.regs.set_zn(self.regs.a);
            }
            Op::Eor => {
                self.regs.a ^= self.read_operand(bus, operand);
                self.regs.set_zn(self.regs.a);
            }
            Op::Cmp => {
                let value = self.read_operand(bus, operand);
                self.compare(self.regs.a, value);
            }
            Op::Cpx => {
                let value = self.read_operand(bus, operand);
                self.compare(self.regs.x, value);
            }
            Op::Cpy => {
                let value = self.read_operand(bus, operand);
                self.compare(self.regs.y, value);
            }
            Op::Bit => {
                let value = self.read_operand(bus, operand);
                self.regs.set_flag(Z, self.regs.a & value == 0);
                self.regs.set_flag(V, value & 0x40 != 0);
                self.regs.set_flag(N, value & 0x80 != 0);
            }

            // Increments and decrements
            Op::Inc => self.modify(bus, operand, |cpu, v| {
                let r = v.wrapping_add(1);
                cpu.regs.set_zn(r);
                r
            }),
            Op::Dec => self.modify(bus, operand, |cpu, v| {
                let r = v.wrapping_sub(1);
                cpu.regs.set_zn(r);
                r
            }),
            Op::Inx => {
                self.regs.x = self.regs.x.wrapping_add(1);
                self.regs.set_zn(self.regs.x);
            }
            Op::Iny => {
                self.regs.y = self.regs.y.wrapping_add(1);
                self.regs.set_zn(self.regs.y);
            }
            Op::Dex => {
                self.regs.x = self.regs.x.wrapping_sub(1);
                self.regs.set_zn(self.regs.x);
            }
            Op::Dey => {
                self.regs.y = self.regs.y.wrapping_sub(1);
                self.regs.set_zn(self.regs.y);
            }

            // Shifts and rotates
            Op::Asl => self.modify(bus, operand, |cpu, v| {
                cpu.regs.set_flag(C, v & 0x80 != 0);
                let r = v << 1;
                cpu.regs.set_zn(r);
                r
            }),
            Op::Lsr => self.modify(bus, operand, |cpu, v| {
                cpu.regs.set_flag(C, v & 0x01 != 0);
                let r = v >> 1;
                cpu.regs.set_zn(r);
                r
            }),
            Op::Rol => self.modify(bus, operand, |cpu, v| {
                let carry_in = u8::from(cpu.regs.flag(C));
                cpu.regs.set_flag(C, v & 0x80 != 0);
                let r = (v << 1) | carry_in;
                cpu.regs.set_zn(r);
                r
            }),
            Op::Ror => self.modify(bus, operand, |cpu, v| {
                let carry_in = u8::from(cpu.regs.flag(C)) << 7;
                cpu.regs.set_flag(C, v & 0x01 != 0);
                let r = (v >> 1) | carry_in;
                cpu.regs.set_zn(r);
                r
            }),

            // Jumps and subroutines
            Op::Jmp => self.regs.pc = target,
            Op::Jsr => {
                let ret = self.regs.pc.wrapping_sub(1);
                self.push_word(bus, ret);
                self.regs.pc = target;
            }
            Op::Rts => self.regs.pc = self.pull_word(bus).wrapping_add(1),
            Op::Rti => {
                let p = self.pull(bus);
                self.regs.set_status_from_stack(p);
                self.regs.pc = self.pull_word(bus);
            }
            Op::Brk => {
                // BRK skips a padding byte.
                let ret = self.regs.pc.wrapping_add(1);
                self.push_word(bus, ret);
                let p = self.regs.status_for_push(true);
                self.push(bus, p);
                self.regs.set_flag(I, true);
                self.regs.pc = read_word(bus, IRQ_VECTOR);
            }

            // Branches
            Op::Bcc => cycles += self.branch(target, !self.regs.flag(C)),
            Op::Bcs => cycles += self.branch(target, self.regs.flag(C)),
            Op::Bne => cycles += self.branch(target, !self.regs.flag(Z)),
            Op::Beq => cycles += self.branch(target, self.regs.flag(Z)),
            Op::Bpl => cycles += self.branch(target, !self.regs.flag(N)),
            Op::Bmi => cycles += self.branch(target, self.regs.flag(N)),
            Op::Bvc => cycles += self.branch(target, !self.regs.flag(V)),
            Op::Bvs => cycles += self.branch(target, self.regs.flag(V)),

            // Flags
            Op::Clc => self.regs.set_flag(C, false),
            Op::Sec => self.regs.set_flag(C, true),
            Op::Cli => self.regs.set_flag(I, false),
            Op::Sei => self.regs.set_flag(I, true),
            Op::Cld => self.regs.set_flag(D, false),
            Op::Sed => self.regs.set_flag(D, true),
            Op::Clv => self.regs.set_flag(V, false),

            Op::Nop => {
                if let Operand::Address(addr) = operand {
                    bus.read(addr);
                }
            }
        }

        cycles
    }

    /// Binary add with carry. SBC passes the complement.
    fn add(&mut self, value: u8) {
        let a = self.regs.a;
        let sum = u16::from(a) + u16::from(value) + u16::from(self.regs.flag(C));
        let result = sum as u8;
        self.regs.set_flag(C, sum > 0xFF);
        self.regs.set_flag(V, (!(a ^ value) & (a ^ result) & 0x80) != 0);
        self.regs.a = result;
        self.regs.set_zn(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.regs.set_flag(C, register >= value);
        self.regs.set_zn(register.wrapping_sub(value));
    }

    /// Take the branch if `condition`. Returns extra cycles: one when taken,
    /// two when the target is on another page.
    fn branch(&mut self, target: u16, condition: bool) -> u32 {
        if !condition {
            return 0;
        }
        let page_crossed = (self.regs.pc & 0xFF00) != (target & 0xFF00);
        self.regs.pc = target;
        if page_crossed { 2 } else { 1 }
    }
}

impl<B: Bus> Cpu<B> for Mos6502 {
    type Error = CpuError;

    fn step(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        Mos6502::step(self, bus)
    }

    fn reset(&mut self, bus: &mut B) {
        Mos6502::reset(self, bus);
    }

    fn set_irq(&mut self, asserted: bool) {
        Mos6502::set_irq(self, asserted);
    }

    fn nmi(&mut self) {
        Mos6502::nmi(self);
    }

    fn pc(&self) -> u16 {
        Mos6502::pc(self)
    }
}

fn indexed(base: u16, index: u8) -> (Operand, bool) {
    let addr = base.wrapping_add(u16::from(index));
    (Operand::Address(addr), (base & 0xFF00) != (addr & 0xFF00))
}

fn read_word(bus: &mut impl Bus, addr: u16) -> u16 {
    let low = bus.read(addr);
    let high = bus.read(addr.wrapping_add(1));
    u16::from_le_bytes([low, high])
}

/// Pointer read that wraps within zero page.
fn read_zero_page_word(bus: &mut impl Bus, ptr: u8) -> u16 {
    let low = bus.read(u16::from(ptr));
    let high = bus.read(u16::from(ptr.wrapping_add(1)));
    u16::from_le_bytes([low, high])
}

/// Indirect JMP bug: a pointer at $xxFF takes its high byte from $xx00.
fn read_word_page_bug(bus: &mut impl Bus, addr: u16) -> u16 {
    let low = bus.read(addr);
    let high_addr = (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF);
    let high = bus.read(high_addr);
    u16::from_le_bytes([low, high])
}
