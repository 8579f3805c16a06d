//! 6502 CPU registers.

use crate::flags::{B, I, N, U, Z};

/// 6502 CPU register set.
///
/// - A: 8-bit accumulator
/// - X, Y: 8-bit index registers
/// - S: 8-bit stack pointer (stack is at $0100-$01FF)
/// - PC: 16-bit program counter
/// - P: 8-bit processor status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    /// Points at the next free stack slot.
    pub s: u8,
    pub pc: u16,
    pub p: u8,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Registers as they stand after reset, before the vector is loaded.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0xFD,
            pc: 0,
            p: U | I,
        }
    }

    #[must_use]
    pub const fn flag(&self, mask: u8) -> bool {
        self.p & mask != 0
    }

    pub fn set_flag(&mut self, mask: u8, value: bool) {
        if value {
            self.p |= mask;
        } else {
            self.p &= !mask;
        }
    }

    /// Set Zero and Negative from a result.
    pub fn set_zn(&mut self, value: u8) {
        self.set_flag(Z, value == 0);
        self.set_flag(N, value & 0x80 != 0);
    }

    /// P as pushed to the stack. B is set for BRK/PHP, clear for interrupts.
    #[must_use]
    pub const fn status_for_push(&self, brk: bool) -> u8 {
        if brk { self.p | U | B } else { (self.p | U) & !B }
    }

    /// Load P from a stacked copy. B is discarded, U forced.
    pub fn set_status_from_stack(&mut self, value: u8) {
        self.p = (value | U) & !B;
    }

    /// Stack address to write, then move S down.
    pub fn push(&mut self) -> u16 {
        let addr = 0x0100 | u16::from(self.s);
        self.s = self.s.wrapping_sub(1);
        addr
    }

    /// Move S up, then the stack address to read.
    pub fn pop(&mut self) -> u16 {
        self.s = self.s.wrapping_add(1);
        0x0100 | u16::from(self.s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::C;

    #[test]
    fn stack_wraps_within_page_one() {
        let mut regs = Registers::new();
        regs.s = 0x00;
        assert_eq!(regs.push(), 0x0100);
        assert_eq!(regs.s, 0xFF);
        assert_eq!(regs.pop(), 0x0100);
    }

    #[test]
    fn pushed_status_carries_break_only_for_software() {
        let mut regs = Registers::new();
        regs.set_flag(C, true);
        assert_eq!(regs.status_for_push(true), U | I | B | C);
        assert_eq!(regs.status_for_push(false), U | I | C);

        regs.set_status_from_stack(0xFF);
        assert_eq!(regs.p, 0xFF & !B);
    }
}
