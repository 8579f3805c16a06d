//! 6502 status register (P) bits.
//!
//! B is not a real flag: it only exists in the copy pushed by BRK/PHP.
//! U always reads back as 1.

pub const C: u8 = 0x01; // Carry
pub const Z: u8 = 0x02; // Zero
pub const I: u8 = 0x04; // Interrupt disable
pub const D: u8 = 0x08; // Decimal (stored, ignored by the 2A03)
pub const B: u8 = 0x10; // Break
pub const U: u8 = 0x20; // Unused
pub const V: u8 = 0x40; // Overflow
pub const N: u8 = 0x80; // Negative
