//! CPU core trait.

use crate::Bus;

/// A CPU that executes one instruction per step.
///
/// The bus is passed in rather than owned so the machine can share it with
/// other components between steps.
pub trait Cpu<B: Bus> {
    /// Error raised when the CPU cannot continue (e.g. a jam opcode).
    type Error: std::error::Error + 'static;

    /// Execute one instruction, or enter a pending interrupt.
    ///
    /// Returns the number of CPU cycles consumed, always at least 1.
    fn step(&mut self, bus: &mut B) -> Result<u32, Self::Error>;

    /// Reset the CPU to its power-on state and load the reset vector.
    fn reset(&mut self, bus: &mut B);

    /// Drive the maskable interrupt line. The line is level-sensitive.
    fn set_irq(&mut self, asserted: bool);

    /// Latch a non-maskable interrupt, serviced before the next instruction.
    fn nmi(&mut self);

    /// Current program counter.
    fn pc(&self) -> u16;
}
