//! Memory and I/O bus interface.

/// CPU-visible address space.
///
/// Components reach memory and memory-mapped peripherals through this
/// trait. The bus decodes the address and routes it to the right device.
/// Reads take `&mut self` because many registers have read side effects
/// (status flags that clear, buffered data ports).
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);
}
