//! Core traits and types for cycle-accurate emulation.
//!
//! A console is advanced in scheduling quanta. Each quantum reports how
//! many CPU cycles it consumed, and host-side pacing compares those cycles
//! against the authentic clock rate held in a [`MasterClock`].

mod bus;
mod clock;
mod console;
mod cpu;
mod frame;

pub use bus::Bus;
pub use clock::MasterClock;
pub use console::Console;
pub use cpu::Cpu;
pub use frame::{Frame, FrameSink, NullFrameSink};
