//! NES console runtime.
//!
//! [`NesConsole`] owns the 2A03 CPU, the 2C02 PPU and the cartridge board,
//! and advances them in lockstep: every CPU cycle is followed by three PPU
//! dots, and every dot by one mapper step. It implements
//! [`emu_core::Console`], so any pacing loop that drives a `Console` can run
//! it.

mod bus;
mod callbacks;
mod console;

use emu_core::MasterClock;

pub use bus::{NesBus, RAM_SIZE};
pub use callbacks::StepCallbacks;
pub use console::{ConsoleError, NesConsole};

pub use mos_6502::CpuState;
pub use nes_cartridge::MapperState;
pub use ricoh_ppu_2c02::PpuState;

/// NTSC 2A03 clock: 21.477272 MHz master clock ÷ 12.
pub const NTSC_CPU_HZ: u64 = 1_789_773;

/// Cycle budget per second for pacing an NTSC console.
pub const NTSC_CLOCK: MasterClock = MasterClock::new(NTSC_CPU_HZ);

/// PPU dots per CPU cycle (NTSC).
pub const PPU_DOTS_PER_CPU_CYCLE: u32 = 3;

/// CPU cycles an OAM DMA transfer stalls for, one more when it starts on an
/// odd cycle.
pub const OAM_DMA_CYCLES: u32 = 513;
