//! NES front end.
//!
//! The NES master clock ticks at 21,477,272 Hz (NTSC crystal). The CPU runs
//! at crystal/12 (1,789,773 Hz), which is the rate the pacing driver
//! measures against: one epoch is one emulated second of CPU cycles.

pub mod capture;
pub mod trace;

use emu_core::FrameSink;
use emu_pacer::{CancelToken, DriverError, HostClock, PacingDriver, TelemetrySink};
use nes_console::{ConsoleError, NesConsole, StepCallbacks};

pub use capture::{CaptureError, FrameCapture, save_png};
pub use nes_console::NTSC_CLOCK;
pub use trace::{TraceTarget, trace_callbacks};

/// Load an iNES image and pace an NES console built from it.
///
/// Frames go to `sink` and per-step snapshots to `callbacks`. Returns the
/// number of completed epochs once `cancel` fires.
pub fn run<S, C, T>(
    driver: &mut PacingDriver<C, T>,
    rom: &[u8],
    sink: S,
    callbacks: StepCallbacks,
    cancel: &CancelToken,
) -> Result<u64, DriverError<ConsoleError>>
where
    S: FrameSink,
    C: HostClock,
    T: TelemetrySink,
{
    driver.run(rom, |cartridge| NesConsole::new(cartridge, sink, callbacks), cancel)
}
