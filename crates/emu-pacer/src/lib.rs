//! Real-time pacing for emulated consoles.
//!
//! A [`PacingDriver`] runs a [`Console`](emu_core::Console) in epochs. Each
//! epoch steps the console until it has consumed one emulated second of
//! cycles, measures the host time that took, and reports the effective
//! clock rate as [`Telemetry`]. The loop never sleeps: it measures speed,
//! it does not throttle.
//!
//! [`PacingDriver::run`] loads iNES images through
//! [`nes_cartridge::parse_ines`]; [`PacingDriver::pace`] takes any
//! already-built console.

mod cancel;
mod clock;
mod driver;
mod telemetry;

pub use cancel::CancelToken;
pub use clock::{HostClock, ManualClock, MonotonicClock};
pub use driver::{DriverError, PacingDriver};
pub use telemetry::{StdoutTelemetry, Telemetry, TelemetryFormat, TelemetrySink};
