//! The epoch loop.

use emu_core::{Console, MasterClock};
use log::{debug, info};
use nes_cartridge::{Cartridge, FormatError, parse_ines};
use thiserror::Error;

use crate::cancel::CancelToken;
use crate::clock::{HostClock, MonotonicClock};
use crate::telemetry::{StdoutTelemetry, Telemetry, TelemetrySink};

/// Why a paced run stopped before being cancelled.
#[derive(Debug, Error)]
pub enum DriverError<E: std::error::Error + 'static> {
    /// The cartridge image was rejected; no console was built.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// The console failed while stepping.
    #[error("console fault")]
    Runtime(#[source] E),
}

/// Runs a console flat out and reports its speed once per emulated second.
///
/// An epoch's budget is the target clock's frequency: one second of
/// authentic hardware. The driver steps the console until at least that
/// many cycles have elapsed (the last step may overshoot), then divides
/// by the host time the epoch took.
pub struct PacingDriver<C = MonotonicClock, T = StdoutTelemetry> {
    target: MasterClock,
    clock: C,
    telemetry: T,
}

impl PacingDriver {
    /// Wall-clock timing, text telemetry on stdout.
    #[must_use]
    pub fn new(target: MasterClock) -> Self {
        Self::with_parts(target, MonotonicClock::new(), StdoutTelemetry::default())
    }
}

impl<C: HostClock, T: TelemetrySink> PacingDriver<C, T> {
    pub fn with_parts(target: MasterClock, clock: C, telemetry: T) -> Self {
        Self {
            target,
            clock,
            telemetry,
        }
    }

    #[must_use]
    pub fn target(&self) -> MasterClock {
        self.target
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    pub fn telemetry_mut(&mut self) -> &mut T {
        &mut self.telemetry
    }

    /// Parse an iNES image, build a console around the cartridge, reset it
    /// and pace it until `cancel` fires.
    ///
    /// Returns the number of completed epochs. A malformed image fails
    /// before `construct` runs. Without cancellation this only returns on
    /// error.
    pub fn run<K, F>(
        &mut self,
        cartridge_bytes: &[u8],
        construct: F,
        cancel: &CancelToken,
    ) -> Result<u64, DriverError<K::Error>>
    where
        K: Console,
        F: FnOnce(Cartridge) -> K,
    {
        let cartridge = parse_ines(cartridge_bytes)?;
        info!("cartridge: {cartridge}");
        info!("target clock {} Hz", self.target.frequency_hz);

        let mut console = construct(cartridge);
        console.reset();
        self.pace(&mut console, cancel).map_err(DriverError::Runtime)
    }

    /// Run epochs back to back, emitting one sample after each, until
    /// `cancel` is observed at an epoch boundary.
    pub fn pace<K: Console>(&mut self, console: &mut K, cancel: &CancelToken) -> Result<u64, K::Error> {
        let mut epochs = 0;
        while !cancel.is_cancelled() {
            let sample = self.run_epoch(console)?;
            debug!(
                "epoch {epochs}: {} cycles in {:.6}s",
                sample.cycles, sample.elapsed_secs
            );
            self.telemetry.emit(&sample);
            epochs += 1;
        }
        info!("cancelled after {epochs} epochs");
        Ok(epochs)
    }

    /// Step through one cycle budget and measure it. Does not emit.
    pub fn run_epoch<K: Console>(&mut self, console: &mut K) -> Result<Telemetry, K::Error> {
        let budget = self.target.frequency_hz;
        let start = self.clock.now();
        let mut cycles = 0u64;
        while cycles < budget {
            cycles += u64::from(console.step()?);
        }
        let elapsed = self.clock.now().saturating_sub(start);
        Ok(Telemetry::measure(cycles, elapsed, self.target))
    }
}
