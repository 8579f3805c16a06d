//! Master clock configuration.

/// Authentic clock rate of an emulated system.
///
/// This is the baseline that host-side pacing measures against: one
/// second of real hardware executes `frequency_hz` cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterClock {
    /// Clock frequency in Hz (e.g. `1_789_773` for the NTSC 2A03).
    pub frequency_hz: u64,
}

impl MasterClock {
    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }
}
