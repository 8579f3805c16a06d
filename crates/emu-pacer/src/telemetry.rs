//! Per-epoch speed samples and where they go.

use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

use emu_core::MasterClock;
use serde::Serialize;

/// Effective emulation speed measured over one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Telemetry {
    /// Emulated cycles executed in the epoch.
    pub cycles: u64,
    /// Host seconds the epoch took, floored at one nanosecond.
    pub elapsed_secs: f64,
    /// Emulated cycles per host second, truncated.
    pub clock_hz: u64,
    /// `clock_hz` relative to the authentic clock, rounded to the nearest
    /// percent.
    pub speed_percent: u64,
}

impl Telemetry {
    /// Derive a sample from an epoch's cycle count and host duration.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn measure(cycles: u64, elapsed: Duration, target: MasterClock) -> Self {
        let elapsed = elapsed.max(Duration::from_nanos(1));
        let clock_hz = u128::from(cycles) * 1_000_000_000 / elapsed.as_nanos();
        let clock_hz = u64::try_from(clock_hz).unwrap_or(u64::MAX);
        let speed_percent =
            (clock_hz as f64 / target.frequency_hz.max(1) as f64 * 100.0).round() as u64;
        Self {
            cycles,
            elapsed_secs: elapsed.as_secs_f64(),
            clock_hz,
            speed_percent,
        }
    }
}

impl fmt::Display for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Clock={}Hz ({}% speed)", self.clock_hz, self.speed_percent)
    }
}

/// Receives one sample per completed epoch.
pub trait TelemetrySink {
    fn emit(&mut self, sample: &Telemetry);
}

impl<F: FnMut(&Telemetry)> TelemetrySink for F {
    fn emit(&mut self, sample: &Telemetry) {
        self(sample);
    }
}

/// Line format for [`StdoutTelemetry`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TelemetryFormat {
    /// `Clock=<hz>Hz (<percent>% speed)`
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl TelemetryFormat {
    /// Render a sample as a single line, without the newline.
    #[must_use]
    pub fn render(self, sample: &Telemetry) -> String {
        match self {
            Self::Text => sample.to_string(),
            Self::Json => serde_json::to_string(sample).unwrap_or_default(),
        }
    }
}

/// Writes each sample to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutTelemetry {
    format: TelemetryFormat,
}

impl StdoutTelemetry {
    #[must_use]
    pub fn new(format: TelemetryFormat) -> Self {
        Self { format }
    }

    #[must_use]
    pub fn format(&self) -> TelemetryFormat {
        self.format
    }
}

impl TelemetrySink for StdoutTelemetry {
    fn emit(&mut self, sample: &Telemetry) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", self.format.render(sample));
        let _ = stdout.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MHZ: MasterClock = MasterClock::new(1_000_000);

    #[test]
    fn one_second_at_target_is_full_speed() {
        let sample = Telemetry::measure(1_000_000, Duration::from_secs(1), MHZ);
        assert_eq!(sample.clock_hz, 1_000_000);
        assert_eq!(sample.speed_percent, 100);
        assert_eq!(sample.to_string(), "Clock=1000000Hz (100% speed)");
    }

    #[test]
    fn fractional_seconds_are_honoured() {
        let sample = Telemetry::measure(1_000_000, Duration::from_millis(400), MHZ);
        assert_eq!(sample.clock_hz, 2_500_000);
        assert_eq!(sample.speed_percent, 250);
        assert!((sample.elapsed_secs - 0.4).abs() < 1e-12);
    }

    #[test]
    fn speed_rounds_to_nearest_percent() {
        let ntsc = MasterClock::new(1_789_773);
        let sample = Telemetry::measure(1_789_773, Duration::from_millis(1_006), ntsc);
        // 1_779_098 Hz is 99.40% of NTSC.
        assert_eq!(sample.clock_hz, 1_779_098);
        assert_eq!(sample.speed_percent, 99);
    }

    #[test]
    fn zero_elapsed_is_floored_to_a_nanosecond() {
        let sample = Telemetry::measure(1_000_000, Duration::ZERO, MHZ);
        assert_eq!(sample.clock_hz, 1_000_000_000_000_000);
        assert_eq!(sample.elapsed_secs, 1e-9);
    }

    #[test]
    fn json_line_has_all_fields() {
        let sample = Telemetry::measure(2_000_000, Duration::from_secs(1), MHZ);
        let line = TelemetryFormat::Json.render(&sample);
        let value: serde_json::Value = serde_json::from_str(&line).expect("valid JSON");
        assert_eq!(value["cycles"], 2_000_000);
        assert_eq!(value["elapsed_secs"], 1.0);
        assert_eq!(value["clock_hz"], 2_000_000);
        assert_eq!(value["speed_percent"], 200);
        assert!(!line.contains('\n'));
    }

    #[test]
    fn closures_are_sinks() {
        let mut seen = Vec::new();
        {
            let mut sink = |sample: &Telemetry| seen.push(sample.clock_hz);
            sink.emit(&Telemetry::measure(5, Duration::from_secs(1), MHZ));
        }
        assert_eq!(seen, [5]);
    }
}
