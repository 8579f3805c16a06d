//! Step tracing through the `log` facade.

use clap::ValueEnum;
use log::trace;
use nes_console::StepCallbacks;

/// Which sub-step to log after every console step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TraceTarget {
    /// Registers after each instruction (`emu_nes::cpu`).
    Cpu,
    /// Raster position and registers after each dot (`emu_nes::ppu`).
    Ppu,
    /// Banking state after each dot (`emu_nes::mapper`).
    Mapper,
}

/// Build callbacks that log the requested snapshots at `trace` level.
///
/// Targets not listed get no callback at all, so an empty list costs
/// nothing per step.
#[must_use]
pub fn trace_callbacks(targets: &[TraceTarget]) -> StepCallbacks {
    let mut callbacks = StepCallbacks::none();
    if targets.contains(&TraceTarget::Cpu) {
        callbacks = callbacks.with_cpu(|state| trace!(target: "emu_nes::cpu", "{state}"));
    }
    if targets.contains(&TraceTarget::Ppu) {
        callbacks = callbacks.with_ppu(|state| trace!(target: "emu_nes::ppu", "{state}"));
    }
    if targets.contains(&TraceTarget::Mapper) {
        callbacks = callbacks.with_mapper(|state| trace!(target: "emu_nes::mapper", "{state}"));
    }
    callbacks
}
