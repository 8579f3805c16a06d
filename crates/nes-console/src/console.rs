//! The console and its scheduling quantum.

use emu_core::{Console, FrameSink};
use log::{debug, trace};
use mos_6502::{CpuError, Mos6502, RESET_VECTOR};
use nes_cartridge::{Board, Cartridge};
use thiserror::Error;

use crate::bus::NesBus;
use crate::callbacks::StepCallbacks;
use crate::{OAM_DMA_CYCLES, PPU_DOTS_PER_CPU_CYCLE};

/// Fatal runtime conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Cpu(#[from] CpuError),
}

/// The Nintendo Entertainment System.
pub struct NesConsole<S: FrameSink> {
    /// 2A03 CPU (6502 without BCD).
    cpu: Mos6502,
    bus: NesBus,
    sink: S,
    callbacks: StepCallbacks,
    /// CPU cycles since reset, DMA stalls included.
    total_cycles: u64,
}

impl<S: FrameSink> NesConsole<S> {
    /// Insert a cartridge. Call [`Console::reset`] before stepping.
    pub fn new(cartridge: Cartridge, sink: S, callbacks: StepCallbacks) -> Self {
        Self {
            cpu: Mos6502::new(),
            bus: NesBus::new(Board::new(cartridge)),
            sink,
            callbacks,
            total_cycles: 0,
        }
    }

    #[must_use]
    pub fn cpu(&self) -> &Mos6502 {
        &self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &NesBus {
        &self.bus
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Frames the PPU has completed.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.bus.ppu.frame_count()
    }

    fn oam_dma(&mut self, page: u8) -> u32 {
        self.bus.run_oam_dma(page);
        let cycles = OAM_DMA_CYCLES + u32::from(self.total_cycles % 2 == 1);
        trace!("OAM DMA from ${page:02X}00, {cycles} cycles");
        cycles
    }

    /// Three PPU dots per CPU cycle, each followed by a mapper step.
    fn run_ppu(&mut self, cpu_cycles: u32) {
        let bus = &mut self.bus;
        for _ in 0..cpu_cycles * PPU_DOTS_PER_CPU_CYCLE {
            let frame_complete = bus.ppu.tick(&mut bus.board);
            if let Some(callback) = self.callbacks.ppu.as_mut() {
                callback(&bus.ppu.state());
            }

            bus.board.step(bus.ppu.position());
            if let Some(callback) = self.callbacks.mapper.as_mut() {
                callback(&bus.board.state());
            }

            if frame_complete {
                self.sink.present(bus.ppu.frame());
            }
            if bus.ppu.take_nmi() {
                self.cpu.nmi();
            }
        }
        self.cpu.set_irq(bus.board.irq_pending());
    }
}

impl<S: FrameSink> Console for NesConsole<S> {
    type Error = ConsoleError;

    fn reset(&mut self) {
        self.bus.ppu.reset();
        self.bus.take_dma();
        self.cpu.reset(&mut self.bus);
        self.total_cycles = 0;
        debug!(
            "reset: vector ${RESET_VECTOR:04X} -> ${:04X}, {}",
            self.cpu.pc(),
            self.bus.board.kind()
        );
    }

    fn step(&mut self) -> Result<u32, ConsoleError> {
        let cycles = match self.bus.take_dma() {
            Some(page) => self.oam_dma(page),
            None => self.cpu.step(&mut self.bus)?,
        };
        if let Some(callback) = self.callbacks.cpu.as_mut() {
            callback(&self.cpu.state());
        }

        self.run_ppu(cycles);
        self.total_cycles += u64::from(cycles);
        Ok(cycles)
    }
}
