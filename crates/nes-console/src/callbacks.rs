//! Optional per-step instrumentation.

use std::fmt;

use mos_6502::CpuState;
use nes_cartridge::MapperState;
use ricoh_ppu_2c02::PpuState;

type Callback<T> = Option<Box<dyn FnMut(&T)>>;

/// Observers invoked synchronously from [`NesConsole::step`](crate::NesConsole).
///
/// The CPU callback fires once per step, after the instruction (or DMA
/// transfer). The PPU and mapper callbacks fire after every dot. Each sees
/// an immutable snapshot.
#[derive(Default)]
pub struct StepCallbacks {
    pub mapper: Callback<MapperState>,
    pub cpu: Callback<CpuState>,
    pub ppu: Callback<PpuState>,
}

impl StepCallbacks {
    /// No instrumentation.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cpu(mut self, callback: impl FnMut(&CpuState) + 'static) -> Self {
        self.cpu = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn with_ppu(mut self, callback: impl FnMut(&PpuState) + 'static) -> Self {
        self.ppu = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn with_mapper(mut self, callback: impl FnMut(&MapperState) + 'static) -> Self {
        self.mapper = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for StepCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepCallbacks")
            .field("mapper", &self.mapper.is_some())
            .field("cpu", &self.cpu.is_some())
            .field("ppu", &self.ppu.is_some())
            .finish()
    }
}
