//! NES mapper implementations.
//!
//! Mappers handle cartridge memory banking. Each mapper number corresponds
//! to a specific banking scheme used by different cartridge boards. A mapper
//! only translates addresses; the memory itself lives in [`Board`](crate::Board).

use std::fmt;

use ricoh_ppu_2c02::{Mirroring, RasterPosition};

mod axrom;
mod cnrom;
mod mmc1;
mod mmc3;
mod nrom;
mod uxrom;

use axrom::Axrom;
use cnrom::Cnrom;
use mmc1::Mmc1;
use mmc3::Mmc3;
use nrom::Nrom;
use uxrom::Uxrom;

/// Supported iNES mapper numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapperKind {
    Nrom,
    Mmc1,
    Uxrom,
    Cnrom,
    Mmc3,
    Axrom,
}

impl MapperKind {
    /// Look up an iNES mapper number.
    #[must_use]
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Nrom),
            1 => Some(Self::Mmc1),
            2 => Some(Self::Uxrom),
            3 => Some(Self::Cnrom),
            4 => Some(Self::Mmc3),
            7 => Some(Self::Axrom),
            _ => None,
        }
    }

    #[must_use]
    pub fn id(self) -> u8 {
        match self {
            Self::Nrom => 0,
            Self::Mmc1 => 1,
            Self::Uxrom => 2,
            Self::Cnrom => 3,
            Self::Mmc3 => 4,
            Self::Axrom => 7,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Nrom => "NROM",
            Self::Mmc1 => "MMC1",
            Self::Uxrom => "UxROM",
            Self::Cnrom => "CNROM",
            Self::Mmc3 => "MMC3",
            Self::Axrom => "AxROM",
        }
    }

    /// Instantiate the banking logic for ROM sizes in bytes.
    pub(crate) fn create(self, prg_len: usize, chr_len: usize) -> Box<dyn Mapper> {
        match self {
            Self::Nrom => Box::new(Nrom::new(prg_len)),
            Self::Mmc1 => Box::new(Mmc1::new(prg_len, chr_len)),
            Self::Uxrom => Box::new(Uxrom::new(prg_len)),
            Self::Cnrom => Box::new(Cnrom::new(prg_len, chr_len)),
            Self::Mmc3 => Box::new(Mmc3::new(prg_len, chr_len)),
            Self::Axrom => Box::new(Axrom::new(prg_len)),
        }
    }
}

impl fmt::Display for MapperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (mapper {})", self.name(), self.id())
    }
}

/// Banking logic of a cartridge board.
pub trait Mapper: Send {
    fn kind(&self) -> MapperKind;

    /// Map a CPU address in $8000-$FFFF to a PRG ROM offset.
    fn prg_offset(&self, addr: u16) -> usize;

    /// Map a PPU address in $0000-$1FFF to a CHR offset.
    fn chr_offset(&self, addr: u16) -> usize;

    /// Handle a CPU write to $8000-$FFFF.
    fn write_register(&mut self, addr: u16, value: u8);

    /// Mirroring selected by the mapper, if it controls mirroring.
    fn mirroring(&self) -> Option<Mirroring> {
        None
    }

    /// Observe one PPU dot.
    fn step(&mut self, _position: RasterPosition) {}

    /// IRQ line level.
    fn irq_pending(&self) -> bool {
        false
    }
}

/// Number of `size`-byte banks in `len` bytes, at least one.
fn bank_count(len: usize, size: usize) -> usize {
    (len / size).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_for_supported_mappers() {
        for id in [0, 1, 2, 3, 4, 7] {
            assert_eq!(MapperKind::from_id(id).map(MapperKind::id), Some(id));
        }
        assert_eq!(MapperKind::from_id(5), None);
        assert_eq!(MapperKind::from_id(66), None);
    }

    #[test]
    fn display_names_mapper_number() {
        assert_eq!(MapperKind::Mmc3.to_string(), "MMC3 (mapper 4)");
    }
}
