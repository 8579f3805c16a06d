//! AxROM (mapper 7). 32K PRG switching and single-screen mirroring.

use ricoh_ppu_2c02::Mirroring;

use super::{Mapper, MapperKind, bank_count};

const BANK: usize = 0x8000;

pub(super) struct Axrom {
    banks: usize,
    bank: usize,
    upper_screen: bool,
}

impl Axrom {
    pub(super) fn new(prg_len: usize) -> Self {
        Self {
            banks: bank_count(prg_len, BANK),
            bank: 0,
            upper_screen: false,
        }
    }
}

impl Mapper for Axrom {
    fn kind(&self) -> MapperKind {
        MapperKind::Axrom
    }

    fn prg_offset(&self, addr: u16) -> usize {
        self.bank * BANK + usize::from(addr & 0x7FFF)
    }

    fn chr_offset(&self, addr: u16) -> usize {
        usize::from(addr & 0x1FFF)
    }

    fn write_register(&mut self, _addr: u16, value: u8) {
        self.bank = usize::from(value & 0x07) % self.banks;
        self.upper_screen = value & 0x10 != 0;
    }

    fn mirroring(&self) -> Option<Mirroring> {
        Some(if self.upper_screen {
            Mirroring::SingleUpper
        } else {
            Mirroring::SingleLower
        })
    }
}
