//! UxROM (mapper 2). Switchable 16K at $8000, last bank fixed at $C000.

use super::{Mapper, MapperKind, bank_count};

const BANK: usize = 0x4000;

pub(super) struct Uxrom {
    banks: usize,
    bank: usize,
}

impl Uxrom {
    pub(super) fn new(prg_len: usize) -> Self {
        Self {
            banks: bank_count(prg_len, BANK),
            bank: 0,
        }
    }
}

impl Mapper for Uxrom {
    fn kind(&self) -> MapperKind {
        MapperKind::Uxrom
    }

    fn prg_offset(&self, addr: u16) -> usize {
        let bank = if addr < 0xC000 { self.bank } else { self.banks - 1 };
        bank * BANK + usize::from(addr & 0x3FFF)
    }

    fn chr_offset(&self, addr: u16) -> usize {
        usize::from(addr & 0x1FFF)
    }

    fn write_register(&mut self, _addr: u16, value: u8) {
        self.bank = usize::from(value & 0x0F) % self.banks;
    }
}
