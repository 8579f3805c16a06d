//! MMC1 (mapper 1). Serial-loaded registers.
//! Used by: Zelda, Metroid, Mega Man 2.

use ricoh_ppu_2c02::Mirroring;

use super::{Mapper, MapperKind, bank_count};

const PRG_BANK: usize = 0x4000;
const CHR_BANK: usize = 0x1000;

pub(super) struct Mmc1 {
    prg_banks: usize,
    chr_banks: usize,
    shift: u8,
    writes: u8,
    /// CPPMM: CHR mode, PRG mode, mirroring.
    control: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,
}

impl Mmc1 {
    pub(super) fn new(prg_len: usize, chr_len: usize) -> Self {
        Self {
            prg_banks: bank_count(prg_len, PRG_BANK),
            chr_banks: bank_count(chr_len, CHR_BANK),
            shift: 0,
            writes: 0,
            // 16K PRG, last bank fixed.
            control: 0x0C,
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
        }
    }

    fn prg_window(&self, bank: usize, addr: u16) -> usize {
        (bank % self.prg_banks) * PRG_BANK + usize::from(addr & 0x3FFF)
    }
}

impl Mapper for Mmc1 {
    fn kind(&self) -> MapperKind {
        MapperKind::Mmc1
    }

    fn prg_offset(&self, addr: u16) -> usize {
        let bank = usize::from(self.prg_bank & 0x0F);
        let high = addr >= 0xC000;
        match (self.control >> 2) & 0x03 {
            0 | 1 => self.prg_window((bank & !1) + usize::from(high), addr),
            2 => self.prg_window(if high { bank } else { 0 }, addr),
            _ => self.prg_window(if high { self.prg_banks - 1 } else { bank }, addr),
        }
    }

    fn chr_offset(&self, addr: u16) -> usize {
        let high = addr >= 0x1000;
        let bank = if self.control & 0x10 == 0 {
            usize::from(self.chr_bank0 & 0x1E) + usize::from(high)
        } else if high {
            usize::from(self.chr_bank1)
        } else {
            usize::from(self.chr_bank0)
        };
        (bank % self.chr_banks) * CHR_BANK + usize::from(addr & 0x0FFF)
    }

    fn write_register(&mut self, addr: u16, value: u8) {
        if value & 0x80 != 0 {
            self.shift = 0;
            self.writes = 0;
            self.control |= 0x0C;
            return;
        }

        self.shift |= (value & 1) << self.writes;
        self.writes += 1;
        if self.writes < 5 {
            return;
        }

        let data = self.shift;
        match addr {
            0x8000..=0x9FFF => self.control = data,
            0xA000..=0xBFFF => self.chr_bank0 = data,
            0xC000..=0xDFFF => self.chr_bank1 = data,
            _ => self.prg_bank = data & 0x0F,
        }
        self.shift = 0;
        self.writes = 0;
    }

    fn mirroring(&self) -> Option<Mirroring> {
        Some(match self.control & 0x03 {
            0 => Mirroring::SingleLower,
            1 => Mirroring::SingleUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        })
    }
}
