//! CNROM (mapper 3). Fixed PRG, switchable 8K CHR.

use super::{Mapper, MapperKind, bank_count};

const CHR_BANK: usize = 0x2000;

pub(super) struct Cnrom {
    prg_len: usize,
    chr_banks: usize,
    chr_bank: usize,
}

impl Cnrom {
    pub(super) fn new(prg_len: usize, chr_len: usize) -> Self {
        Self {
            prg_len,
            chr_banks: bank_count(chr_len, CHR_BANK),
            chr_bank: 0,
        }
    }
}

impl Mapper for Cnrom {
    fn kind(&self) -> MapperKind {
        MapperKind::Cnrom
    }

    fn prg_offset(&self, addr: u16) -> usize {
        usize::from(addr - 0x8000) % self.prg_len.max(1)
    }

    fn chr_offset(&self, addr: u16) -> usize {
        self.chr_bank * CHR_BANK + usize::from(addr & 0x1FFF)
    }

    fn write_register(&mut self, _addr: u16, value: u8) {
        self.chr_bank = usize::from(value & 0x03) % self.chr_banks;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_chr_bank() {
        let mut cnrom = Cnrom::new(0x8000, 4 * CHR_BANK);
        cnrom.write_register(0x8000, 2);
        assert_eq!(cnrom.chr_offset(0x0010), 2 * CHR_BANK + 0x10);
        assert_eq!(cnrom.prg_offset(0x8000), 0);
    }
}
