//! NROM (mapper 0). No banking.

use super::{Mapper, MapperKind};

pub(super) struct Nrom {
    prg_len: usize,
}

impl Nrom {
    pub(super) fn new(prg_len: usize) -> Self {
        Self { prg_len }
    }
}

impl Mapper for Nrom {
    fn kind(&self) -> MapperKind {
        MapperKind::Nrom
    }

    fn prg_offset(&self, addr: u16) -> usize {
        // 16K images mirror $8000-$BFFF into $C000-$FFFF.
        usize::from(addr - 0x8000) % self.prg_len.max(1)
    }

    fn chr_offset(&self, addr: u16) -> usize {
        usize::from(addr & 0x1FFF)
    }

    fn write_register(&mut self, _addr: u16, _value: u8) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_k_is_mirrored() {
        let nrom = Nrom::new(0x4000);
        assert_eq!(nrom.prg_offset(0x8000), 0);
        assert_eq!(nrom.prg_offset(0xC000), 0);
        assert_eq!(nrom.prg_offset(0xFFFC), 0x3FFC);
    }

    #[test]
    fn thirty_two_k_is_linear() {
        let nrom = Nrom::new(0x8000);
        assert_eq!(nrom.prg_offset(0xC000), 0x4000);
        assert_eq!(nrom.prg_offset(0xFFFF), 0x7FFF);
    }
}
