//! Cartridge memory wired to a live mapper.

use std::fmt;

use ricoh_ppu_2c02::{Mirroring, PpuBus, RasterPosition};

use crate::ines::{CHR_BANK_SIZE, Cartridge};
use crate::mapper::{Mapper, MapperKind};

/// Work RAM at $6000-$7FFF.
pub const PRG_RAM_SIZE: usize = 0x2000;

/// Snapshot of the banking state, taken after each mapper step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapperState {
    pub kind: MapperKind,
    /// 8K PRG ROM bank visible in each of $8000/$A000/$C000/$E000.
    pub prg_banks: [usize; 4],
    /// 1K CHR bank visible in each of the eight pattern-table windows.
    pub chr_banks: [usize; 8],
    pub mirroring: Mirroring,
    pub irq: bool,
}

impl fmt::Display for MapperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} PRG:{:?} CHR:{:?} {:?}{}",
            self.kind.name(),
            self.prg_banks,
            self.chr_banks,
            self.mirroring,
            if self.irq { " IRQ" } else { "" }
        )
    }
}

/// NES cartridge board: PRG ROM, CHR ROM or RAM, work RAM and the mapper.
pub struct Board {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_ram: Vec<u8>,
    /// Header mirroring, used when the mapper does not control it.
    mirroring: Mirroring,
    mapper: Box<dyn Mapper>,
}

impl Board {
    /// Take ownership of a cartridge and power the board on.
    #[must_use]
    pub fn new(cartridge: Cartridge) -> Self {
        let (prg_rom, chr_rom, kind, mirroring) = cartridge.into_parts();
        let chr_is_ram = chr_rom.is_empty();
        let chr = if chr_is_ram { vec![0; CHR_BANK_SIZE] } else { chr_rom };
        let mapper = kind.create(prg_rom.len(), chr.len());
        Self {
            prg_rom,
            chr,
            chr_is_ram,
            prg_ram: vec![0; PRG_RAM_SIZE],
            mirroring,
            mapper,
        }
    }

    /// Read cartridge space ($4020-$FFFF). Unmapped addresses read 0.
    pub fn prg_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.prg_ram[usize::from(addr - 0x6000)],
            0x8000..=0xFFFF => {
                let offset = self.mapper.prg_offset(addr);
                self.prg_rom[offset % self.prg_rom.len()]
            }
            _ => 0,
        }
    }

    /// Write cartridge space. $8000-$FFFF goes to the mapper registers.
    pub fn prg_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => self.prg_ram[usize::from(addr - 0x6000)] = value,
            0x8000..=0xFFFF => self.mapper.write_register(addr, value),
            _ => {}
        }
    }

    /// Advance the mapper by one PPU dot.
    pub fn step(&mut self, position: RasterPosition) {
        self.mapper.step(position);
    }

    /// IRQ line level from the mapper.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.mapper.irq_pending()
    }

    #[must_use]
    pub fn kind(&self) -> MapperKind {
        self.mapper.kind()
    }

    #[must_use]
    pub fn has_chr_ram(&self) -> bool {
        self.chr_is_ram
    }

    #[must_use]
    pub fn state(&self) -> MapperState {
        let mut prg_banks = [0; 4];
        for (window, bank) in prg_banks.iter_mut().enumerate() {
            let addr = 0x8000 + (window as u16) * 0x2000;
            *bank = (self.mapper.prg_offset(addr) % self.prg_rom.len()) / 0x2000;
        }
        let mut chr_banks = [0; 8];
        for (window, bank) in chr_banks.iter_mut().enumerate() {
            let addr = (window as u16) * 0x0400;
            *bank = (self.mapper.chr_offset(addr) % self.chr.len()) / 0x0400;
        }
        MapperState {
            kind: self.mapper.kind(),
            prg_banks,
            chr_banks,
            mirroring: self.mirroring(),
            irq: self.mapper.irq_pending(),
        }
    }
}

impl PpuBus for Board {
    fn chr_read(&mut self, addr: u16) -> u8 {
        let offset = self.mapper.chr_offset(addr);
        self.chr[offset % self.chr.len()]
    }

    fn chr_write(&mut self, addr: u16, value: u8) {
        if self.chr_is_ram {
            let offset = self.mapper.chr_offset(addr) % self.chr.len();
            self.chr[offset] = value;
        }
    }

    fn mirroring(&self) -> Mirroring {
        // Four-screen boards carry their own VRAM and ignore mirroring control.
        if self.mirroring == Mirroring::FourScreen {
            return Mirroring::FourScreen;
        }
        self.mapper.mirroring().unwrap_or(self.mirroring)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board").field("state", &self.state()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ines::PRG_BANK_SIZE;

    fn banked_prg(banks: usize) -> Vec<u8> {
        (0..banks * PRG_BANK_SIZE).map(|i| (i / PRG_BANK_SIZE) as u8).collect()
    }

    #[test]
    fn empty_prg_is_rejected_before_a_board_exists() {
        let result = Cartridge::new(Vec::new(), Vec::new(), MapperKind::Nrom, Mirroring::Vertical);
        assert_eq!(result, Err(crate::ines::FormatError::NoPrgRom));
    }

    #[test]
    fn prg_ram_is_read_write() {
        let mut board = Board::new(Cartridge::new(
            banked_prg(1),
            vec![0; CHR_BANK_SIZE],
            MapperKind::Nrom,
            Mirroring::Horizontal,
        )
        .expect("valid sections"));
        board.prg_write(0x6123, 0x42);
        assert_eq!(board.prg_read(0x6123), 0x42);
        assert_eq!(board.prg_read(0x5000), 0);
    }

    #[test]
    fn chr_rom_ignores_writes_chr_ram_accepts_them() {
        let mut rom_board = Board::new(Cartridge::new(
            banked_prg(1),
            vec![0x11; CHR_BANK_SIZE],
            MapperKind::Nrom,
            Mirroring::Horizontal,
        )
        .expect("valid sections"));
        rom_board.chr_write(0x0100, 0x99);
        assert_eq!(rom_board.chr_read(0x0100), 0x11);

        let mut ram_board = Board::new(Cartridge::new(
            banked_prg(1),
            Vec::new(),
            MapperKind::Nrom,
            Mirroring::Horizontal,
        )
        .expect("valid sections"));
        assert!(ram_board.has_chr_ram());
        ram_board.chr_write(0x0100, 0x99);
        assert_eq!(ram_board.chr_read(0x0100), 0x99);
    }

    #[test]
    fn uxrom_register_write_switches_prg() {
        let mut board = Board::new(Cartridge::new(
            banked_prg(4),
            Vec::new(),
            MapperKind::Uxrom,
            Mirroring::Vertical,
        )
        .expect("valid sections"));
        assert_eq!(board.prg_read(0xC000), 3);
        board.prg_write(0x8000, 2);
        assert_eq!(board.prg_read(0x8000), 2);
        assert_eq!(board.state().prg_banks, [4, 5, 6, 7]);
    }

    #[test]
    fn header_mirroring_until_mapper_takes_over() {
        let mut board = Board::new(Cartridge::new(
            banked_prg(2),
            vec![0; CHR_BANK_SIZE],
            MapperKind::Mmc3,
            Mirroring::Vertical,
        )
        .expect("valid sections"));
        assert_eq!(board.mirroring(), Mirroring::Vertical);
        board.prg_write(0xA000, 1);
        assert_eq!(board.mirroring(), Mirroring::Horizontal);
        assert_eq!(board.state().mirroring, Mirroring::Horizontal);
    }

    #[test]
    fn four_screen_wins_over_mapper() {
        let mut board = Board::new(Cartridge::new(
            banked_prg(2),
            vec![0; CHR_BANK_SIZE],
            MapperKind::Mmc3,
            Mirroring::FourScreen,
        )
        .expect("valid sections"));
        board.prg_write(0xA000, 0);
        assert_eq!(board.mirroring(), Mirroring::FourScreen);
    }
}
