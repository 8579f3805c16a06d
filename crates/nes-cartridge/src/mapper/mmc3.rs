//! MMC3 (mapper 4). 8K PRG / 1K CHR banking with a scanline IRQ counter.
//! Used by: Super Mario Bros. 3, Kirby's Adventure.

use ricoh_ppu_2c02::{Mirroring, PRE_RENDER_SCANLINE, RasterPosition};

use super::{Mapper, MapperKind, bank_count};

const PRG_BANK: usize = 0x2000;
const CHR_BANK: usize = 0x0400;

/// Dot at which the PPU's sprite fetches toggle A12 on a rendering line.
const IRQ_CLOCK_DOT: u16 = 280;

pub(super) struct Mmc3 {
    prg_banks: usize,
    chr_banks: usize,
    bank_select: u8,
    registers: [u8; 8],
    /// `None` until the game writes $A000.
    mirroring: Option<Mirroring>,
    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq_pending: bool,
}

impl Mmc3 {
    pub(super) fn new(prg_len: usize, chr_len: usize) -> Self {
        Self {
            prg_banks: bank_count(prg_len, PRG_BANK),
            chr_banks: bank_count(chr_len, CHR_BANK),
            bank_select: 0,
            registers: [0; 8],
            mirroring: None,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,
        }
    }

    fn prg_bank(&self, window: usize) -> usize {
        let second_last = self.prg_banks.saturating_sub(2);
        let r6 = usize::from(self.registers[6] & 0x3F);
        let r7 = usize::from(self.registers[7] & 0x3F);
        let swapped = self.bank_select & 0x40 != 0;
        let bank = match window {
            0 if swapped => second_last,
            0 => r6,
            1 => r7,
            2 if swapped => r6,
            2 => second_last,
            _ => self.prg_banks - 1,
        };
        bank % self.prg_banks
    }

    fn clock_irq_counter(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }
        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }
}

impl Mapper for Mmc3 {
    fn kind(&self) -> MapperKind {
        MapperKind::Mmc3
    }

    fn prg_offset(&self, addr: u16) -> usize {
        let window = usize::from((addr - 0x8000) / 0x2000);
        self.prg_bank(window) * PRG_BANK + usize::from(addr & 0x1FFF)
    }

    fn chr_offset(&self, addr: u16) -> usize {
        let mut slot = usize::from((addr & 0x1FFF) / 0x0400);
        if self.bank_select & 0x80 != 0 {
            slot ^= 4;
        }
        let r = &self.registers;
        let bank = match slot {
            0 => r[0] & 0xFE,
            1 => r[0] | 0x01,
            2 => r[1] & 0xFE,
            3 => r[1] | 0x01,
            4 => r[2],
            5 => r[3],
            6 => r[4],
            _ => r[5],
        };
        (usize::from(bank) % self.chr_banks) * CHR_BANK + usize::from(addr & 0x03FF)
    }

    fn write_register(&mut self, addr: u16, value: u8) {
        match addr & 0xE001 {
            0x8000 => self.bank_select = value,
            0x8001 => self.registers[usize::from(self.bank_select & 0x07)] = value,
            0xA000 => {
                self.mirroring = Some(if value & 0x01 == 0 {
                    Mirroring::Vertical
                } else {
                    Mirroring::Horizontal
                });
            }
            // $A001 PRG RAM protect: RAM stays enabled.
            0xA001 => {}
            0xC000 => self.irq_latch = value,
            0xC001 => {
                self.irq_counter = 0;
                self.irq_reload = true;
            }
            0xE000 => {
                self.irq_enabled = false;
                self.irq_pending = false;
            }
            _ => self.irq_enabled = true,
        }
    }

    fn mirroring(&self) -> Option<Mirroring> {
        self.mirroring
    }

    fn step(&mut self, position: RasterPosition) {
        if position.dot == IRQ_CLOCK_DOT
            && position.rendering_enabled
            && (position.scanline < 240 || position.scanline == PRE_RENDER_SCANLINE)
        {
            self.clock_irq_counter();
        }
    }

    fn irq_pending(&self) -> bool {
        self.irq_pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(mmc3: &mut Mmc3, register: u8, bank: u8) {
        let mode = mmc3.bank_select & 0xC0;
        mmc3.write_register(0x8000, mode | register);
        mmc3.write_register(0x8001, bank);
    }

    fn scanline(mmc3: &mut Mmc3, line: u16) {
        mmc3.step(RasterPosition {
            scanline: line,
            dot: IRQ_CLOCK_DOT,
            rendering_enabled: true,
        });
    }

    #[test]
    fn prg_mode_zero() {
        let mut mmc3 = Mmc3::new(16 * PRG_BANK, 0x2000);
        select(&mut mmc3, 6, 3);
        select(&mut mmc3, 7, 5);
        assert_eq!(mmc3.prg_offset(0x8000), 3 * PRG_BANK);
        assert_eq!(mmc3.prg_offset(0xA000), 5 * PRG_BANK);
        assert_eq!(mmc3.prg_offset(0xC000), 14 * PRG_BANK);
        assert_eq!(mmc3.prg_offset(0xE000), 15 * PRG_BANK);
    }

    #[test]
    fn prg_mode_one_swaps_fixed_window() {
        let mut mmc3 = Mmc3::new(16 * PRG_BANK, 0x2000);
        mmc3.write_register(0x8000, 0x40);
        select(&mut mmc3, 6, 3);
        assert_eq!(mmc3.prg_offset(0x8000), 14 * PRG_BANK);
        assert_eq!(mmc3.prg_offset(0xC000), 3 * PRG_BANK);
        assert_eq!(mmc3.prg_offset(0xE000), 15 * PRG_BANK);
    }

    #[test]
    fn chr_inversion_swaps_halves() {
        let mut mmc3 = Mmc3::new(4 * PRG_BANK, 0x8000);
        select(&mut mmc3, 0, 8);
        select(&mut mmc3, 2, 20);
        assert_eq!(mmc3.chr_offset(0x0400), 9 * CHR_BANK);
        assert_eq!(mmc3.chr_offset(0x1000), 20 * CHR_BANK);

        mmc3.write_register(0x8000, 0x80);
        assert_eq!(mmc3.chr_offset(0x0000), 20 * CHR_BANK);
        assert_eq!(mmc3.chr_offset(0x1400), 9 * CHR_BANK);
    }

    #[test]
    fn mirroring_is_unset_until_written() {
        let mut mmc3 = Mmc3::new(4 * PRG_BANK, 0x2000);
        assert_eq!(mmc3.mirroring(), None);
        mmc3.write_register(0xA000, 1);
        assert_eq!(mmc3.mirroring(), Some(Mirroring::Horizontal));
    }

    #[test]
    fn irq_fires_after_latch_plus_one_lines() {
        let mut mmc3 = Mmc3::new(4 * PRG_BANK, 0x2000);
        mmc3.write_register(0xC000, 3);
        mmc3.write_register(0xC001, 0);
        mmc3.write_register(0xE001, 0);

        // Reload to 3, then count down through 2, 1 and 0.
        for line in 0..3 {
            scanline(&mut mmc3, line);
            assert!(!mmc3.irq_pending(), "line {line}");
        }
        scanline(&mut mmc3, 3);
        assert!(mmc3.irq_pending());

        mmc3.write_register(0xE000, 0);
        assert!(!mmc3.irq_pending());
    }

    #[test]
    fn counter_ignores_vblank_and_disabled_rendering() {
        let mut mmc3 = Mmc3::new(4 * PRG_BANK, 0x2000);
        mmc3.write_register(0xC000, 0);
        mmc3.write_register(0xE001, 0);
        scanline(&mut mmc3, 245);
        mmc3.step(RasterPosition {
            scanline: 10,
            dot: IRQ_CLOCK_DOT,
            rendering_enabled: false,
        });
        assert!(!mmc3.irq_pending());

        scanline(&mut mmc3, PRE_RENDER_SCANLINE);
        assert!(mmc3.irq_pending());
    }
}
