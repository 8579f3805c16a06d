//! NES CPU memory map.
//!
//! - $0000-$07FF: 2KB internal RAM, mirrored to $1FFF
//! - $2000-$2007: PPU registers, mirrored to $3FFF
//! - $4000-$4013, $4015: APU (writes accepted and dropped)
//! - $4014: OAM DMA
//! - $4016/$4017: controller ports (no buttons pressed)
//! - $4020-$FFFF: cartridge

use emu_core::Bus;
use nes_cartridge::Board;
use ricoh_ppu_2c02::Ppu;

/// Internal work RAM.
pub const RAM_SIZE: usize = 0x0800;

/// Everything the CPU can see.
pub struct NesBus {
    ram: [u8; RAM_SIZE],
    pub ppu: Ppu,
    pub board: Board,
    /// Page written to $4014, waiting for the console to run the transfer.
    dma_page: Option<u8>,
    /// Last value seen on the data bus.
    open_bus: u8,
}

impl NesBus {
    #[must_use]
    pub fn new(board: Board) -> Self {
        Self {
            ram: [0; RAM_SIZE],
            ppu: Ppu::new(),
            board,
            dma_page: None,
            open_bus: 0,
        }
    }

    /// Take a pending OAM DMA request.
    pub fn take_dma(&mut self) -> Option<u8> {
        self.dma_page.take()
    }

    /// Copy page `page` ($XX00-$XXFF) into OAM.
    pub fn run_oam_dma(&mut self, page: u8) {
        let base = u16::from(page) << 8;
        for offset in 0..=0xFF {
            let value = self.read(base | offset);
            self.ppu.write_oam(value);
        }
    }

    /// Internal RAM contents.
    #[must_use]
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }
}

impl Bus for NesBus {
    fn read(&mut self, address: u16) -> u8 {
        let value = match address {
            0x0000..=0x1FFF => self.ram[usize::from(address) & (RAM_SIZE - 1)],
            0x2000..=0x3FFF => self.ppu.cpu_read(address, &mut self.board),
            // Controller ports: serial data low, upper bits from open bus.
            0x4016 | 0x4017 => self.open_bus & 0xE0,
            0x4000..=0x401F => self.open_bus,
            _ => self.board.prg_read(address),
        };
        self.open_bus = value;
        value
    }

    fn write(&mut self, address: u16, value: u8) {
        self.open_bus = value;
        match address {
            0x0000..=0x1FFF => self.ram[usize::from(address) & (RAM_SIZE - 1)] = value,
            0x2000..=0x3FFF => self.ppu.cpu_write(address, value, &mut self.board),
            0x4014 => self.dma_page = Some(value),
            0x4000..=0x401F => {}
            _ => self.board.prg_write(address, value),
        }
    }
}
