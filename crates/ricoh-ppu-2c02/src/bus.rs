//! Cartridge-facing side of the PPU address space.

/// Nametable mirroring mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    /// $2000 = $2400, $2800 = $2C00 (vertical scrolling games).
    Horizontal,
    /// $2000 = $2800, $2400 = $2C00 (horizontal scrolling games).
    Vertical,
    /// All four tables show the lower page.
    SingleLower,
    /// All four tables show the upper page.
    SingleUpper,
    /// Cartridge supplies the extra 2K; every table is distinct.
    FourScreen,
}

impl Mirroring {
    /// Offset of a nametable address ($2000-$3EFF) into 4K of nametable RAM.
    #[must_use]
    pub fn nametable_offset(self, addr: u16) -> usize {
        let addr = usize::from(addr & 0x0FFF);
        let table = addr / 0x400;
        let page = match self {
            Self::Horizontal => table / 2,
            Self::Vertical => table % 2,
            Self::SingleLower => 0,
            Self::SingleUpper => 1,
            Self::FourScreen => table,
        };
        page * 0x400 + (addr & 0x3FF)
    }
}

/// Pattern-table access and mirroring control, provided by the cartridge.
///
/// `chr_read` takes `&mut self` so boards can observe PPU fetches.
pub trait PpuBus {
    /// Read from pattern-table space ($0000-$1FFF).
    fn chr_read(&mut self, addr: u16) -> u8;

    /// Write to pattern-table space. Ignored unless the board has CHR RAM.
    fn chr_write(&mut self, addr: u16, value: u8);

    /// Current nametable mirroring.
    fn mirroring(&self) -> Mirroring;
}

/// Where the PPU is in the frame, as seen by the cartridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterPosition {
    /// Scanline, 0-261 (261 is pre-render).
    pub scanline: u16,
    /// Dot within the scanline, 0-340.
    pub dot: u16,
    /// Background or sprite rendering is switched on.
    pub rendering_enabled: bool,
}
