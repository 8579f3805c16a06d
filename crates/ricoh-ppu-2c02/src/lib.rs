//! Ricoh 2C02 picture processing unit.
//!
//! The PPU runs at three dots per CPU cycle. One NTSC frame is 341 dots ×
//! 262 scanlines: 240 visible lines, one idle line, twenty VBlank lines and
//! the pre-render line. Pattern-table reads and nametable mirroring belong
//! to the cartridge and are reached through [`PpuBus`].
//!
//! Rendering is scanline-granular: each visible line is composed at dot 256
//! from the scroll registers, the nametables and OAM.

mod bus;
mod palette;
mod ppu;
mod render;

pub use bus::{Mirroring, PpuBus, RasterPosition};
pub use palette::NES_PALETTE;
pub use ppu::{
    DOTS_PER_SCANLINE, FB_HEIGHT, FB_WIDTH, PRE_RENDER_SCANLINE, Ppu, PpuState,
    SCANLINES_PER_FRAME, VBLANK_SCANLINE, ctrl, mask, status,
};
