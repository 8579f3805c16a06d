//! Register file, VRAM and frame timing.

use std::fmt;

use emu_core::Frame;

use crate::bus::{PpuBus, RasterPosition};

/// Visible width in pixels.
pub const FB_WIDTH: u32 = 256;
/// Visible height in pixels.
pub const FB_HEIGHT: u32 = 240;
/// Dots per scanline.
pub const DOTS_PER_SCANLINE: u16 = 341;
/// Scanlines per NTSC frame, including VBlank and pre-render.
pub const SCANLINES_PER_FRAME: u16 = 262;
/// First VBlank scanline.
pub const VBLANK_SCANLINE: u16 = 241;
/// Pre-render scanline.
pub const PRE_RENDER_SCANLINE: u16 = 261;

/// PPU control register flags ($2000).
pub mod ctrl {
    pub const NAMETABLE: u8 = 0x03;
    pub const VRAM_INCREMENT: u8 = 0x04; // 0=+1, 1=+32
    pub const SPRITE_PATTERN: u8 = 0x08;
    pub const BG_PATTERN: u8 = 0x10;
    pub const SPRITE_SIZE: u8 = 0x20; // 0=8x8, 1=8x16
    pub const NMI_ENABLE: u8 = 0x80;
}

/// PPU mask register flags ($2001).
pub mod mask {
    pub const GREYSCALE: u8 = 0x01;
    pub const BG_LEFT: u8 = 0x02;
    pub const SPRITE_LEFT: u8 = 0x04;
    pub const BG_ENABLE: u8 = 0x08;
    pub const SPRITE_ENABLE: u8 = 0x10;
}

/// PPU status register flags ($2002).
pub mod status {
    pub const SPRITE_OVERFLOW: u8 = 0x20;
    pub const SPRITE_0_HIT: u8 = 0x40;
    pub const VBLANK: u8 = 0x80;
}

/// Immutable snapshot handed to observers after each dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PpuState {
    pub scanline: u16,
    pub dot: u16,
    pub frame: u64,
    pub ctrl: u8,
    pub mask: u8,
    pub status: u8,
    /// Current VRAM address (loopy v).
    pub v: u16,
    /// Temporary VRAM address (loopy t).
    pub t: u16,
}

impl fmt::Display for PpuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PPU:{:3},{:3} FRAME:{} CTRL:{:02X} MASK:{:02X} STATUS:{:02X} V:{:04X}",
            self.scanline, self.dot, self.frame, self.ctrl, self.mask, self.status, self.v
        )
    }
}

/// NES PPU.
pub struct Ppu {
    /// Control register ($2000).
    pub(crate) ctrl: u8,
    /// Mask register ($2001).
    pub(crate) mask: u8,
    /// Status register ($2002).
    pub(crate) status: u8,
    /// OAM address ($2003).
    oam_addr: u8,
    /// Sprite attribute memory, 64 sprites × 4 bytes.
    pub(crate) oam: [u8; 256],
    /// Current VRAM address (loopy v).
    pub(crate) v: u16,
    /// Temporary VRAM address (loopy t).
    t: u16,
    /// Fine X scroll (3 bits).
    pub(crate) fine_x: u8,
    /// Write toggle shared by $2005/$2006.
    write_toggle: bool,
    /// Delayed result for $2007 reads below the palette.
    read_buffer: u8,
    /// Last value driven onto the register bus.
    open_bus: u8,
    /// Nametable RAM. 2K is console-internal; four-screen boards use all 4K.
    nametables: [u8; 0x1000],
    /// Palette RAM.
    pub(crate) palette: [u8; 32],
    scanline: u16,
    dot: u16,
    frame_count: u64,
    odd_frame: bool,
    /// NMI raised and not yet collected by the CPU side.
    nmi_pending: bool,
    pub(crate) frame: Frame,
}

impl Ppu {
    /// Create a PPU in its power-on state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ctrl: 0,
            mask: 0,
            status: 0,
            oam_addr: 0,
            oam: [0; 256],
            v: 0,
            t: 0,
            fine_x: 0,
            write_toggle: false,
            read_buffer: 0,
            open_bus: 0,
            nametables: [0; 0x1000],
            palette: [0; 32],
            scanline: 0,
            dot: 0,
            frame_count: 0,
            odd_frame: false,
            nmi_pending: false,
            frame: Frame::new(FB_WIDTH, FB_HEIGHT),
        }
    }

    /// Reset the PPU. VRAM, OAM and palette contents survive.
    pub fn reset(&mut self) {
        self.ctrl = 0;
        self.mask = 0;
        self.status = 0;
        self.write_toggle = false;
        self.read_buffer = 0;
        self.scanline = 0;
        self.dot = 0;
        self.odd_frame = false;
        self.nmi_pending = false;
    }

    /// Read a PPU register (CPU $2000-$3FFF, mirrored every 8 bytes).
    pub fn cpu_read(&mut self, addr: u16, bus: &mut impl PpuBus) -> u8 {
        let value = match addr & 0x07 {
            // $2002 - Status
            2 => {
                let value = (self.status & 0xE0) | (self.open_bus & 0x1F);
                self.status &= !status::VBLANK;
                self.write_toggle = false;
                value
            }
            // $2004 - OAM data
            4 => self.oam[usize::from(self.oam_addr)],
            // $2007 - VRAM data
            7 => {
                let addr = self.v & 0x3FFF;
                let value = if addr >= 0x3F00 {
                    // Palette reads are immediate; the buffer picks up the
                    // nametable byte underneath.
                    self.read_buffer = self.vram_read(addr - 0x1000, bus);
                    (self.palette[palette_index(addr)] & 0x3F) | (self.open_bus & 0xC0)
                } else {
                    let buffered = self.read_buffer;
                    self.read_buffer = self.vram_read(addr, bus);
                    buffered
                };
                self.increment_vram_addr();
                value
            }
            _ => self.open_bus,
        };
        self.open_bus = value;
        value
    }

    /// Write a PPU register (CPU $2000-$3FFF, mirrored every 8 bytes).
    pub fn cpu_write(&mut self, addr: u16, value: u8, bus: &mut impl PpuBus) {
        self.open_bus = value;
        match addr & 0x07 {
            // $2000 - Control
            0 => {
                let was_enabled = self.ctrl & ctrl::NMI_ENABLE != 0;
                self.ctrl = value;
                // t: ...GH.. ........ <- d: ......GH
                self.t = (self.t & 0xF3FF) | (u16::from(value & ctrl::NAMETABLE) << 10);
                // Enabling NMI while VBlank is already flagged fires immediately.
                if !was_enabled && value & ctrl::NMI_ENABLE != 0 && self.status & status::VBLANK != 0
                {
                    self.nmi_pending = true;
                }
            }
            // $2001 - Mask
            1 => self.mask = value,
            // $2003 - OAM address
            3 => self.oam_addr = value,
            // $2004 - OAM data
            4 => self.write_oam(value),
            // $2005 - Scroll
            5 => {
                let value = u16::from(value);
                if self.write_toggle {
                    self.t = (self.t & 0x8C1F) | ((value & 0x07) << 12) | ((value & 0xF8) << 2);
                } else {
                    self.t = (self.t & 0xFFE0) | (value >> 3);
                    self.fine_x = (value & 0x07) as u8;
                }
                self.write_toggle = !self.write_toggle;
            }
            // $2006 - VRAM address
            6 => {
                let value = u16::from(value);
                if self.write_toggle {
                    self.t = (self.t & 0xFF00) | value;
                    self.v = self.t;
                } else {
                    self.t = (self.t & 0x00FF) | ((value & 0x3F) << 8);
                }
                self.write_toggle = !self.write_toggle;
            }
            // $2007 - VRAM data
            7 => {
                self.vram_write(self.v & 0x3FFF, value, bus);
                self.increment_vram_addr();
            }
            _ => {}
        }
    }

    /// Store one byte at the OAM address and advance it. Used by $2004 and OAM DMA.
    pub fn write_oam(&mut self, value: u8) {
        self.oam[usize::from(self.oam_addr)] = value;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    /// Advance one dot. Returns true when this dot completed a frame
    /// (the start of VBlank).
    pub fn tick(&mut self, bus: &mut impl PpuBus) -> bool {
        self.advance();

        let rendering = self.rendering_enabled();
        let mut frame_complete = false;

        match self.scanline {
            0..=239 => {
                if self.dot == 256 {
                    self.render_scanline(bus);
                    if rendering {
                        self.increment_y();
                    }
                } else if self.dot == 257 && rendering {
                    self.copy_horizontal();
                }
            }
            VBLANK_SCANLINE if self.dot == 1 => {
                self.status |= status::VBLANK;
                if self.ctrl & ctrl::NMI_ENABLE != 0 {
                    self.nmi_pending = true;
                }
                frame_complete = true;
            }
            PRE_RENDER_SCANLINE => {
                if self.dot == 1 {
                    self.status &= !(status::VBLANK | status::SPRITE_0_HIT | status::SPRITE_OVERFLOW);
                }
                if rendering {
                    if self.dot == 257 {
                        self.copy_horizontal();
                    }
                    if (280..=304).contains(&self.dot) {
                        self.copy_vertical();
                    }
                }
            }
            _ => {}
        }

        frame_complete
    }

    /// Move to the next dot, skipping the last pre-render dot on odd
    /// frames while rendering.
    fn advance(&mut self) {
        if self.odd_frame
            && self.rendering_enabled()
            && self.scanline == PRE_RENDER_SCANLINE
            && self.dot == DOTS_PER_SCANLINE - 2
        {
            self.dot = DOTS_PER_SCANLINE - 1;
        }

        self.dot += 1;
        if self.dot >= DOTS_PER_SCANLINE {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline >= SCANLINES_PER_FRAME {
                self.scanline = 0;
                self.frame_count += 1;
                self.odd_frame = !self.odd_frame;
            }
        }
    }

    /// Collect a pending NMI. Returns true at most once per assertion.
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    /// Background or sprite rendering is enabled.
    #[must_use]
    pub fn rendering_enabled(&self) -> bool {
        self.mask & (mask::BG_ENABLE | mask::SPRITE_ENABLE) != 0
    }

    #[must_use]
    pub fn position(&self) -> RasterPosition {
        RasterPosition {
            scanline: self.scanline,
            dot: self.dot,
            rendering_enabled: self.rendering_enabled(),
        }
    }

    #[must_use]
    pub fn state(&self) -> PpuState {
        PpuState {
            scanline: self.scanline,
            dot: self.dot,
            frame: self.frame_count,
            ctrl: self.ctrl,
            mask: self.mask,
            status: self.status,
            v: self.v,
            t: self.t,
        }
    }

    /// The framebuffer, ARGB32 256×240.
    #[must_use]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Frames completed since power-on.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    #[must_use]
    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    #[must_use]
    pub fn dot(&self) -> u16 {
        self.dot
    }

    /// Read PPU address space ($0000-$3FFF).
    pub(crate) fn vram_read(&self, addr: u16, bus: &mut impl PpuBus) -> u8 {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => bus.chr_read(addr),
            0x2000..=0x3EFF => self.nametables[bus.mirroring().nametable_offset(addr)],
            _ => self.palette[palette_index(addr)],
        }
    }

    fn vram_write(&mut self, addr: u16, value: u8, bus: &mut impl PpuBus) {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => bus.chr_write(addr, value),
            0x2000..=0x3EFF => self.nametables[bus.mirroring().nametable_offset(addr)] = value,
            _ => self.palette[palette_index(addr)] = value & 0x3F,
        }
    }

    /// Increment VRAM address by 1 or 32 based on CTRL register.
    fn increment_vram_addr(&mut self) {
        let step = if self.ctrl & ctrl::VRAM_INCREMENT != 0 { 32 } else { 1 };
        self.v = self.v.wrapping_add(step) & 0x7FFF;
    }

    /// Increment fine Y, carrying into coarse Y and the vertical nametable.
    fn increment_y(&mut self) {
        if self.v & 0x7000 != 0x7000 {
            self.v += 0x1000;
            return;
        }
        self.v &= !0x7000;
        let mut coarse_y = (self.v & 0x03E0) >> 5;
        if coarse_y == 29 {
            coarse_y = 0;
            self.v ^= 0x0800;
        } else if coarse_y == 31 {
            // Attribute rows: wrap without switching nametable.
            coarse_y = 0;
        } else {
            coarse_y += 1;
        }
        self.v = (self.v & !0x03E0) | (coarse_y << 5);
    }

    // v: ....A.. ...BCDEF <- t: ....A.. ...BCDEF
    fn copy_horizontal(&mut self) {
        self.v = (self.v & !0x041F) | (self.t & 0x041F);
    }

    // v: GHIA.BC DEF..... <- t: GHIA.BC DEF.....
    fn copy_vertical(&mut self) {
        self.v = (self.v & !0x7BE0) | (self.t & 0x7BE0);
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

/// Palette RAM index for $3F00-$3FFF. $3F10/$14/$18/$1C mirror $3F00/$04/$08/$0C.
pub(crate) fn palette_index(addr: u16) -> usize {
    let index = usize::from(addr & 0x1F);
    if index >= 0x10 && index & 0x03 == 0 {
        index - 0x10
    } else {
        index
    }
}
