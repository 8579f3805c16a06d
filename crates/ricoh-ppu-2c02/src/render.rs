//! Scanline composition: background, sprites, priority and sprite-0 hit.

use crate::bus::PpuBus;
use crate::palette::NES_PALETTE;
use crate::ppu::{FB_WIDTH, Ppu, ctrl, mask, palette_index, status};

const WIDTH: usize = FB_WIDTH as usize;

#[derive(Debug, Clone, Copy)]
struct SpritePixel {
    /// Palette entry (0x10-0x1F).
    entry: u8,
    behind_background: bool,
    sprite_zero: bool,
}

impl Ppu {
    /// Compose the current visible scanline into the framebuffer.
    pub(crate) fn render_scanline(&mut self, bus: &mut impl PpuBus) {
        let y = self.scanline();

        // Palette entry per pixel; low two bits zero means transparent.
        let mut background = [0u8; WIDTH];
        if self.mask & mask::BG_ENABLE != 0 {
            self.fetch_background(bus, &mut background);
        }

        let mut sprites = [None; WIDTH];
        if self.mask & mask::SPRITE_ENABLE != 0 {
            self.evaluate_sprites(bus, y, &mut sprites);
        }

        let mut line = [0u32; WIDTH];
        for (x, out) in line.iter_mut().enumerate() {
            let left_edge = x < 8;
            let bg = if left_edge && self.mask & mask::BG_LEFT == 0 {
                0
            } else {
                background[x]
            };
            let sprite = if left_edge && self.mask & mask::SPRITE_LEFT == 0 {
                None
            } else {
                sprites[x]
            };

            let bg_opaque = bg & 0x03 != 0;
            let entry = match sprite {
                Some(sp) => {
                    if sp.sprite_zero && bg_opaque && x != WIDTH - 1 {
                        self.status |= status::SPRITE_0_HIT;
                    }
                    if bg_opaque && sp.behind_background { bg } else { sp.entry }
                }
                None if bg_opaque => bg,
                None => 0,
            };

            let mut colour = self.palette[palette_index(u16::from(entry))];
            if self.mask & mask::GREYSCALE != 0 {
                colour &= 0x30;
            }
            *out = NES_PALETTE[usize::from(colour & 0x3F)];
        }

        self.frame.row_mut(u32::from(y)).copy_from_slice(&line);
    }

    /// Walk 33 tiles from the current scroll position and decode the
    /// visible 256 pixels into palette entries.
    fn fetch_background(&self, bus: &mut impl PpuBus, out: &mut [u8; WIDTH]) {
        let pattern_base: u16 = if self.ctrl & ctrl::BG_PATTERN != 0 { 0x1000 } else { 0 };
        let fine_y = (self.v >> 12) & 0x07;
        let fine_x = usize::from(self.fine_x);
        let mut v = self.v;

        for tile in 0..33usize {
            let tile_index = self.vram_read(0x2000 | (v & 0x0FFF), bus);
            let attr_addr = 0x23C0 | (v & 0x0C00) | ((v >> 4) & 0x38) | ((v >> 2) & 0x07);
            let attr = self.vram_read(attr_addr, bus);
            let shift = ((v >> 4) & 0x04) | (v & 0x02);
            let palette = (attr >> shift) & 0x03;

            let addr = pattern_base + u16::from(tile_index) * 16 + fine_y;
            let lo = bus.chr_read(addr);
            let hi = bus.chr_read(addr + 8);

            for col in 0..8usize {
                let x = (tile * 8 + col).wrapping_sub(fine_x);
                if x >= WIDTH {
                    continue;
                }
                let bit = 7 - col;
                let pixel = ((lo >> bit) & 1) | (((hi >> bit) & 1) << 1);
                out[x] = (palette << 2) | pixel;
            }

            // Coarse X increment with horizontal nametable wrap.
            if v & 0x001F == 31 {
                v &= !0x001F;
                v ^= 0x0400;
            } else {
                v += 1;
            }
        }
    }

    /// Select up to eight sprites on `line` in OAM order and decode them.
    /// Lower OAM index wins where sprites overlap.
    fn evaluate_sprites(
        &mut self,
        bus: &mut impl PpuBus,
        line: u16,
        out: &mut [Option<SpritePixel>; WIDTH],
    ) {
        let height: u16 = if self.ctrl & ctrl::SPRITE_SIZE != 0 { 16 } else { 8 };
        let mut found = 0;

        for index in 0..64usize {
            let base = index * 4;
            // OAM Y is one less than the first line the sprite appears on.
            let top = u16::from(self.oam[base]) + 1;
            if line < top || line >= top + height {
                continue;
            }
            found += 1;
            if found > 8 {
                self.status |= status::SPRITE_OVERFLOW;
                break;
            }

            let tile = self.oam[base + 1];
            let attr = self.oam[base + 2];
            let left = usize::from(self.oam[base + 3]);

            let mut row = line - top;
            if attr & 0x80 != 0 {
                row = height - 1 - row;
            }
            let addr = if height == 16 {
                let table = u16::from(tile & 0x01) * 0x1000;
                let mut tile = u16::from(tile & 0xFE);
                if row >= 8 {
                    tile += 1;
                    row -= 8;
                }
                table + tile * 16 + row
            } else {
                let table: u16 = if self.ctrl & ctrl::SPRITE_PATTERN != 0 { 0x1000 } else { 0 };
                table + u16::from(tile) * 16 + row
            };
            let lo = bus.chr_read(addr);
            let hi = bus.chr_read(addr + 8);

            for col in 0..8usize {
                let bit = if attr & 0x40 != 0 { col } else { 7 - col };
                let pixel = ((lo >> bit) & 1) | (((hi >> bit) & 1) << 1);
                let x = left + col;
                if pixel == 0 || x >= WIDTH || out[x].is_some() {
                    continue;
                }
                out[x] = Some(SpritePixel {
                    entry: 0x10 | ((attr & 0x03) << 2) | pixel,
                    behind_background: attr & 0x20 != 0,
                    sprite_zero: index == 0,
                });
            }
        }
    }
}
