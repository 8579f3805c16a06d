//! NES cartridges: the iNES container format and the boards behind it.
//!
//! [`parse_ines`] validates a ROM image into an immutable [`Cartridge`].
//! A [`Board`] takes ownership of the cartridge and pairs its memory with a
//! live [`Mapper`], which the console drives from both the CPU and PPU side.

mod board;
mod ines;
mod mapper;

pub use board::{Board, MapperState, PRG_RAM_SIZE};
pub use ines::{CHR_BANK_SIZE, Cartridge, FormatError, PRG_BANK_SIZE, TRAINER_SIZE, parse_ines};
pub use mapper::{Mapper, MapperKind};
pub use ricoh_ppu_2c02::Mirroring;
