//! iNES ROM format.

use std::fmt;

use ricoh_ppu_2c02::Mirroring;
use thiserror::Error;

use crate::mapper::MapperKind;

const HEADER_SIZE: usize = 16;
const MAGIC: [u8; 4] = *b"NES\x1A";

/// PRG ROM bank unit (header byte 4).
pub const PRG_BANK_SIZE: usize = 16 * 1024;
/// CHR ROM bank unit (header byte 5).
pub const CHR_BANK_SIZE: usize = 8 * 1024;
/// Trainer block between header and PRG ROM.
pub const TRAINER_SIZE: usize = 512;

/// Why a byte buffer is not a loadable cartridge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("image is {len} bytes, shorter than the 16-byte iNES header")]
    TooShort { len: usize },

    #[error("bad iNES magic {found:02X?}")]
    BadMagic { found: [u8; 4] },

    #[error("header declares no PRG ROM")]
    NoPrgRom,

    #[error("{section} truncated: expected {expected} bytes, found {actual}")]
    Truncated {
        section: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u8),
}

/// A validated cartridge image. Immutable once parsed.
#[derive(Clone, PartialEq, Eq)]
pub struct Cartridge {
    prg_rom: Vec<u8>,
    /// Empty when the board carries CHR RAM instead.
    chr_rom: Vec<u8>,
    mapper: MapperKind,
    mirroring: Mirroring,
    battery: bool,
    trainer: Option<Vec<u8>>,
}

impl Cartridge {
    /// Build a cartridge from raw sections. An empty `chr_rom` means 8K of CHR RAM.
    ///
    /// # Errors
    ///
    /// [`FormatError::NoPrgRom`] when `prg_rom` is empty.
    pub fn new(
        prg_rom: Vec<u8>,
        chr_rom: Vec<u8>,
        mapper: MapperKind,
        mirroring: Mirroring,
    ) -> Result<Self, FormatError> {
        if prg_rom.is_empty() {
            return Err(FormatError::NoPrgRom);
        }
        Ok(Self {
            prg_rom,
            chr_rom,
            mapper,
            mirroring,
            battery: false,
            trainer: None,
        })
    }

    #[must_use]
    pub fn prg_rom(&self) -> &[u8] {
        &self.prg_rom
    }

    #[must_use]
    pub fn chr_rom(&self) -> &[u8] {
        &self.chr_rom
    }

    /// The board has writable pattern memory instead of CHR ROM.
    #[must_use]
    pub fn has_chr_ram(&self) -> bool {
        self.chr_rom.is_empty()
    }

    #[must_use]
    pub fn mapper(&self) -> MapperKind {
        self.mapper
    }

    /// Mirroring wired on the board. Mappers with mirroring control override it.
    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Battery-backed PRG RAM is present.
    #[must_use]
    pub fn has_battery(&self) -> bool {
        self.battery
    }

    #[must_use]
    pub fn trainer(&self) -> Option<&[u8]> {
        self.trainer.as_deref()
    }

    pub(crate) fn into_parts(self) -> (Vec<u8>, Vec<u8>, MapperKind, Mirroring) {
        (self.prg_rom, self.chr_rom, self.mapper, self.mirroring)
    }
}

impl fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cartridge")
            .field("prg_rom", &self.prg_rom.len())
            .field("chr_rom", &self.chr_rom.len())
            .field("mapper", &self.mapper)
            .field("mirroring", &self.mirroring)
            .field("battery", &self.battery)
            .field("trainer", &self.trainer.is_some())
            .finish()
    }
}

impl fmt::Display for Cartridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} PRG {}K, ", self.mapper, self.prg_rom.len() / 1024)?;
        if self.has_chr_ram() {
            write!(f, "CHR RAM 8K")?;
        } else {
            write!(f, "CHR {}K", self.chr_rom.len() / 1024)?;
        }
        write!(f, ", {:?} mirroring", self.mirroring)
    }
}

/// Parse an iNES image.
pub fn parse_ines(bytes: &[u8]) -> Result<Cartridge, FormatError> {
    if bytes.len() < HEADER_SIZE {
        return Err(FormatError::TooShort { len: bytes.len() });
    }

    let found = [bytes[0], bytes[1], bytes[2], bytes[3]];
    if found != MAGIC {
        return Err(FormatError::BadMagic { found });
    }

    let prg_size = usize::from(bytes[4]) * PRG_BANK_SIZE;
    let chr_size = usize::from(bytes[5]) * CHR_BANK_SIZE;
    if prg_size == 0 {
        return Err(FormatError::NoPrgRom);
    }

    let flags6 = bytes[6];
    let flags7 = bytes[7];

    let mirroring = if flags6 & 0x08 != 0 {
        Mirroring::FourScreen
    } else if flags6 & 0x01 != 0 {
        Mirroring::Vertical
    } else {
        Mirroring::Horizontal
    };
    let battery = flags6 & 0x02 != 0;
    let has_trainer = flags6 & 0x04 != 0;

    // Old dumps carry junk (often "DiskDude!") from byte 7 on; only trust
    // the upper mapper nibble when the tail is clean.
    let archaic = flags7 & 0x0C == 0 && bytes[12..HEADER_SIZE].iter().any(|&b| b != 0);
    let mapper_id = if archaic {
        flags6 >> 4
    } else {
        (flags6 >> 4) | (flags7 & 0xF0)
    };

    let mut cursor = HEADER_SIZE;
    let trainer = if has_trainer {
        Some(section(bytes, &mut cursor, TRAINER_SIZE, "trainer")?.to_vec())
    } else {
        None
    };
    let prg_rom = section(bytes, &mut cursor, prg_size, "PRG ROM")?.to_vec();
    let chr_rom = section(bytes, &mut cursor, chr_size, "CHR ROM")?.to_vec();

    let mapper = MapperKind::from_id(mapper_id).ok_or(FormatError::UnsupportedMapper(mapper_id))?;

    Ok(Cartridge {
        prg_rom,
        chr_rom,
        mapper,
        mirroring,
        battery,
        trainer,
    })
}

fn section<'a>(
    bytes: &'a [u8],
    cursor: &mut usize,
    len: usize,
    name: &'static str,
) -> Result<&'a [u8], FormatError> {
    let start = *cursor;
    let available = bytes.len().saturating_sub(start);
    if available < len {
        return Err(FormatError::Truncated {
            section: name,
            expected: len,
            actual: available,
        });
    }
    *cursor = start + len;
    Ok(&bytes[start..start + len])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(prg_banks: u8, chr_banks: u8, flags6: u8, flags7: u8) -> Vec<u8> {
        let mut rom = vec![b'N', b'E', b'S', 0x1A, prg_banks, chr_banks, flags6, flags7];
        rom.resize(HEADER_SIZE, 0);
        rom
    }

    fn image(prg_banks: u8, chr_banks: u8, flags6: u8, flags7: u8) -> Vec<u8> {
        let mut rom = header(prg_banks, chr_banks, flags6, flags7);
        if flags6 & 0x04 != 0 {
            rom.extend(std::iter::repeat_n(0xEE, TRAINER_SIZE));
        }
        rom.extend(std::iter::repeat_n(0xAA, usize::from(prg_banks) * PRG_BANK_SIZE));
        rom.extend(std::iter::repeat_n(0x55, usize::from(chr_banks) * CHR_BANK_SIZE));
        rom
    }

    #[test]
    fn too_short() {
        assert_eq!(parse_ines(b"NES\x1A"), Err(FormatError::TooShort { len: 4 }));
    }

    #[test]
    fn bad_magic() {
        let mut rom = image(1, 1, 0, 0);
        rom[0] = b'X';
        assert_eq!(
            parse_ines(&rom),
            Err(FormatError::BadMagic {
                found: [b'X', b'E', b'S', 0x1A]
            })
        );
    }

    #[test]
    fn no_prg_rom() {
        assert_eq!(parse_ines(&header(0, 1, 0, 0)), Err(FormatError::NoPrgRom));
    }

    #[test]
    fn truncated_chr() {
        let mut rom = image(1, 1, 0, 0);
        rom.truncate(rom.len() - 100);
        assert_eq!(
            parse_ines(&rom),
            Err(FormatError::Truncated {
                section: "CHR ROM",
                expected: CHR_BANK_SIZE,
                actual: CHR_BANK_SIZE - 100,
            })
        );
    }

    #[test]
    fn truncated_trainer() {
        let mut rom = header(1, 0, 0x04, 0);
        rom.extend([0; 10]);
        assert!(matches!(
            parse_ines(&rom),
            Err(FormatError::Truncated { section: "trainer", expected: 512, actual: 10 })
        ));
    }

    #[test]
    fn unsupported_mapper() {
        // Mapper 0x45: low nibble in flags 6, high nibble in flags 7.
        let rom = image(1, 1, 0x50, 0x40);
        assert_eq!(parse_ines(&rom), Err(FormatError::UnsupportedMapper(0x45)));
    }

    #[test]
    fn trainer_is_skipped() {
        let cart = parse_ines(&image(1, 1, 0x04, 0)).unwrap();
        assert_eq!(cart.trainer().map(<[u8]>::len), Some(TRAINER_SIZE));
        assert!(cart.prg_rom().iter().all(|&b| b == 0xAA));
        assert!(cart.chr_rom().iter().all(|&b| b == 0x55));
    }

    #[test]
    fn zero_chr_banks_means_chr_ram() {
        let cart = parse_ines(&image(2, 0, 0x20, 0)).unwrap();
        assert!(cart.has_chr_ram());
        assert_eq!(cart.mapper(), MapperKind::Uxrom);
        assert_eq!(cart.prg_rom().len(), 2 * PRG_BANK_SIZE);
    }

    #[test]
    fn mirroring_flags() {
        assert_eq!(parse_ines(&image(1, 1, 0x00, 0)).unwrap().mirroring(), Mirroring::Horizontal);
        assert_eq!(parse_ines(&image(1, 1, 0x01, 0)).unwrap().mirroring(), Mirroring::Vertical);
        assert_eq!(parse_ines(&image(1, 1, 0x09, 0)).unwrap().mirroring(), Mirroring::FourScreen);
    }

    #[test]
    fn battery_flag() {
        assert!(parse_ines(&image(1, 1, 0x02, 0)).unwrap().has_battery());
    }

    #[test]
    fn archaic_header_ignores_upper_nibble() {
        let mut rom = image(1, 1, 0x40, 0x40);
        rom[7..16].copy_from_slice(b"DiskDude!");
        rom[7] = 0x40;
        let cart = parse_ines(&rom).unwrap();
        assert_eq!(cart.mapper(), MapperKind::Mmc3);
    }

    #[test]
    fn display_summary() {
        let cart = parse_ines(&image(2, 1, 0x01, 0)).unwrap();
        assert_eq!(cart.to_string(), "NROM (mapper 0) PRG 32K, CHR 8K, Vertical mirroring");
    }
}
