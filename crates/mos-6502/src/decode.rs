//! Opcode decode table.
//!
//! Covers the 151 documented opcodes plus the unofficial NOPs and the $EB
//! SBC alias, which commercial NES games are known to execute. The other
//! unofficial opcodes are reported rather than emulated.

/// 6502 addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// JMP ($nnnn) only.
    Indirect,
    /// ($nn,X)
    IndexedIndirect,
    /// ($nn),Y
    IndirectIndexed,
    Relative,
}

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
}

impl Op {
    /// Reads that pay one extra cycle when indexing crosses a page.
    pub(crate) fn page_penalty(self) -> bool {
        matches!(
            self,
            Self::Adc
                | Self::And
                | Self::Cmp
                | Self::Eor
                | Self::Lda
                | Self::Ldx
                | Self::Ldy
                | Self::Nop
                | Self::Ora
                | Self::Sbc
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Instruction {
    pub op: Op,
    pub mode: Mode,
    /// Base cycle count.
    pub cycles: u32,
}

/// Opcodes that halt the NMOS 6502 until reset (KIL/JAM).
pub(crate) fn is_jam(opcode: u8) -> bool {
    matches!(
        opcode,
        0x02 | 0x12 | 0x22 | 0x32 | 0x42 | 0x52 | 0x62 | 0x72 | 0x92 | 0xB2 | 0xD2 | 0xF2
    )
}

#[rustfmt::skip]
#[allow(clippy::enum_glob_use)]
pub(crate) fn decode(opcode: u8) -> Option<Instruction> {
    use Mode::{
        Absolute as Abs, AbsoluteX as AbsX, AbsoluteY as AbsY, Accumulator as Acc,
        Immediate as Imm, Implied as Imp, IndexedIndirect as IzX, Indirect as Ind,
        IndirectIndexed as IzY, Relative as Rel, ZeroPage as Zp, ZeroPageX as ZpX,
        ZeroPageY as ZpY,
    };
    use Op::*;

    let (op, mode, cycles) = match opcode {
        0x69 => (Adc, Imm, 2), 0x65 => (Adc, Zp, 3), 0x75 => (Adc, ZpX, 4), 0x6D => (Adc, Abs, 4),
        0x7D => (Adc, AbsX, 4), 0x79 => (Adc, AbsY, 4), 0x61 => (Adc, IzX, 6), 0x71 => (Adc, IzY, 5),

        0x29 => (And, Imm, 2), 0x25 => (And, Zp, 3), 0x35 => (And, ZpX, 4), 0x2D => (And, Abs, 4),
        0x3D => (And, AbsX, 4), 0x39 => (And, AbsY, 4), 0x21 => (And, IzX, 6), 0x31 => (And, IzY, 5),

        0x0A => (Asl, Acc, 2), 0x06 => (Asl, Zp, 5), 0x16 => (Asl, ZpX, 6), 0x0E => (Asl, Abs, 6),
        0x1E => (Asl, AbsX, 7),

        0x90 => (Bcc, Rel, 2), 0xB0 => (Bcs, Rel, 2), 0xF0 => (Beq, Rel, 2), 0x30 => (Bmi, Rel, 2),
        0xD0 => (Bne, Rel, 2), 0x10 => (Bpl, Rel, 2), 0x50 => (Bvc, Rel, 2), 0x70 => (Bvs, Rel, 2),

        0x24 => (Bit, Zp, 3), 0x2C => (Bit, Abs, 4),
        0x00 => (Brk, Imp, 7),

        0x18 => (Clc, Imp, 2), 0xD8 => (Cld, Imp, 2), 0x58 => (Cli, Imp, 2), 0xB8 => (Clv, Imp, 2),

        0xC9 => (Cmp, Imm, 2), 0xC5 => (Cmp, Zp, 3), 0xD5 => (Cmp, ZpX, 4), 0xCD => (Cmp, Abs, 4),
        0xDD => (Cmp, AbsX, 4), 0xD9 => (Cmp, AbsY, 4), 0xC1 => (Cmp, IzX, 6), 0xD1 => (Cmp, IzY, 5),
        0xE0 => (Cpx, Imm, 2), 0xE4 => (Cpx, Zp, 3), 0xEC => (Cpx, Abs, 4),
        0xC0 => (Cpy, Imm, 2), 0xC4 => (Cpy, Zp, 3), 0xCC => (Cpy, Abs, 4),

        0xC6 => (Dec, Zp, 5), 0xD6 => (Dec, ZpX, 6), 0xCE => (Dec, Abs, 6), 0xDE => (Dec, AbsX, 7),
        0xCA => (Dex, Imp, 2), 0x88 => (Dey, Imp, 2),

        0x49 => (Eor, Imm, 2), 0x45 => (Eor, Zp, 3), 0x55 => (Eor, ZpX, 4), 0x4D => (Eor, Abs, 4),
        0x5D => (Eor, AbsX, 4), 0x59 => (Eor, AbsY, 4), 0x41 => (Eor, IzX, 6), 0x51 => (Eor, IzY, 5),

        0xE6 => (Inc, Zp, 5), 0xF6 => (Inc, ZpX, 6), 0xEE => (Inc, Abs, 6), 0xFE => (Inc, AbsX, 7),
        0xE8 => (Inx, Imp, 2), 0xC8 => (Iny, Imp, 2),

        0x4C => (Jmp, Abs, 3), 0x6C => (Jmp, Ind, 5),
        0x20 => (Jsr, Abs, 6),

        0xA9 => (Lda, Imm, 2), 0xA5 => (Lda, Zp, 3), 0xB5 => (Lda, ZpX, 4), 0xAD => (Lda, Abs, 4),
        0xBD => (Lda, AbsX, 4), 0xB9 => (Lda, AbsY, 4), 0xA1 => (Lda, IzX, 6), 0xB1 => (Lda, IzY, 5),
        0xA2 => (Ldx, Imm, 2), 0xA6 => (Ldx, Zp, 3), 0xB6 => (Ldx, ZpY, 4), 0xAE => (Ldx, Abs, 4),
        0xBE => (Ldx, AbsY, 4),
        0xA0 => (Ldy, Imm, 2), 0xA4 => (Ldy, Zp, 3), 0xB4 => (Ldy, ZpX, 4), 0xAC => (Ldy, Abs, 4),
        0xBC => (Ldy, AbsX, 4),

        0x4A => (Lsr, Acc, 2), 0x46 => (Lsr, Zp, 5), 0x56 => (Lsr, ZpX, 6), 0x4E => (Lsr, Abs, 6),
        0x5E => (Lsr, AbsX, 7),

        0xEA => (Nop, Imp, 2),

        0x09 => (Ora, Imm, 2), 0x05 => (Ora, Zp, 3), 0x15 => (Ora, ZpX, 4), 0x0D => (Ora, Abs, 4),
        0x1D => (Ora, AbsX, 4), 0x19 => (Ora, AbsY, 4), 0x01 => (Ora, IzX, 6), 0x11 => (Ora, IzY, 5),

        0x48 => (Pha, Imp, 3), 0x08 => (Php, Imp, 3), 0x68 => (Pla, Imp, 4), 0x28 => (Plp, Imp, 4),

        0x2A => (Rol, Acc, 2), 0x26 => (Rol, Zp, 5), 0x36 => (Rol, ZpX, 6), 0x2E => (Rol, Abs, 6),
        0x3E => (Rol, AbsX, 7),
        0x6A => (Ror, Acc, 2), 0x66 => (Ror, Zp, 5), 0x76 => (Ror, ZpX, 6), 0x6E => (Ror, Abs, 6),
        0x7E => (Ror, AbsX, 7),

        0x40 => (Rti, Imp, 6), 0x60 => (Rts, Imp, 6),

        0xE9 => (Sbc, Imm, 2), 0xE5 => (Sbc, Zp, 3), 0xF5 => (Sbc, ZpX, 4), 0xED => (Sbc, Abs, 4),
        0xFD => (Sbc, AbsX, 4), 0xF9 => (Sbc, AbsY, 4), 0xE1 => (Sbc, IzX, 6), 0xF1 => (Sbc, IzY, 5),

        0x38 => (Sec, Imp, 2), 0xF8 => (Sed, Imp, 2), 0x78 => (Sei, Imp, 2),

        0x85 => (Sta, Zp, 3), 0x95 => (Sta, ZpX, 4), 0x8D => (Sta, Abs, 4), 0x9D => (Sta, AbsX, 5),
        0x99 => (Sta, AbsY, 5), 0x81 => (Sta, IzX, 6), 0x91 => (Sta, IzY, 6),
        0x86 => (Stx, Zp, 3), 0x96 => (Stx, ZpY, 4), 0x8E => (Stx, Abs, 4),
        0x84 => (Sty, Zp, 3), 0x94 => (Sty, ZpX, 4), 0x8C => (Sty, Abs, 4),

        0xAA => (Tax, Imp, 2), 0xA8 => (Tay, Imp, 2), 0xBA => (Tsx, Imp, 2), 0x8A => (Txa, Imp, 2),
        0x9A => (Txs, Imp, 2), 0x98 => (Tya, Imp, 2),

        // Unofficial
        0x1A | 0x3A | 0x5A | 0x7A | 0xDA | 0xFA => (Nop, Imp, 2),
        0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 => (Nop, Imm, 2),
        0x04 | 0x44 | 0x64 => (Nop, Zp, 3),
        0x14 | 0x34 | 0x54 | 0x74 | 0xD4 | 0xF4 => (Nop, ZpX, 4),
        0x0C => (Nop, Abs, 4),
        0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => (Nop, AbsX, 4),
        0xEB => (Sbc, Imm, 2),

        _ => return None,
    };

    Some(Instruction { op, mode, cycles })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_opcode_count() {
        let unofficial = [
            0x1A, 0x3A, 0x5A, 0x7A, 0xDA, 0xFA, 0x80, 0x82, 0x89, 0xC2, 0xE2, 0x04, 0x44, 0x64,
            0x14, 0x34, 0x54, 0x74, 0xD4, 0xF4, 0x0C, 0x1C, 0x3C, 0x5C, 0x7C, 0xDC, 0xFC, 0xEB,
        ];
        let decoded = (0..=255u8)
            .filter(|op| decode(*op).is_some() && !unofficial.contains(op))
            .count();
        assert_eq!(decoded, 151);
    }

    #[test]
    fn jams_never_decode() {
        for opcode in (0..=255u8).filter(|&op| is_jam(op)) {
            assert_eq!(decode(opcode), None, "{opcode:02X}");
        }
    }
}
