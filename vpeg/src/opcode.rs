// Copyright (c) the VPEG Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! The VPEG instruction set.
//!
//! | Byte pattern                  | Length | Meaning                                   |
//! |-------------------------------|--------|-------------------------------------------|
//! | `101000vv xxxxxxxx xxxxxxxx`  | 3      | block start, table `vv`, big-endian DC    |
//! | `0sxxxxxx`                    | 1      | AC coefficient, sign `s`, magnitude `x`   |
//! | `100zzzzs xxxxxxxx`           | 2      | `zzzz` zeros, then AC coefficient `s`,`x` |
//! | `10101100`                    | 1      | end of block                              |
//! | `10101110`                    | 1      | next block row                            |
//! | `10101111`                    | 1      | end of file                               |
//! | `11111111 LLLLLLLL`           | 2 + L  | skip segment, consumed by the reader      |

use crate::{byte_reader::ByteReader, error::Result, quant::QuantTable};

pub const END_OF_BLOCK: u8 = 0b1010_1100;
pub const NEXT_ROW: u8 = 0b1010_1110;
pub const END_OF_FILE: u8 = 0b1010_1111;

/// Whether `byte` is the first byte of a block start instruction (`101000vv`).
pub const fn is_block_start(byte: u8) -> bool {
    byte & 0b1111_1100 == 0b1010_0000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    BlockStart { table: QuantTable, dc: i16 },
    Coefficient(i16),
    ZeroRun { zeros: usize, value: i16 },
    EndOfBlock,
    NextRow,
    EndOfFile,
    /// A byte that does not start any instruction.
    Reserved(u8),
}

fn signed(magnitude: u8, negative: bool) -> i16 {
    if negative {
        -(magnitude as i16)
    } else {
        magnitude as i16
    }
}

impl Opcode {
    /// Reads the next instruction, consuming any skip segments in front of it.
    ///
    /// Returns the offset of the instruction's first byte together with the
    /// instruction. Reserved bytes are consumed and reported as
    /// [`Opcode::Reserved`]; it is up to the caller to decide whether they are
    /// an error in the current scope.
    pub fn read(br: &mut ByteReader) -> Result<(usize, Opcode)> {
        br.skip_segments()?;
        let offset = br.position();
        let byte = br.read_u8()?;
        let opcode = match byte {
            0x00..=0x7f => Opcode::Coefficient(signed(byte & 0x3f, byte & 0x40 != 0)),
            0x80..=0x9f => {
                let magnitude = br.read_u8()?;
                Opcode::ZeroRun {
                    zeros: ((byte >> 1) & 0x0f) as usize,
                    value: signed(magnitude, byte & 0x01 != 0),
                }
            }
            _ if is_block_start(byte) => {
                let table = QuantTable::from_selector(byte & 0x03);
                let dc = br.read_i16_be()?;
                Opcode::BlockStart { table, dc }
            }
            END_OF_BLOCK => Opcode::EndOfBlock,
            NEXT_ROW => Opcode::NextRow,
            END_OF_FILE => Opcode::EndOfFile,
            _ => Opcode::Reserved(byte),
        };
        Ok((offset, opcode))
    }

    /// Number of coefficient slots this instruction fills inside a block.
    pub fn coefficient_slots(&self) -> usize {
        match self {
            Opcode::Coefficient(_) => 1,
            Opcode::ZeroRun { zeros, .. } => zeros + 1,
            _ => 0,
        }
    }
}
