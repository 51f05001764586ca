// Copyright (c) the VPEG Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::{
    BLOCK_SIZE,
    byte_reader::ByteReader,
    error::{Error, MalformedBlockKind, Result},
    opcode::Opcode,
    quant::QuantTable,
    util::tracing_wrappers::*,
};

/// The coefficients of one 8x8 block, in scan order, as read from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefficientBlock {
    pub table: QuantTable,
    /// Index 0 is DC. Slots after the last coded coefficient are zero.
    pub coefficients: [i32; BLOCK_SIZE],
}

impl CoefficientBlock {
    /// Reads one block, from its block start opcode up to and including the
    /// end of block opcode.
    pub fn read(br: &mut ByteReader) -> Result<CoefficientBlock> {
        let (offset, opcode) = Opcode::read(br)?;
        let Opcode::BlockStart { table, dc } = opcode else {
            return Err(Error::MalformedBlock {
                offset,
                kind: MalformedBlockKind::MissingBlockStart(br.byte_at(offset)),
            });
        };
        let mut coefficients = [0i32; BLOCK_SIZE];
        coefficients[0] = dc as i32;
        let mut next = 1;
        loop {
            let (offset, opcode) = Opcode::read(br)?;
            let value = match opcode {
                Opcode::EndOfBlock => break,
                Opcode::Coefficient(value) | Opcode::ZeroRun { value, .. } => value,
                _ => {
                    return Err(Error::MalformedBlock {
                        offset,
                        kind: MalformedBlockKind::UnexpectedOpcode(br.byte_at(offset)),
                    });
                }
            };
            // Zeros are already in place; only the final slot needs writing.
            let index = next + opcode.coefficient_slots() - 1;
            if index >= BLOCK_SIZE {
                return Err(Error::MalformedBlock {
                    offset,
                    kind: MalformedBlockKind::CoefficientOverflow { index },
                });
            }
            coefficients[index] = value as i32;
            next = index + 1;
        }
        trace!(?table, coded = next, "read block");
        Ok(CoefficientBlock {
            table,
            coefficients,
        })
    }
}
