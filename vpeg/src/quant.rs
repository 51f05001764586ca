// Copyright (c) the VPEG Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::BLOCK_DIM;

/// Uniform scale applied to every dequantized coefficient, matching the
/// scaling of the forward transform used by the encoder.
pub const NORMALIZATION: f64 = 8.0;

/// Scale factors per table selector, indexed by [`Zone`].
pub const QUANT_SCALES: [[i32; 3]; 4] = [
    [1, 1, 1], //
    [1, 2, 4],
    [2, 4, 16],
    [4, 8, 64],
];

/// Frequency zone of a coefficient, splitting the 8x8 block at row/col 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Near = 0,
    Mid = 1,
    Far = 2,
}

impl Zone {
    /// Zone of the coefficient at `(row, col)`, or `None` for DC.
    pub fn of(row: usize, col: usize) -> Option<Zone> {
        const HALF: usize = BLOCK_DIM / 2;
        match (row, col) {
            (0, 0) => None,
            (r, c) if r < HALF && c < HALF => Some(Zone::Near),
            (r, c) if r >= HALF && c >= HALF => Some(Zone::Far),
            _ => Some(Zone::Mid),
        }
    }
}

/// One of the four quantization tables a block can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantTable {
    Zero = 0,
    One = 1,
    Two = 2,
    Three = 3,
}

impl QuantTable {
    /// Table for the low two bits of `selector`.
    pub fn from_selector(selector: u8) -> QuantTable {
        match selector & 0x03 {
            0 => QuantTable::Zero,
            1 => QuantTable::One,
            2 => QuantTable::Two,
            _ => QuantTable::Three,
        }
    }

    pub fn selector(self) -> u8 {
        self as u8
    }

    pub fn scale(self, zone: Zone) -> i32 {
        QUANT_SCALES[self as usize][zone as usize]
    }

    /// Multiplier applied to the coefficient at `(row, col)`, normalization included.
    pub fn multiplier(self, row: usize, col: usize) -> f64 {
        let scale = Zone::of(row, col).map_or(1, |zone| self.scale(zone));
        scale as f64 * NORMALIZATION
    }
}

/// Scales a block of quantized coefficients in natural order back to DCT
/// coefficients.
pub fn dequantize(
    coefficients: &[[i32; BLOCK_DIM]; BLOCK_DIM],
    table: QuantTable,
) -> [[f64; BLOCK_DIM]; BLOCK_DIM] {
    array_init::array_init(|row| {
        array_init::array_init(|col| coefficients[row][col] as f64 * table.multiplier(row, col))
    })
}
