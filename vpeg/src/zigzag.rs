// Copyright (c) the VPEG Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::{BLOCK_DIM, BLOCK_SIZE};

/// Scan index of every natural (row-major) position of an 8x8 block.
///
/// The scan walks each anti-diagonal from its bottom-left end upwards, always
/// in the same direction.
#[rustfmt::skip]
pub const NATURAL_TO_SCAN: [usize; BLOCK_SIZE] = [
     0,  2,  5,  9, 14, 20, 27, 35,
     1,  4,  8, 13, 19, 26, 34, 42,
     3,  7, 12, 18, 25, 33, 41, 48,
     6, 11, 17, 24, 32, 40, 47, 53,
    10, 16, 23, 31, 39, 46, 52, 57,
    15, 22, 30, 38, 45, 51, 56, 60,
    21, 29, 37, 44, 50, 55, 59, 62,
    28, 36, 43, 49, 54, 58, 61, 63,
];

/// Natural position of every scan index. Inverse of [`NATURAL_TO_SCAN`].
pub const SCAN_TO_NATURAL: [usize; BLOCK_SIZE] = {
    let mut table = [0usize; BLOCK_SIZE];
    let mut i = 0;
    while i < BLOCK_SIZE {
        table[NATURAL_TO_SCAN[i]] = i;
        i += 1;
    }
    table
};

/// Moves coefficients from scan order into an 8x8 block in natural order.
pub fn unzigzag<T: Copy + Default>(scan: &[T; BLOCK_SIZE]) -> [[T; BLOCK_DIM]; BLOCK_DIM] {
    let mut out = [[T::default(); BLOCK_DIM]; BLOCK_DIM];
    for (i, &coeff) in scan.iter().enumerate() {
        let pos = SCAN_TO_NATURAL[i];
        out[pos / BLOCK_DIM][pos % BLOCK_DIM] = coeff;
    }
    out
}

/// Reads an 8x8 block in scan order. Inverse of [`unzigzag`].
pub fn zigzag<T: Copy + Default>(block: &[[T; BLOCK_DIM]; BLOCK_DIM]) -> [T; BLOCK_SIZE] {
    let mut out = [T::default(); BLOCK_SIZE];
    for (pos, &coeff) in block.iter().flatten().enumerate() {
        out[NATURAL_TO_SCAN[pos]] = coeff;
    }
    out
}
