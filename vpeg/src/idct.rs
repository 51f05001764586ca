// Copyright (c) the VPEG Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::f64::consts::PI;
use std::sync::LazyLock;

use crate::BLOCK_DIM;

pub type Block = [[f64; BLOCK_DIM]; BLOCK_DIM];

/// `IDCT_KERNEL[k][n] = cos(pi / 8 * n * (k + 0.5))`.
static IDCT_KERNEL: LazyLock<Block> = LazyLock::new(|| {
    array_init::array_init(|k| {
        array_init::array_init(|n| (PI / BLOCK_DIM as f64 * n as f64 * (k as f64 + 0.5)).cos())
    })
});

/// In-place 8-point inverse DCT:
/// `x[k] = 0.25 * (0.5 * X[0] + sum_{n=1..7} X[n] * cos(pi / 8 * n * (k + 0.5)))`.
///
/// This is the exact inverse of the unnormalized DCT-II
/// `X[n] = sum_k x[k] * cos(pi / 8 * n * (k + 0.5))`.
pub fn idct1d(x: &mut [f64; BLOCK_DIM]) {
    let kernel = &*IDCT_KERNEL;
    let mut out = [0.0; BLOCK_DIM];
    for (k, out) in out.iter_mut().enumerate() {
        let mut sum = 0.5 * x[0];
        for n in 1..BLOCK_DIM {
            sum += x[n] * kernel[k][n];
        }
        *out = 0.25 * sum;
    }
    *x = out;
}

pub fn transpose(m: &mut Block) {
    for i in 0..BLOCK_DIM {
        for j in (i + 1)..BLOCK_DIM {
            let tmp = m[i][j];
            m[i][j] = m[j][i];
            m[j][i] = tmp;
        }
    }
}

/// In-place separable 8x8 inverse DCT.
///
/// On input, `m[u][v]` holds the coefficient for horizontal frequency `u` and
/// vertical frequency `v`. On output, `m[y][x]` holds the sample at row `y`,
/// column `x`. The second pass runs on the transposed block, so no transpose
/// back is needed.
pub fn idct2d(m: &mut Block) {
    for row in m.iter_mut() {
        idct1d(row);
    }
    transpose(m);
    for row in m.iter_mut() {
        idct1d(row);
    }
}
