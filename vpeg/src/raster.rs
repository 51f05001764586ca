// Copyright (c) the VPEG Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt::Debug;

use crate::{
    BLOCK_DIM,
    error::{Error, Result},
    idct::Block,
};

pub type SampleBlock = [[u8; BLOCK_DIM]; BLOCK_DIM];

/// Converts a reconstructed sample to a pixel value, clamping to [0, 255] and
/// dropping the fractional part.
pub fn to_sample(value: f64) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

pub fn to_samples(block: &Block) -> SampleBlock {
    array_init::array_init(|row| array_init::array_init(|col| to_sample(block[row][col])))
}

/// An 8-bit grayscale image whose dimensions are multiples of the block size.
/// Pixels are stored row-major and start out as 0.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Raster{{ {}x{} }}", self.width, self.height)
    }
}

impl Raster {
    pub fn new(size: (usize, usize)) -> Result<Raster> {
        let (width, height) = size;
        if width % BLOCK_DIM != 0 || height % BLOCK_DIM != 0 {
            return Err(Error::InvalidRasterSize(width, height));
        }
        let len = width
            .checked_mul(height)
            .ok_or(Error::ImageSizeTooLarge(width, height))?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)?;
        data.resize(len, 0);
        Ok(Raster {
            width,
            height,
            data,
        })
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn size_in_blocks(&self) -> (usize, usize) {
        (self.width / BLOCK_DIM, self.height / BLOCK_DIM)
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the 8x8 block of pixels at block position `(block_row, block_col)`.
    pub fn block(&self, block_row: usize, block_col: usize) -> Result<SampleBlock> {
        self.check_block(block_row, block_col)?;
        Ok(array_init::array_init(|y| {
            let row = self.row(block_row * BLOCK_DIM + y);
            array_init::array_init(|x| row[block_col * BLOCK_DIM + x])
        }))
    }

    /// Writes an 8x8 block of pixels at block position `(block_row, block_col)`.
    pub fn put_block(
        &mut self,
        block_row: usize,
        block_col: usize,
        samples: &SampleBlock,
    ) -> Result<()> {
        self.check_block(block_row, block_col)?;
        for (y, samples) in samples.iter().enumerate() {
            let start = (block_row * BLOCK_DIM + y) * self.width + block_col * BLOCK_DIM;
            self.data[start..start + BLOCK_DIM].copy_from_slice(samples);
        }
        Ok(())
    }

    fn check_block(&self, block_row: usize, block_col: usize) -> Result<()> {
        let (cols, rows) = self.size_in_blocks();
        if block_row >= rows || block_col >= cols {
            return Err(Error::RasterOverflow {
                block_row,
                block_col,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}
