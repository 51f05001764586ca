// Copyright (c) the VPEG Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Decoder for VPEG, a small JPEG-like grayscale format built from 8x8 DCT
//! blocks with a fixed seven-opcode entropy stage.
//!
//! ```
//! // One flat white block followed by end of file.
//! let data = [0xa0, 0x07, 0xf8, 0xac, 0xaf];
//! let image = vpeg::decode::decode(&data, &Default::default())?;
//! assert_eq!(image.raster.size(), (8, 8));
//! assert!(image.raster.as_bytes().iter().all(|&p| p == 255));
//! # Ok::<(), vpeg::error::Error>(())
//! ```

#![deny(unsafe_code)]
pub mod byte_reader;
pub mod decode;
pub mod error;
pub mod idct;
pub mod opcode;
pub mod quant;
pub mod raster;
pub mod rle;
pub mod util;
pub mod zigzag;

pub const BLOCK_DIM: usize = 8;
pub const BLOCK_SIZE: usize = BLOCK_DIM * BLOCK_DIM;
