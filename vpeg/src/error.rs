// Copyright (c) the VPEG Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::collections::TryReserveError;

use thiserror::Error;

/// Reasons for rejecting the opcodes of a single block.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedBlockKind {
    #[error("expected block start, found {0:#04x}")]
    MissingBlockStart(u8),
    #[error("coefficient index {index} exceeds 63")]
    CoefficientOverflow { index: usize },
    #[error("unexpected opcode {0:#04x} inside block")]
    UnexpectedOpcode(u8),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Truncated stream: {needed} bytes needed at offset {offset}, {available} available")]
    TruncatedStream {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("Malformed block at offset {offset}: {kind}")]
    MalformedBlock {
        offset: usize,
        kind: MalformedBlockKind,
    },
    #[error(
        "Unexpected opcode {found:#04x} at offset {offset}, expected block start, next row or end of file"
    )]
    ProtocolError { offset: usize, found: u8 },
    #[error("Block ({block_row}, {block_col}) is outside of the {width}x{height} raster")]
    RasterOverflow {
        block_row: usize,
        block_col: usize,
        width: usize,
        height: usize,
    },
    #[error("Invalid raster size: {0}x{1}")]
    InvalidRasterSize(usize, usize),
    #[error("Image size too large: {0}x{1}")]
    ImageSizeTooLarge(usize, usize),
    #[error("Out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),
}

pub type Result<T> = std::result::Result<T, Error>;
