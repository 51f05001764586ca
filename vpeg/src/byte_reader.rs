// Copyright (c) the VPEG Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt::Debug;
use std::ops::Range;

use crate::{error::Error, util::tracing_wrappers::*};
use byteorder::{BigEndian, ByteOrder};

/// Marker byte introducing a skip segment: `0xff L` followed by `L` opaque bytes.
pub const SKIP_MARKER: u8 = 0xff;

/// Reads bytes from a VPEG stream, keeping track of the current offset.
#[derive(Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    skipped: Vec<Range<usize>>,
}

impl Debug for ByteReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ByteReader{{ data: [{} bytes], pos: {}, skipped: {} }}",
            self.data.len(),
            self.pos,
            self.skipped.len()
        )
    }
}

impl<'a> ByteReader<'a> {
    /// Constructs a ByteReader positioned at the first byte of `data`.
    pub fn new(data: &'a [u8]) -> ByteReader<'a> {
        ByteReader {
            data,
            pos: 0,
            skipped: Vec::new(),
        }
    }

    /// Returns the offset of the next byte to be read.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of bytes that can still be read or skipped.
    pub fn bytes_available(&self) -> usize {
        self.data.len() - self.pos
    }

    fn check_available(&self, num: usize) -> Result<(), Error> {
        if num > self.bytes_available() {
            return Err(Error::TruncatedStream {
                offset: self.pos,
                needed: num,
                available: self.bytes_available(),
            });
        }
        Ok(())
    }

    /// Returns the byte at the current position without consuming it.
    /// ```
    /// # use vpeg::byte_reader::ByteReader;
    /// let mut br = ByteReader::new(&[0xac]);
    /// assert_eq!(br.peek()?, 0xac);
    /// assert_eq!(br.position(), 0);
    /// br.advance(1)?;
    /// assert!(br.peek().is_err());
    /// # Ok::<(), vpeg::error::Error>(())
    /// ```
    pub fn peek(&self) -> Result<u8, Error> {
        self.check_available(1)?;
        Ok(self.data[self.pos])
    }

    /// Consumes `num` bytes.
    pub fn advance(&mut self, num: usize) -> Result<(), Error> {
        self.check_available(num)?;
        self.pos += num;
        Ok(())
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        let ret = self.peek()?;
        self.pos += 1;
        Ok(ret)
    }

    /// Reads a big-endian two's complement 16-bit integer.
    /// ```
    /// # use vpeg::byte_reader::ByteReader;
    /// let mut br = ByteReader::new(&[0x07, 0xf8, 0xff, 0xfe]);
    /// assert_eq!(br.read_i16_be()?, 2040);
    /// assert_eq!(br.read_i16_be()?, -2);
    /// assert!(br.read_i16_be().is_err());
    /// # Ok::<(), vpeg::error::Error>(())
    /// ```
    pub fn read_i16_be(&mut self) -> Result<i16, Error> {
        self.check_available(2)?;
        let ret = BigEndian::read_i16(&self.data[self.pos..]);
        self.pos += 2;
        Ok(ret)
    }

    /// Returns a byte that has already been read.
    pub(crate) fn byte_at(&self, offset: usize) -> u8 {
        debug_assert!(offset < self.pos);
        self.data[offset]
    }

    /// Consumes any number of consecutive skip segments, leaving the reader at
    /// the first byte that is not a skip marker (or at the end of the data).
    /// ```
    /// # use vpeg::byte_reader::ByteReader;
    /// let mut br = ByteReader::new(&[0xff, 0x02, 0xaa, 0xbb, 0xff, 0x00, 0xac]);
    /// br.skip_segments()?;
    /// assert_eq!(br.position(), 6);
    /// assert_eq!(br.peek()?, 0xac);
    /// # Ok::<(), vpeg::error::Error>(())
    /// ```
    pub fn skip_segments(&mut self) -> Result<(), Error> {
        while self.pos < self.data.len() && self.data[self.pos] == SKIP_MARKER {
            let start = self.pos;
            self.check_available(2)?;
            let len = self.data[self.pos + 1] as usize;
            self.advance(2)?;
            self.advance(len).map_err(|_| Error::TruncatedStream {
                offset: start,
                needed: len + 2,
                available: self.data.len() - start,
            })?;
            debug!(offset = start, len, "skipped segment");
            self.skipped.push(start + 2..start + 2 + len);
        }
        Ok(())
    }

    /// Returns the payloads of all skip segments consumed so far, in stream order.
    pub fn skipped_segments(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        let data = self.data;
        self.skipped.iter().map(move |r| &data[r.clone()])
    }
}
