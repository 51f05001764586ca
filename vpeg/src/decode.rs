// Copyright (c) the VPEG Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::{
    BLOCK_DIM,
    byte_reader::ByteReader,
    error::{Error, Result},
    idct::idct2d,
    opcode::{END_OF_FILE, NEXT_ROW, is_block_start},
    quant::dequantize,
    raster::{Raster, SampleBlock, to_samples},
    rle::CoefficientBlock,
    util::tracing_wrappers::*,
    zigzag::unzigzag,
};

/// Default maximum number of pixels of a decoded raster.
pub const DEFAULT_PIXEL_LIMIT: usize = 1 << 26;

#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Size of the output raster in pixels. Blocks outside of it are an error.
    /// If `None`, the raster is sized to fit the blocks present in the stream.
    pub raster_size: Option<(usize, usize)>,
    /// Maximum number of pixels of the output raster. `None` disables the limit.
    pub pixel_limit: Option<usize>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            raster_size: None,
            pixel_limit: Some(DEFAULT_PIXEL_LIMIT),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Expecting a block start, a row marker or the end of file.
    Start,
    DecodingBlock,
    /// A row marker was just consumed. Accepts the same opcodes as `Start`.
    RowBoundary,
    Eof,
}

/// A block together with its position in the block grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedBlock {
    pub block_row: usize,
    pub block_col: usize,
    pub block: CoefficientBlock,
}

/// Walks a VPEG stream block by block, tracking the position of every block.
pub struct BlockParser<'a> {
    br: ByteReader<'a>,
    state: DecoderState,
    block_row: usize,
    block_col: usize,
}

impl<'a> BlockParser<'a> {
    pub fn new(data: &'a [u8]) -> BlockParser<'a> {
        BlockParser {
            br: ByteReader::new(data),
            state: DecoderState::Start,
            block_row: 0,
            block_col: 0,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Returns the next block, or `None` once the end of file marker has been
    /// consumed.
    pub fn next_block(&mut self) -> Result<Option<PositionedBlock>> {
        loop {
            if self.state == DecoderState::Eof {
                return Ok(None);
            }
            self.br.skip_segments()?;
            let offset = self.br.position();
            let byte = self.br.peek()?;
            match byte {
                _ if is_block_start(byte) => {
                    self.state = DecoderState::DecodingBlock;
                    let block = CoefficientBlock::read(&mut self.br)?;
                    let positioned = PositionedBlock {
                        block_row: self.block_row,
                        block_col: self.block_col,
                        block,
                    };
                    trace!(offset, row = self.block_row, col = self.block_col, "decoded block");
                    self.block_col += 1;
                    self.state = DecoderState::Start;
                    return Ok(Some(positioned));
                }
                NEXT_ROW => {
                    self.br.advance(1)?;
                    self.block_row += 1;
                    self.block_col = 0;
                    debug!(offset, row = self.block_row, "next block row");
                    self.state = DecoderState::RowBoundary;
                }
                END_OF_FILE => {
                    self.br.advance(1)?;
                    debug!(offset, "end of file");
                    self.state = DecoderState::Eof;
                }
                found => return Err(Error::ProtocolError { offset, found }),
            }
        }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.br.position()
    }

    /// Payloads of the skip segments consumed so far, in stream order.
    pub fn skipped_segments(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.br.skipped_segments()
    }
}

impl Iterator for BlockParser<'_> {
    type Item = Result<PositionedBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        let ret = self.next_block().transpose();
        if let Some(Err(_)) = ret {
            self.state = DecoderState::Eof;
        }
        ret
    }
}

/// Turns the coefficients of one block into pixels: inverse zig-zag,
/// dequantization, inverse DCT, clamping.
pub fn reconstruct_block(block: &CoefficientBlock) -> SampleBlock {
    let natural = unzigzag(&block.coefficients);
    let mut samples = dequantize(&natural, block.table);
    idct2d(&mut samples);
    to_samples(&samples)
}

#[cfg(feature = "parallel")]
fn reconstruct_blocks(blocks: &[PositionedBlock]) -> Vec<SampleBlock> {
    use rayon::prelude::*;
    blocks
        .par_iter()
        .map(|b| reconstruct_block(&b.block))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn reconstruct_blocks(blocks: &[PositionedBlock]) -> Vec<SampleBlock> {
    blocks.iter().map(|b| reconstruct_block(&b.block)).collect()
}

fn check_pixel_limit(size: (usize, usize), limit: Option<usize>) -> Result<()> {
    let Some(limit) = limit else {
        return Ok(());
    };
    match size.0.checked_mul(size.1) {
        Some(pixels) if pixels <= limit => Ok(()),
        _ => Err(Error::ImageSizeTooLarge(size.0, size.1)),
    }
}

#[derive(Debug)]
pub struct DecodedImage {
    pub raster: Raster,
    pub block_count: usize,
    /// Number of block rows and columns spanned by the decoded blocks.
    pub block_extent: (usize, usize),
    /// Payloads of all skip segments, in stream order.
    pub skipped_segments: Vec<Vec<u8>>,
}

/// Decodes a complete VPEG stream.
///
/// The whole stream is parsed before any pixel is produced, so no raster is
/// returned unless the stream is well formed up to its end of file marker.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(data), fields(len = data.len()), err)
)]
pub fn decode(data: &[u8], options: &DecodeOptions) -> Result<DecodedImage> {
    if let Some(size) = options.raster_size {
        if size.0 % BLOCK_DIM != 0 || size.1 % BLOCK_DIM != 0 {
            return Err(Error::InvalidRasterSize(size.0, size.1));
        }
        check_pixel_limit(size, options.pixel_limit)?;
    }

    let mut parser = BlockParser::new(data);
    let mut blocks = Vec::new();
    let (mut rows, mut cols) = (0, 0);
    while let Some(positioned) = parser.next_block()? {
        let (block_row, block_col) = (positioned.block_row, positioned.block_col);
        match options.raster_size {
            Some((width, height)) => {
                if (block_row + 1) * BLOCK_DIM > height || (block_col + 1) * BLOCK_DIM > width {
                    return Err(Error::RasterOverflow {
                        block_row,
                        block_col,
                        width,
                        height,
                    });
                }
            }
            None => check_pixel_limit(
                (
                    cols.max(block_col + 1) * BLOCK_DIM,
                    rows.max(block_row + 1) * BLOCK_DIM,
                ),
                options.pixel_limit,
            )?,
        }
        rows = rows.max(block_row + 1);
        cols = cols.max(block_col + 1);
        blocks.try_reserve(1)?;
        blocks.push(positioned);
    }

    let size = options
        .raster_size
        .unwrap_or((cols * BLOCK_DIM, rows * BLOCK_DIM));
    let mut raster = Raster::new(size)?;
    let samples = reconstruct_blocks(&blocks);
    for (positioned, samples) in blocks.iter().zip(samples.iter()) {
        raster.put_block(positioned.block_row, positioned.block_col, samples)?;
    }
    debug!(
        width = size.0,
        height = size.1,
        blocks = blocks.len(),
        "decoded raster"
    );

    Ok(DecodedImage {
        raster,
        block_count: blocks.len(),
        block_extent: (rows, cols),
        skipped_segments: parser.skipped_segments().map(|s| s.to_vec()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use arbtest::arbtest;
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;
    use test_log::test;

    use super::*;
    use crate::{
        error::MalformedBlockKind,
        idct::Block,
        quant::QuantTable,
        util::test::{assert_all_almost_eq, encode_pixels, reference_idct2d},
    };

    fn decode_default(data: &[u8]) -> Result<DecodedImage> {
        decode(data, &DecodeOptions::default())
    }

    #[test]
    fn single_block_with_one_ac_coefficient() {
        // Table 1, DC 1000, first AC coefficient (scan index 1, horizontal
        // frequency 1) = -5. Each pixel is 125 - 1.25 * cos(pi / 8 * (x + 0.5)).
        let data = [0xa1, 0x03, 0xe8, 0x45, 0xac, 0xaf];
        let image = decode_default(&data).unwrap();
        assert_eq!(image.raster.size(), (8, 8));
        assert_eq!(image.block_count, 1);
        for y in 0..BLOCK_DIM {
            assert_eq!(image.raster.row(y), [123, 123, 124, 124, 125, 125, 126, 126]);
        }

        let mut coefficients = [[0.0; BLOCK_DIM]; BLOCK_DIM];
        coefficients[0][0] = 1000.0 * 8.0;
        coefficients[1][0] = -5.0 * 1.0 * 8.0;
        let expected = reference_idct2d(&coefficients);
        for y in 0..BLOCK_DIM {
            let row: Vec<f64> = image.raster.row(y).iter().map(|&p| p as f64).collect();
            let expected: Vec<f64> = expected[y].iter().map(|v| v.trunc()).collect();
            assert_all_almost_eq!(row, expected, 0.0);
        }
    }

    #[test]
    fn blocks_are_placed_by_row_and_column() {
        let data = [
            0xa0, 0x00, 0x80, 0xac, // (0, 0): 16
            0xa0, 0x01, 0x00, 0xac, // (0, 1): 32
            0xa0, 0x01, 0x80, 0xac, // (0, 2): 48
            0xae, //
            0xa0, 0x02, 0x00, 0xac, // (1, 0): 64
            0xaf,
        ];
        let image = decode_default(&data).unwrap();
        assert_eq!(image.raster.size(), (24, 16));
        assert_eq!(image.block_extent, (2, 3));
        let expected = [[16, 32, 48], [64, 0, 0]];
        for (block_row, values) in expected.iter().enumerate() {
            for (block_col, &value) in values.iter().enumerate() {
                let block = image.raster.block(block_row, block_col).unwrap();
                assert_eq!(block, [[value; BLOCK_DIM]; BLOCK_DIM]);
            }
        }
    }

    #[test]
    fn fixed_raster_size() {
        let data = [0xae, 0xa0, 0x07, 0xf8, 0xac, 0xaf];
        let options = DecodeOptions {
            raster_size: Some((320, 320)),
            ..Default::default()
        };
        let image = decode(&data, &options).unwrap();
        let raster = &image.raster;
        assert_eq!(raster.size(), (320, 320));
        assert_eq!(raster.block(1, 0).unwrap(), [[255; BLOCK_DIM]; BLOCK_DIM]);
        assert_eq!(raster.as_bytes().iter().filter(|&&p| p == 255).count(), 64);
    }

    #[test]
    fn block_outside_fixed_raster() {
        let data = [0xa0, 0x00, 0x00, 0xac, 0xa0, 0x00, 0x00, 0xac, 0xaf];
        let options = DecodeOptions {
            raster_size: Some((8, 8)),
            ..Default::default()
        };
        match decode(&data, &options) {
            Err(Error::RasterOverflow {
                block_row: 0,
                block_col: 1,
                width: 8,
                height: 8,
            }) => {}
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn invalid_fixed_raster_size() {
        let options = DecodeOptions {
            raster_size: Some((10, 8)),
            ..Default::default()
        };
        assert!(matches!(
            decode(&[0xaf], &options),
            Err(Error::InvalidRasterSize(10, 8))
        ));
    }

    #[test]
    fn pixel_limit() {
        let data = [0xae, 0xae, 0xa0, 0x00, 0x00, 0xac, 0xaf];
        let mut options = DecodeOptions {
            raster_size: None,
            pixel_limit: Some(8 * 16),
        };
        assert!(matches!(
            decode(&data, &options),
            Err(Error::ImageSizeTooLarge(8, 24))
        ));
        options.pixel_limit = None;
        assert_eq!(decode(&data, &options).unwrap().raster.size(), (8, 24));
    }

    #[test]
    fn empty_image() {
        let image = decode_default(&[0xae, 0xaf]).unwrap();
        assert_eq!(image.raster.size(), (0, 0));
        assert_eq!(image.block_count, 0);
    }

    #[test]
    fn trailing_bytes_after_end_of_file_are_ignored() {
        let image = decode_default(&[0xa0, 0x00, 0x00, 0xac, 0xaf, 0x13, 0x37]).unwrap();
        assert_eq!(image.block_count, 1);
    }

    #[test]
    fn missing_end_of_file() {
        assert!(matches!(
            decode_default(&[0xa0, 0x00, 0x00, 0xac]),
            Err(Error::TruncatedStream { offset: 4, .. })
        ));
    }

    #[test]
    fn unexpected_opcode_at_block_boundary() {
        for (data, offset, found) in [
            (&[0x05, 0xac, 0xaf][..], 0, 0x05),
            (&[0xac, 0xaf][..], 0, 0xac),
            (&[0xa0, 0x00, 0x00, 0xac, 0x9e, 0x00, 0xaf][..], 4, 0x9e),
            (&[0xae, 0xff, 0x01, 0xaf, 0xad][..], 4, 0xad),
        ] {
            match decode_default(data) {
                Err(Error::ProtocolError {
                    offset: o,
                    found: f,
                }) => {
                    assert_eq!((o, f), (offset, found));
                }
                other => panic!("unexpected result {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_block_aborts_decode() {
        let data = [0xa0, 0x00, 0x00, 0x9e, 0x00, 0xaf];
        assert!(matches!(
            decode_default(&data),
            Err(Error::MalformedBlock {
                offset: 5,
                kind: MalformedBlockKind::UnexpectedOpcode(0xaf)
            })
        ));
    }

    #[test]
    fn state_machine_transitions() {
        let data = [0xa0, 0x00, 0x00, 0xac, 0xae, 0xaf];
        let mut parser = BlockParser::new(&data);
        assert_eq!(parser.state(), DecoderState::Start);
        let block = parser.next_block().unwrap().unwrap();
        assert_eq!((block.block_row, block.block_col), (0, 0));
        assert_eq!(parser.state(), DecoderState::Start);
        assert!(parser.next_block().unwrap().is_none());
        assert_eq!(parser.state(), DecoderState::Eof);
        assert_eq!(parser.position(), data.len());
        assert!(parser.next_block().unwrap().is_none());
    }

    #[test]
    fn iterator_stops_after_error() {
        let data = [0xa0, 0x00, 0x00, 0xac, 0x01, 0xa0, 0x00, 0x00, 0xac, 0xaf];
        let results: Vec<_> = BlockParser::new(&data).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::ProtocolError { offset: 4, .. })));
    }

    #[test]
    fn skip_segments_are_reported() {
        let data = b"\xff\x02hi\xa0\x00\x00\xff\x00\xac\xff\x03end\xaf";
        let image = decode_default(data).unwrap();
        assert_eq!(image.skipped_segments, [b"hi".to_vec(), vec![], b"end".to_vec()]);
    }

    #[test]
    fn skip_segments_are_transparent() {
        let data = [
            0xa3, 0x01, 0xe0, 0x11, 0x1c, 0x02, 0x50, 0x87, 0x03, 0x44, 0x9e, 0x00, 0xac, 0xae,
            0xa2, 0xfe, 0x70, 0x41, 0x8c, 0x01, 0xac, 0xa1, 0x00, 0x40, 0x3f, 0xac, 0xaf,
        ];
        // Offsets at which an opcode starts.
        let opcode_starts = [0, 3, 4, 5, 6, 7, 9, 10, 12, 13, 14, 17, 18, 20, 21, 24, 25, 26];
        let reference = decode_default(&data).unwrap().raster;
        arbtest(|u| {
            let offset = *u.choose(&opcode_starts)?;
            let payload: [u8; 3] = u.arbitrary()?;
            let mut with_skip = data[..offset].to_vec();
            with_skip.extend([0xff, 0x03]);
            with_skip.extend(payload);
            with_skip.extend(&data[offset..]);
            let image = decode_default(&with_skip).unwrap();
            assert_eq!(image.raster, reference);
            assert_eq!(image.skipped_segments, [payload.to_vec()]);
            Ok(())
        });
    }

    fn test_block(f: impl Fn(usize, usize) -> f64) -> Block {
        array_init::array_init(|y| array_init::array_init(|x| f(x, y)))
    }

    #[test]
    fn round_trip_within_one() {
        let plane = test_block(|x, y| 60.0 + 9.0 * x as f64 + 13.0 * y as f64);
        let wave = test_block(|x, y| {
            let fx = (PI / 8.0 * (x as f64 + 0.5)).cos();
            let fy = (PI / 8.0 * 2.0 * (y as f64 + 0.5)).cos();
            (128.0 + 60.0 * fx * fy).round()
        });
        let checker = test_block(|x, y| if (x + y) % 2 == 1 { 200.0 } else { 50.0 });
        let diag = test_block(|x, y| ((x * y * 4) % 256) as f64);
        let ramp = test_block(|x, _| 40.0 + 20.0 * x as f64);
        let vramp = test_block(|_, y| 30.0 + 25.0 * y as f64);
        let edge = test_block(|x, _| if x >= 4 { 220.0 } else { 30.0 });

        // Every AC coefficient of these fits in the format's 8-bit magnitude
        // at the given table.
        let cases = [
            (QuantTable::Zero, &plane),
            (QuantTable::Zero, &wave),
            (QuantTable::Zero, &checker),
            (QuantTable::Zero, &diag),
            (QuantTable::One, &plane),
            (QuantTable::One, &wave),
            (QuantTable::One, &diag),
            (QuantTable::Two, &ramp),
            (QuantTable::Two, &vramp),
            (QuantTable::Two, &edge),
            (QuantTable::Two, &wave),
            (QuantTable::Three, &ramp),
            (QuantTable::Three, &edge),
            (QuantTable::Three, &wave),
        ];
        for (table, pixels) in cases {
            let mut data = encode_pixels(table, pixels);
            data.push(END_OF_FILE);
            let image = decode_default(&data).unwrap();
            let decoded = image.raster.block(0, 0).unwrap();
            for y in 0..BLOCK_DIM {
                for x in 0..BLOCK_DIM {
                    let diff = (decoded[y][x] as f64 - pixels[y][x]).abs();
                    assert!(
                        diff <= 1.0,
                        "{table:?} ({y}, {x}): {} vs {}",
                        decoded[y][x],
                        pixels[y][x]
                    );
                }
            }
        }
    }

    #[test]
    fn decoded_blocks_match_single_block_reconstruction() {
        let mut rng = XorShiftRng::seed_from_u64(7);
        let mut data = vec![];
        for row in 0..4 {
            if row > 0 {
                data.push(NEXT_ROW);
            }
            for _ in 0..6 {
                let table = QuantTable::from_selector(rng.random_range(0..4));
                let base = rng.random_range(30.0..225.0);
                let pixels = test_block(|x, y| base + (x as f64 - y as f64) * 3.0);
                data.extend(encode_pixels(table, &pixels));
            }
        }
        data.push(END_OF_FILE);
        let image = decode_default(&data).unwrap();
        assert_eq!(image.raster.size(), (48, 32));
        let mut parser = BlockParser::new(&data);
        while let Some(positioned) = parser.next_block().unwrap() {
            assert_eq!(
                image
                    .raster
                    .block(positioned.block_row, positioned.block_col)
                    .unwrap(),
                reconstruct_block(&positioned.block)
            );
        }
    }

    #[test]
    fn never_panics() {
        arbtest(|u| {
            let data: Vec<u8> = u.arbitrary()?;
            let options = DecodeOptions {
                raster_size: None,
                pixel_limit: Some(1 << 16),
            };
            let _ = decode(&data, &options);
            Ok(())
        });
    }
}
