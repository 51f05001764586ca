// Copyright (c) the VPEG Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use color_eyre::eyre::{Result, eyre};
use vpeg::raster::Raster;

/// Encodes a raster as an 8-bit grayscale PNG.
pub fn to_png(raster: &Raster) -> Result<Vec<u8>> {
    let (width, height) = raster.size();
    if width == 0 || height == 0 {
        return Err(eyre!("Cannot write an empty {width}x{height} image as PNG"));
    }
    let mut buf = vec![];
    {
        let mut encoder = png::Encoder::new(&mut buf, width.try_into()?, height.try_into()?);
        encoder.set_color(png::ColorType::Grayscale);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(raster.as_bytes())?;
        writer.finish()?;
    }
    Ok(buf)
}
