// Copyright (c) the VPEG Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use std::fs;
use std::path::PathBuf;
use vpeg::decode::{DEFAULT_PIXEL_LIMIT, DecodeOptions, decode};
use vpeg::raster::Raster;
use vpeg_cli::enc::{png::to_png, pnm::to_pgm};

fn parse_size(s: &str) -> Result<(usize, usize), String> {
    let (width, height) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid dimension {v:?}: {e}"))
    };
    Ok((parse(width)?, parse(height)?))
}

fn save_image(raster: &Raster, output_filename: &PathBuf) -> Result<()> {
    let extension = output_filename
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    let output_bytes = match extension.as_deref() {
        Some("pgm") => to_pgm(raster),
        Some("png") => to_png(raster)?,
        _ => {
            return Err(eyre!(
                "Output format not supported for {}, should end in .pgm or .png",
                output_filename.display()
            ));
        }
    };
    fs::write(output_filename, output_bytes)
        .wrap_err_with(|| format!("Cannot write {}", output_filename.display()))
}

#[derive(Parser)]
struct Opt {
    /// Input VPEG file
    input: PathBuf,

    /// Output image file, should end in .pgm or .png
    output: PathBuf,

    /// Size of the output raster as WIDTHxHEIGHT. If not given, the raster is
    /// sized to fit the decoded blocks.
    #[clap(long, value_parser = parse_size)]
    size: Option<(usize, usize)>,

    /// Maximum number of pixels of the output, 0 for no limit
    #[clap(long, default_value_t = DEFAULT_PIXEL_LIMIT)]
    pixel_limit: usize,

    /// Print the payloads of the skip segments found in the stream
    #[clap(long)]
    print_skipped: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    #[cfg(feature = "tracing-subscriber")]
    {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(EnvFilter::from_default_env())
            .init();
    }

    let opt = Opt::parse();
    let data = fs::read(&opt.input)
        .wrap_err_with(|| format!("Cannot read {}", opt.input.display()))?;

    let options = DecodeOptions {
        raster_size: opt.size,
        pixel_limit: (opt.pixel_limit != 0).then_some(opt.pixel_limit),
    };
    let image = decode(&data, &options)
        .wrap_err_with(|| format!("Error decoding {}", opt.input.display()))?;

    let (width, height) = image.raster.size();
    println!(
        "Image size: {width} x {height}, {} blocks in {} x {} block grid",
        image.block_count, image.block_extent.1, image.block_extent.0
    );
    if opt.print_skipped {
        for (i, segment) in image.skipped_segments.iter().enumerate() {
            println!("skip segment {i}: {}", String::from_utf8_lossy(segment));
        }
    }

    save_image(&image.raster, &opt.output)
}
