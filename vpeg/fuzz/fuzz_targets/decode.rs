// Copyright (c) the VPEG Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
#![no_main]

use libfuzzer_sys::fuzz_target;
use vpeg::decode::{DecodeOptions, decode};

fuzz_target!(|data: &[u8]| {
    let options = DecodeOptions {
        raster_size: None,
        pixel_limit: Some(1 << 24),
    };
    if let Ok(image) = decode(data, &options) {
        let (width, height) = image.raster.size();
        assert_eq!(image.raster.as_bytes().len(), width * height);
    }
});
