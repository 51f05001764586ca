// Copyright (c) the VPEG Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::io::Write;
use vpeg::raster::Raster;

pub fn to_pgm(raster: &Raster) -> Vec<u8> {
    let (width, height) = raster.size();
    let mut ret = vec![];
    // Writing to a Vec cannot fail.
    let _ = write!(&mut ret, "P5\n{width} {height}\n255\n");
    ret.extend_from_slice(raster.as_bytes());
    ret
}
