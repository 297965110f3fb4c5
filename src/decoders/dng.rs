/*
 * rawspeed - decoders/dng.rs
 *
 * Copyright (C) 2024 The rawspeed-rs authors
 *
 * This library is free software: you can redistribute it and/or
 * modify it under the terms of the GNU Lesser General Public License
 * as published by the Free Software Foundation, either version 3 of
 * the License, or (at your option) any later version.
 *
 * This library is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
 * Lesser General Public License for more details.
 *
 * You should have received a copy of the GNU Lesser General Public
 * License along with this library.  If not, see
 * <http://www.gnu.org/licenses/>.
 */

//! DNG lossless-JPEG tile decompressor (spec 4.G): one [`LJpegEngine`]
//! instance per tile, tiles decoded independently and dispatched per
//! spec 4.I.
//!
//! Grounded on `original_source`'s `DngDecoderSlices.cpp`: one
//! `LJpegPlain` per `DngSliceElement` (`byteOffset`, `byteCount`,
//! `offX`, `offY`), `mFixLjpeg` as the DNG-bug-compat toggle, and
//! per-tile failures collected into an error list rather than aborting
//! the whole decode. Unlike the original (which lets every worker
//! thread write directly into the shared `mRaw` buffer, relying only on
//! tile-rect disjointness for safety), each tile here is decoded into
//! an owned buffer in parallel and copied into the image during a
//! short sequential composition pass — avoiding unsafe concurrent
//! aliasing of the output buffer while keeping the decode work, which
//! dominates runtime, parallel.

use crate::buffer::ByteBufferView;
use crate::image::{Rect, RawImage};
use crate::ljpeg::LJpegEngine;
use crate::tile::TileDescriptor;
use crate::{Error, Result};

use rayon::prelude::*;

/// One DNG tile: destination rectangle plus its entropy-coded byte
/// range within the file buffer.
pub type DngTile = TileDescriptor;

/// DNG 1.0's Huffman-decoder bug-compat toggle (spec 4.C / 4.G): set
/// when `DNGVersion`'s major.minor is less than 1.1.
pub fn needs_bug_compat(version: [u8; 4]) -> bool {
    let major = version[0];
    let minor = version[1];
    major < 1 || (major == 1 && minor < 1)
}

/// Decode every tile independently, writing each tile's plane into
/// `image` at its declared offset. Returns the stringified errors of
/// any tile that failed to decode; a fatal structural error (tiles
/// overlapping) is returned directly.
pub fn decompress_tiles(
    image: &mut RawImage,
    file: &ByteBufferView,
    tiles: &[DngTile],
    dng_bug_compat: bool,
) -> Result<Vec<String>> {
    if !crate::tile::rects_disjoint(tiles) {
        return Err(Error::DecodeError("DNG tile rectangles overlap".into()));
    }
    let cpp = image.cpp() as usize;

    let decoded: Vec<(Rect, Result<Vec<u16>>)> = tiles
        .par_iter()
        .map(|t| {
            let outcome = (|| -> Result<Vec<u16>> {
                file.check_at(t.byte_offset, t.byte_count)?;
                let tile_slice = &file.as_slice()[t.byte_offset..t.byte_offset + t.byte_count];
                let tile_buf = ByteBufferView::new(tile_slice, file.endian());
                let plane = LJpegEngine::decompress_with_options(&tile_buf, true, dng_bug_compat)?;
                Ok(plane.samples)
            })();
            (t.rect, outcome)
        })
        .collect();

    let mut errors = Vec::new();
    let stride = image.row_stride();
    let out = image.data16_mut().ok_or(Error::WrongType)?;
    for (rect, outcome) in decoded {
        match outcome {
            Ok(samples) => {
                for y in 0..rect.height as usize {
                    let src = &samples[y * rect.width as usize * cpp..(y + 1) * rect.width as usize * cpp];
                    let dst_row = (rect.y as usize + y) * stride + rect.x as usize * cpp;
                    out[dst_row..dst_row + src.len()].copy_from_slice(src);
                }
            }
            Err(e) => errors.push(e.to_string()),
        }
    }
    Ok(errors)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::buffer::Endian;

    #[test]
    fn test_needs_bug_compat_below_one_one() {
        assert!(needs_bug_compat([1, 0, 0, 0]));
        assert!(!needs_bug_compat([1, 1, 0, 0]));
        assert!(!needs_bug_compat([1, 4, 0, 0]));
    }

    #[test]
    fn test_rejects_overlapping_tiles() {
        let mut image = RawImage::new_u16(4, 4, 1);
        let tiles = [
            DngTile {
                rect: Rect { x: 0, y: 0, width: 2, height: 2 },
                byte_offset: 0,
                byte_count: 0,
            },
            DngTile {
                rect: Rect { x: 1, y: 1, width: 2, height: 2 },
                byte_offset: 0,
                byte_count: 0,
            },
        ];
        let data = [0u8; 16];
        let view = ByteBufferView::new(&data, Endian::Big);
        assert!(decompress_tiles(&mut image, &view, &tiles, false).is_err());
    }
}
