/*
 * rawspeed - decoders/pentax.rs
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

//! Pentax PEF decompressor (spec 4.G): a camera-supplied or 13-entry
//! fallback Huffman table, decoded with independent odd/even-column
//! predictors.
//!
//! Grounded on `original_source`'s `PentaxDecompressor.cpp`:
//! `SetupHuffmanTable_Legacy`/`SetupHuffmanTable_Modern` (the 0x220
//! maker-note table layout and its "pick the smallest remaining code"
//! reordering) and `decompressInternal`'s two-predictor row loop,
//! simplified to the single-threaded (`NoThreading`) path since this
//! crate's concurrency boundary is the tile, not the row range (spec
//! §5).

use crate::bitpump::BitPumpMsb;
use crate::buffer::ByteBufferView;
use crate::huffman::{DecodeMode, HuffmanTable};
use crate::image::RawImage;
use crate::{Error, Result};

const PENTAX_TREE_NCPL: [u8; 16] = [0, 2, 3, 1, 1, 1, 1, 1, 1, 2, 0, 0, 0, 0, 0, 0];
const PENTAX_TREE_VALUES: [u8; 13] = [3, 4, 2, 5, 1, 6, 0, 7, 8, 9, 10, 11, 12];

/// The 13-entry fallback table used when the camera carries no 0x220
/// maker-note Huffman table.
pub fn setup_huffman_table_legacy() -> Result<HuffmanTable> {
    HuffmanTable::new(&PENTAX_TREE_NCPL, &PENTAX_TREE_VALUES, DecodeMode::LengthOnly)
}

/// Build a table from the camera-supplied 0x220 maker-note field:
/// a 16-bit depth-12 count, 12 bytes skipped, then `depth` u16 raw
/// codes and `depth` u8 bit-lengths (1..12). Codes are reassigned
/// canonically in ascending order of `code >> (12 - length)`.
pub fn setup_huffman_table_modern(field: &mut ByteBufferView) -> Result<HuffmanTable> {
    let depth = field.read_u16()? as usize + 12;
    if depth > 15 {
        return Err(Error::ParseError(format!("Pentax huffman table depth too great ({depth})")));
    }
    field.skip_bytes(12)?;

    let mut v0 = [0u32; 16];
    let mut v1 = [0u32; 16];
    for slot in v0.iter_mut().take(depth) {
        *slot = field.read_u16()? as u32;
    }
    for (i, slot) in v1.iter_mut().take(depth).enumerate() {
        *slot = field.read_u8()? as u32;
        if *slot == 0 || *slot > 12 {
            return Err(Error::ParseError(format!("corrupt Pentax huffman data: v1[{i}]={}, expected [1..12]", *slot)));
        }
    }

    let mut v2 = [0u32; 16];
    let mut n_codes_per_length = [0u8; 17];
    for c in 0..depth {
        v2[c] = v0[c] >> (12 - v1[c]);
        n_codes_per_length[v1[c] as usize] += 1;
    }

    let mut code_values = Vec::with_capacity(depth);
    for _ in 0..depth {
        let mut sm_val = u32::MAX;
        let mut sm_num = 0xffusize;
        for (j, &val) in v2.iter().enumerate().take(depth) {
            if val <= sm_val {
                sm_num = j;
                sm_val = val;
            }
        }
        code_values.push(sm_num as u8);
        v2[sm_num] = u32::MAX;
    }

    let ncpl: [u8; 16] = n_codes_per_length[1..17].try_into().unwrap();
    HuffmanTable::new(&ncpl, &code_values, DecodeMode::LengthOnly)
}

/// Decompress a Pentax PEF plane. `maker_note_0x220` is the camera's
/// huffman-table maker-note field, if present; otherwise the legacy
/// table is used.
pub fn decompress(image: &mut RawImage, data: &ByteBufferView, maker_note_0x220: Option<&mut ByteBufferView>) -> Result<()> {
    let ht = match maker_note_0x220 {
        Some(field) => setup_huffman_table_modern(field)?,
        None => setup_huffman_table_legacy()?,
    };

    let width = image.width();
    let height = image.height();
    if width < 2 {
        return Err(Error::DecodeError("Pentax frame narrower than 2 pixels".into()));
    }
    let stride = image.row_stride();
    let mut pump = BitPumpMsb::new(data);
    let out = image.data16_mut().ok_or(Error::WrongType)?;

    let mut p_up = [[0i32; 2]; 2];
    for y in 0..height {
        let parity = (y & 1) as usize;
        let row = (y as usize) * stride;

        p_up[0][parity] += ht.decode(&mut pump)?;
        p_up[1][parity] += ht.decode(&mut pump)?;
        out[row] = p_up[0][parity] as u16;
        out[row + 1] = p_up[1][parity] as u16;
        let mut pred = [p_up[0][parity], p_up[1][parity]];

        let mut x = 2u32;
        while x < width {
            let diff0 = ht.decode(&mut pump)?;
            let diff1 = ht.decode(&mut pump)?;
            pred[0] += diff0;
            pred[1] += diff1;
            if !(0..=65535).contains(&pred[0]) || !(0..=65535).contains(&pred[1]) {
                return Err(Error::DecodeError(format!("decoded value out of bounds at ({x}, {y})")));
            }
            out[row + x as usize] = pred[0] as u16;
            out[row + x as usize + 1] = pred[1] as u16;
            x += 2;
        }
    }
    Ok(())
}
