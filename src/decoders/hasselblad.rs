/*
 * rawspeed - decoders/hasselblad.rs
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

//! Hasselblad 3FR decompressor (spec 4.G): an MSB32 bit pump with a
//! length-only Huffman table and paired per-row predictors.
//!
//! Grounded directly on `original_source`'s `HasselbladDecompressor.cpp`:
//! the `initPred = 0x8000` seed, the `diff == 65535 -> -32768` sentinel,
//! and the deliberately unclamped 16-bit truncation on write (the
//! original's comment notes clamping "results in completely garbled
//! images"; this keeps that behavior without repeating the comment's
//! justification wording).

use crate::bitpump::{BitPump, BitPumpMsb32};
use crate::buffer::ByteBufferView;
use crate::huffman::{extend, DecodeMode, HuffmanTable};
use crate::image::RawImage;
use crate::{Error, Result};

const INIT_PRED: i32 = 0x8000;

fn get_diff(pump: &mut BitPumpMsb32, ht: &HuffmanTable) -> Result<i32> {
    let len = ht.decode(pump)?;
    if len == 0 {
        return Ok(0);
    }
    let diff = pump.get_bits(len as u32) as i32;
    if diff == 65535 {
        Ok(-32768)
    } else {
        Ok(extend(diff, len as u32))
    }
}

/// Decompress a Hasselblad plane. `ht` must be a length-only table
/// (rejects a full-decode table, matching the original's explicit
/// check — a full-decode table here means the DHT carried difference
/// bit counts inline, which this format's stream does not expect).
pub fn decompress(image: &mut RawImage, data: &ByteBufferView, ht: &HuffmanTable) -> Result<()> {
    if ht.mode() != DecodeMode::LengthOnly {
        return Err(Error::ParseError("Hasselblad requires a length-only huffman table".into()));
    }

    let width = image.width();
    let height = image.height();
    if width == 0 || width % 2 != 0 || width > 12000 || height > 8816 {
        return Err(Error::DecodeError(format!(
            "unexpected Hasselblad image dimensions: ({width}; {height})"
        )));
    }
    let stride = image.row_stride();
    let mut pump = BitPumpMsb32::new(data);
    let out = image.data16_mut().ok_or(Error::WrongType)?;

    for y in 0..height {
        let mut p1 = INIT_PRED;
        let mut p2 = INIT_PRED;
        let row = (y as usize) * stride;
        let mut x = 0u32;
        while x < width {
            p1 += get_diff(&mut pump, ht)?;
            p2 += get_diff(&mut pump, ht)?;
            out[row + x as usize] = p1 as u16;
            out[row + x as usize + 1] = p2 as u16;
            x += 2;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rejects_full_decode_table() {
        let mut lens = [0u8; 16];
        lens[0] = 1;
        let ht = HuffmanTable::new(&lens, &[0], DecodeMode::FullDecode).unwrap();
        let mut image = RawImage::new_u16(2, 2, 1);
        let data = [0u8; 16];
        let view = ByteBufferView::new(&data, crate::buffer::Endian::Big);
        assert!(decompress(&mut image, &view, &ht).is_err());
    }

    #[test]
    fn test_sentinel_65535_maps_to_negative_32768() {
        let mut lens = [0u8; 16];
        lens[15] = 1; // one code of length 16
        let ht = HuffmanTable::new(&lens, &[16], DecodeMode::LengthOnly).unwrap();
        // code "0000000000000000" (16 zero bits) decodes length=16;
        // then 16 bits of all-ones -> diff == 65535 -> sentinel -32768.
        let data = [0x00, 0x00, 0xFF, 0xFF];
        let view = ByteBufferView::new(&data, crate::buffer::Endian::Big);
        let mut pump = BitPumpMsb32::new(&view);
        assert_eq!(get_diff(&mut pump, &ht).unwrap(), -32768);
    }
}
