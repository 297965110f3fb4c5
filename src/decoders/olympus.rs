/*
 * rawspeed - decoders/olympus.rs
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

//! Olympus ORF decompressor (spec 4.G): adaptive Golomb-Rice with a
//! MED-style neighborhood predictor.
//!
//! Grounded directly on `original_source`'s `OrfDecoder.cpp::decodeCompressed`
//! (found under its `RawSpeed/` tree rather than `decompressors/`): the
//! `bittable` leading-zero-count construction, the adaptive `nbits` from
//! `carry[2]`, the `15, (12+3)`-bit peek/skip shape, and the three-way
//! neighborhood predictor (`wo`, `n`, `nw`) with its monotonicity test.

use crate::bitpump::{BitPump, BitPumpMsb};
use crate::buffer::ByteBufferView;
use crate::image::RawImage;
use crate::{Error, Result};

fn build_bittable() -> [u8; 4096] {
    let mut table = [12u8; 4096];
    for (i, slot) in table.iter_mut().enumerate() {
        for high in 0..12u8 {
            if (i >> (11 - high)) & 1 != 0 {
                *slot = high;
                break;
            }
        }
    }
    table
}

/// Decompress an Olympus ORF plane. The bit pump starts 7 bytes into
/// `data`, matching the original's `s.skipBytes(7)` before constructing
/// its `BitPumpMSB`.
pub fn decompress(image: &mut RawImage, data: &ByteBufferView) -> Result<()> {
    let width = image.width() as usize;
    let height = image.height() as usize;
    if width < 2 || height < 2 {
        return Err(Error::DecodeError(format!(
            "unexpected Olympus image dimensions: ({width}; {height})"
        )));
    }
    let mut view = *data;
    view.skip_bytes(7)?;
    let mut pump = BitPumpMsb::new(&view);

    let bittable = build_bittable();
    let stride = image.row_stride();
    let out = image.data16_mut().ok_or(Error::WrongType)?;

    for y in 0..height {
        let mut carry = [[0i32; 3]; 2];
        for x in 0..width {
            let parity = x & 1;
            let i = 2 * (carry[parity][2] < 3) as i32;
            let mut nbits = 2 + i;
            while ((carry[parity][0] as u16) >> (nbits + i)) != 0 {
                nbits += 1;
            }

            pump.fill(32);
            let b = pump.peek_bits_no_fill(15) as i32;
            let sign: i32 = if (b >> 14) != 0 { -1 } else { 0 };
            let low = (b >> 12) & 3;
            let mut high = bittable[(b & 4095) as usize] as i32;
            pump.skip_bits_no_fill((12 + 3).min(high + 1 + 3) as u32);

            if high == 12 {
                high = pump.get_bits((16 - nbits) as u32) as i32 >> 1;
            }
            carry[parity][0] = (high << nbits) | pump.get_bits(nbits as u32) as i32;
            let diff = (carry[parity][0] ^ sign) + carry[parity][1];
            carry[parity][1] = (diff * 3 + carry[parity][1]) >> 5;
            carry[parity][2] = if carry[parity][0] > 16 { 0 } else { carry[parity][2] + 1 };

            let pred = if y < 2 && x < 2 {
                0
            } else if y < 2 {
                out[y * stride + x - 2] as i32
            } else if x < 2 {
                out[(y - 1) * stride + x] as i32
            } else {
                let wo = out[y * stride + x - 2] as i32;
                let n = out[(y - 1) * stride + x] as i32;
                let nw = out[(y - 1) * stride + x - 2] as i32;
                if (wo < nw && nw < n) || (n < nw && nw < wo) {
                    if (wo - nw).abs() > 32 || (n - nw).abs() > 32 {
                        wo + n - nw
                    } else {
                        (wo + n) >> 1
                    }
                } else if (wo - nw).abs() > (n - nw).abs() {
                    wo
                } else {
                    n
                }
            };

            let value = pred + ((diff << 2) | low);
            out[y * stride + x] = (value & 0xfff) as u16;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::buffer::Endian;

    #[test]
    fn test_bittable_all_zero_maps_to_twelve() {
        let t = build_bittable();
        assert_eq!(t[0], 12);
    }

    #[test]
    fn test_bittable_top_bit_maps_to_zero() {
        let t = build_bittable();
        assert_eq!(t[0b1000_0000_0000], 0);
    }

    #[test]
    fn test_rejects_tiny_image() {
        let mut image = RawImage::new_u16(1, 1, 1);
        let data = vec![0u8; 32];
        let view = ByteBufferView::new(&data, Endian::Big);
        assert!(decompress(&mut image, &view).is_err());
    }

    #[test]
    fn test_decode_runs_on_zeroed_stream() {
        let mut image = RawImage::new_u16(4, 4, 1);
        let data = vec![0u8; 128];
        let view = ByteBufferView::new(&data, Endian::Big);
        assert!(decompress(&mut image, &view).is_ok());
    }
}
