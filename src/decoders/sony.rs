/*
 * rawspeed - decoders/sony.rs
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

//! Sony ARW1/ARW2 decompressors (spec 4.G).
//!
//! ARW2 is grounded on `original_source`'s `ARWDecompressor.cpp`
//! (`DecodeARW`'s 8bpp path: 16-sample min/max blocks interleaved two at
//! a time into 32 output columns, and the 12bpp 1.5-byte-per-pixel
//! unpack) and its `curve[]` construction from the `SonyCurve` maker
//! tag. ARW1 has no surviving source in the retrieved pack; it follows
//! spec 4.G's description directly (see DESIGN.md).

use crate::bitpump::{BitPump, BitPumpLsb, BitPumpMsb};
use crate::buffer::ByteBufferView;
use crate::huffman::extend;
use crate::image::RawImage;
use crate::{Error, Result};

/// Build the ARW2 curve lookup table from the camera's `SonyCurve` tag
/// (4 raw knot values): five linear segments of doubling step size
/// between the implicit endpoints 0 and 4095.
pub fn build_curve(sony_curve_tag: [u16; 4]) -> Vec<u16> {
    let mut knots = [0u32, 0, 0, 0, 0, 4095];
    for (i, &c) in sony_curve_tag.iter().enumerate() {
        knots[i + 1] = (c as u32 >> 2) & 0xfff;
    }
    let mut curve = vec![0u16; 0x4001];
    for (i, slot) in curve.iter_mut().enumerate() {
        *slot = i as u16;
    }
    for i in 0..5 {
        for j in (knots[i] + 1)..=knots[i + 1] {
            curve[j as usize] = curve[(j - 1) as usize].wrapping_add(1 << i);
        }
    }
    curve
}

/// ARW1: column-major, a small variable-length prefix code (2..17 bits,
/// unary-extended) selects the bit-width of each signed difference,
/// accumulated into a running per-column sum with a row wrap at `h`.
pub fn decompress_arw1(image: &mut RawImage, data: &ByteBufferView) -> Result<()> {
    let width = image.width();
    let height = image.height();
    let stride = image.row_stride();
    let mut pump = BitPumpMsb::new(data);
    let out = image.data16_mut().ok_or(Error::WrongType)?;

    for x in (1..=width).rev() {
        let col = (x - 1) as usize;
        let mut sum = 0i32;
        let mut y = 0u32;
        for _ in 0..height {
            let mut len = 2u32;
            while len < 17 && pump.get_bits(1) != 0 {
                len += 1;
            }
            let diff = extend(pump.get_bits(len) as i32, len);
            sum += diff;
            out[(y as usize) * stride + col] = sum.clamp(0, 65535) as u16;

            y += 2;
            if y == height {
                y = 1;
            } else if y > height {
                y -= height;
            }
        }
    }
    Ok(())
}

/// ARW2 8-bpp mode: 32-pixel super-blocks, each made of two interleaved
/// 16-sample min/max-coded blocks (even then odd output columns).
pub fn decompress_arw2_8bpp(image: &mut RawImage, data: &ByteBufferView, curve: &[u16]) -> Result<()> {
    let width = image.width();
    let height = image.height();
    let stride = image.row_stride();
    let out = image.data16_mut().ok_or(Error::WrongType)?;

    for y in 0..height {
        // Realign to this row's byte offset, as the original's
        // `setAbsoluteOffset((w*bpp*y)>>3)` does for bpp == 8.
        let mut row_view = *data;
        row_view.skip_bytes(width as usize * y as usize)?;
        let mut pump = BitPumpLsb::new(&row_view);
        let dest_row = (y as usize) * stride;
        let mut x = 0u32;
        while x < width.saturating_sub(30) {
            let max = pump.get_bits(11) as i32;
            let min = pump.get_bits(11) as i32;
            let imax = pump.get_bits(4) as usize;
            let imin = pump.get_bits(4) as usize;
            let mut sh = 0u32;
            while sh < 4 && (0x80i32 << sh) <= max - min {
                sh += 1;
            }
            let mut pix = [0i32; 16];
            for (i, slot) in pix.iter_mut().enumerate() {
                *slot = if i == imax {
                    max
                } else if i == imin {
                    min
                } else {
                    let v = (pump.get_bits(7) as i32) << sh;
                    (v + min).min(0x7ff)
                };
            }
            for (i, &p) in pix.iter().enumerate() {
                out[dest_row + (x as usize) + i * 2] = curve[((p << 1) as usize).min(curve.len() - 1)] >> 1;
            }
            x += if x & 1 != 0 { 31 } else { 1 };
        }
    }
    Ok(())
}

/// ARW2 12-bpp mode: the generic 12-bits-in-1.5-bytes unpacker (two
/// pixels packed into three bytes, little-endian nibble order).
pub fn decompress_arw2_12bpp(image: &mut RawImage, data: &ByteBufferView) -> Result<()> {
    let width = image.width();
    let height = image.height();
    let stride = image.row_stride();
    let raw = data.as_slice();
    let bytes_per_row = (width as usize) * 3 / 2;

    let avail_rows = if raw.len() < bytes_per_row * height as usize {
        raw.len() / bytes_per_row
    } else {
        height as usize
    };

    let out = image.data16_mut().ok_or(Error::WrongType)?;
    for y in 0..avail_rows {
        let row_in = &raw[y * bytes_per_row..(y + 1) * bytes_per_row];
        let row_out = &mut out[y * stride..y * stride + width as usize];
        let mut x = 0usize;
        let mut i = 0usize;
        while x + 1 < width as usize {
            let g1 = row_in[i] as u16;
            let g2 = row_in[i + 1] as u16;
            let g3 = row_in[i + 2] as u16;
            row_out[x] = g1 | ((g2 & 0xf) << 8);
            row_out[x + 1] = (g2 >> 2) | (g3 << 4);
            x += 2;
            i += 3;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_curve_is_identity_below_first_knot() {
        let curve = build_curve([0, 0, 0, 0]);
        assert_eq!(curve[0], 0);
    }

    #[test]
    fn test_curve_monotonic_nondecreasing() {
        // The original only ever rewrites indices up to the last knot
        // (4095); everything past that stays the untouched identity
        // mapping seeded before the knot loop, so monotonicity is only
        // guaranteed within the rewritten range, not across the whole
        // 0x4001-entry table (indices are never queried with `pix << 1`
        // large enough to cross that boundary in practice).
        let curve = build_curve([400, 800, 1200, 1600]);
        for w in curve[..=4095].windows(2) {
            assert!(w[1] >= w[0]);
        }
    }

    #[test]
    fn test_12bpp_unpack_two_pixels_per_three_bytes() {
        let mut image = RawImage::new_u16(2, 1, 1);
        // g1=0xAB, g2=0xC1, g3=0x23 -> px0 = 0xAB | ((0xC1&0xF)<<8) = 0xAB | 0x100 = 0x1AB
        // px1 = (0xC1>>2) | (0x23<<4) = 0x30 | 0x230 = 0x230 (0x30's bits
        // already set within 0x230, so the OR doesn't add them)
        let data = [0xAB, 0xC1, 0x23];
        let view = ByteBufferView::new(&data, crate::buffer::Endian::Little);
        decompress_arw2_12bpp(&mut image, &view).unwrap();
        let out = image.data16().unwrap();
        assert_eq!(out[0], 0x1AB);
        assert_eq!(out[1], 0x230);
    }
}
