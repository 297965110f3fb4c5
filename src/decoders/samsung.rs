/*
 * rawspeed - decoders/samsung.rs
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

//! Samsung NX decompressors (spec 4.G): v1's 1024-entry variable-length
//! table, NX3000's table variant, NX1's reference-line predictor, and
//! SRW v2 (NX300+)'s group-header scheme.
//!
//! `decompress_v1` is grounded directly on `original_source`'s
//! `SamsungV1Decompressor.cpp`: the 14-entry `(encLen, diffLen)` table,
//! its expansion into a 1024-entry fast table, and the
//! `hpred`/`vpred` predictor pairing (`vpred[row & 1][col]` seeds
//! `hpred` for the first two columns, then `hpred[col & 1]` runs for
//! the rest of the row). No `original_source` file documents NX3000's
//! table layout or NX1/SRW v2's group schemes beyond spec text; those
//! three are reconstructed from the specification's prose alone (see
//! DESIGN.md).

use crate::bitpump::{BitPump, BitPumpMsb, BitPumpMsb32};
use crate::buffer::ByteBufferView;
use crate::huffman::extend;
use crate::image::RawImage;
use crate::{Error, Result};

/// `(encLen, diffLen)` per table row, in the fixed order the original
/// expands into the 1024-entry fast table.
const TAB: [(u8, u8); 14] = [
    (3, 4),
    (3, 7),
    (2, 6),
    (2, 5),
    (4, 3),
    (6, 0),
    (7, 9),
    (8, 10),
    (9, 11),
    (10, 12),
    (10, 13),
    (5, 1),
    (4, 8),
    (4, 2),
];

struct EncTable {
    enc_len: [u8; 1024],
    diff_len: [u8; 1024],
}

fn build_table() -> EncTable {
    let mut enc_len = [0u8; 1024];
    let mut diff_len = [0u8; 1024];
    let mut n = 0usize;
    for &(el, dl) in TAB.iter() {
        let count = 1024 >> el;
        for _ in 0..count {
            enc_len[n] = el;
            diff_len[n] = dl;
            n += 1;
        }
    }
    EncTable { enc_len, diff_len }
}

fn samsung_diff(pump: &mut BitPumpMsb, tbl: &EncTable) -> Result<i32> {
    pump.fill(23);
    let c = pump.peek_bits_no_fill(10) as usize;
    pump.skip_bits_no_fill(tbl.enc_len[c] as u32);
    let len = tbl.diff_len[c] as u32;
    if len == 0 {
        return Ok(0);
    }
    let diff = pump.get_bits(len) as i32;
    Ok(extend(diff, len))
}

/// Shared core for v1 and NX3000: both use a 1024-entry variable-length
/// table and the same horizontal/vertical predictor pairing, differing
/// only (per the camera's actual bitstream) in the table's row order --
/// which no available source documents for NX3000, so this reuses v1's
/// table as the closest grounded approximation.
fn decompress_table_driven(image: &mut RawImage, data: &ByteBufferView, bits: u32) -> Result<()> {
    let width = image.width();
    let height = image.height();
    if width == 0 || height == 0 || width > 5664 || height > 3714 {
        return Err(Error::DecodeError(format!(
            "unexpected Samsung image dimensions: ({width}; {height})"
        )));
    }
    let tbl = build_table();
    let stride = image.row_stride();
    let mut pump = BitPumpMsb::new(data);
    let out = image.data16_mut().ok_or(Error::WrongType)?;

    // `vpred`/`hpred` are 16-bit and wrap on overflow in the original
    // (`std::array<uint16_t, ...>`), so a negative diff wraps into a
    // large unsigned value rather than going negative.
    let mut vpred = [[0u16; 2]; 2];
    for row in 0..height as usize {
        let mut hpred = [0u16; 2];
        for col in 0..width as usize {
            let diff = samsung_diff(&mut pump, &tbl)?;
            if col < 2 {
                vpred[row & 1][col] = vpred[row & 1][col].wrapping_add(diff as u16);
                hpred[col] = vpred[row & 1][col];
            } else {
                hpred[col & 1] = hpred[col & 1].wrapping_add(diff as u16);
            }
            let v = hpred[col & 1];
            if v >> bits != 0 {
                return Err(Error::DecodeError(format!("decoded value out of bounds at {col}:{row}")));
            }
            out[row * stride + col] = v;
        }
    }
    Ok(())
}

/// Samsung NX v1 (12 bpp).
pub fn decompress_v1(image: &mut RawImage, data: &ByteBufferView, bits: u32) -> Result<()> {
    decompress_table_driven(image, data, bits)
}

/// Samsung NX3000: table-driven scheme identical in structure to v1.
pub fn decompress_nx3000(image: &mut RawImage, data: &ByteBufferView, bits: u32) -> Result<()> {
    decompress_table_driven(image, data, bits)
}

/// Samsung NX1: reference-line prediction over an MSB32 bit pump.
/// Per 16-pixel group: a direction bit selects whether this group
/// predicts from the line one row above (`up`) or continues leftward
/// (`left`); a running pair of per-parity length tables supplies the
/// bit-length for each pixel's difference.
pub fn decompress_nx1(image: &mut RawImage, data: &ByteBufferView) -> Result<()> {
    const GROUP: usize = 16;
    let width = image.width() as usize;
    let height = image.height() as usize;
    if width == 0 || height == 0 || width % GROUP != 0 {
        return Err(Error::DecodeError(format!(
            "unexpected Samsung NX1 image dimensions: ({width}; {height})"
        )));
    }
    let stride = image.row_stride();
    let mut pump = BitPumpMsb32::new(data);
    let out = image.data16_mut().ok_or(Error::WrongType)?;

    let mut len_table = [7u32, 7u32];
    for row in 0..height {
        let mut left_pred = 0i32;
        for group_start in (0..width).step_by(GROUP) {
            let up_direction = pump.get_bits(1) != 0;
            for i in 0..GROUP {
                let col = group_start + i;
                let parity = i & 1;
                let len = len_table[parity].clamp(0, 16);
                let raw = pump.get_bits(len) as i32;
                let diff = extend(raw, len);

                let pred = if up_direction && row > 0 {
                    out[(row - 1) * stride + col] as i32
                } else {
                    left_pred
                };
                let v = (pred + diff).clamp(0, 4095);
                out[row * stride + col] = v as u16;
                left_pred = v;

                len_table[parity] = ((len_table[parity] as i32) + diff.signum()).clamp(0, 16) as u32;
            }
        }
    }
    Ok(())
}

/// Samsung SRW v2 (NX300+): 16-column groups, each with a direction bit
/// and four 2-bit mode flags selecting whether each of four
/// length-tokens carries over, increments, decrements, or is freshly
/// read as 4 bits, followed by four diffs applied upward or leftward.
/// The red/blue CFA swap this format requires is left to the caller
/// (CFA geometry is outside this module's remit).
pub fn decompress_srw_v2(image: &mut RawImage, data: &ByteBufferView) -> Result<()> {
    const GROUP: usize = 16;
    const SUBGROUP: usize = 4;
    let width = image.width() as usize;
    let height = image.height() as usize;
    if width == 0 || height == 0 || width % GROUP != 0 {
        return Err(Error::DecodeError(format!(
            "unexpected Samsung SRW v2 image dimensions: ({width}; {height})"
        )));
    }
    let stride = image.row_stride();
    let mut pump = BitPumpMsb32::new(data);
    let out = image.data16_mut().ok_or(Error::WrongType)?;

    let mut lens = [7u32; 4];
    for row in 0..height {
        let _row_offset = pump.get_bits(16);
        for group_start in (0..width).step_by(GROUP) {
            let up_direction = pump.get_bits(1) != 0;
            for (sub, len) in lens.iter_mut().enumerate().take(SUBGROUP) {
                let mode = pump.get_bits(2);
                *len = match mode {
                    0 => *len,
                    1 => (*len + 1).min(16),
                    2 => len.saturating_sub(1),
                    _ => pump.get_bits(4),
                };
                let base = group_start + sub * SUBGROUP;
                for j in 0..SUBGROUP {
                    let col = base + j;
                    if col >= width {
                        continue;
                    }
                    let raw = pump.get_bits(*len) as i32;
                    let diff = extend(raw, *len);
                    let pred = if up_direction && row > 0 {
                        out[(row - 1) * stride + col] as i32
                    } else if col > 0 {
                        out[row * stride + col - 1] as i32
                    } else {
                        0
                    };
                    out[row * stride + col] = (pred + diff).clamp(0, 4095) as u16;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::buffer::Endian;

    #[test]
    fn test_table_expansion_covers_all_1024_slots() {
        let tbl = build_table();
        // Every slot must have been written by some table row; encLen=6
        // row has diffLen=0 which is the legitimate "no difference" case.
        assert!(tbl.enc_len.contains(&6));
        assert_eq!(tbl.enc_len.len(), 1024);
    }

    #[test]
    fn test_v1_all_zero_stream_rejects_out_of_bounds_value() {
        // An all-zero bitstream selects the first table row (encLen=3,
        // diffLen=4); the 4 zero diff bits sign-extend to -15, which
        // wraps to a 16-bit value outside the 12-bit range and is
        // rejected exactly as the original's `out(row,col) >> bits`
        // check does.
        let mut image = RawImage::new_u16(4, 2, 1);
        let data = vec![0u8; 64];
        let view = ByteBufferView::new(&data, Endian::Big);
        assert!(decompress_v1(&mut image, &view, 12).is_err());
    }

    #[test]
    fn test_v1_selects_zero_diff_table_row() {
        // Table row 5 (encLen=6, diffLen=0, "no difference") spans
        // indices [832, 848) of the 1024-entry table; 832 as a 10-bit
        // MSB-first pattern is 11_0100_0000, placed at the start of the
        // big-endian bitstream. A 1x1 image means only one code is ever
        // decoded, so the don't-care tail bits can stay zero.
        let mut image = RawImage::new_u16(1, 1, 1);
        let bits: u16 = 832 << 6; // left-justify the 10-bit code in 16 bits
        let mut data = vec![0u8; 64];
        data[0] = (bits >> 8) as u8;
        data[1] = (bits & 0xff) as u8;
        let view = ByteBufferView::new(&data, Endian::Big);
        decompress_v1(&mut image, &view, 12).unwrap();
        assert_eq!(image.data16().unwrap()[0], 0);
    }

    #[test]
    fn test_nx1_rejects_non_multiple_of_16_width() {
        let mut image = RawImage::new_u16(10, 4, 1);
        let data = vec![0u8; 256];
        let view = ByteBufferView::new(&data, Endian::Big);
        assert!(decompress_nx1(&mut image, &view).is_err());
    }

    #[test]
    fn test_srw_v2_all_zero_stream_decodes_to_zero() {
        let mut image = RawImage::new_u16(16, 2, 1);
        let data = vec![0u8; 256];
        let view = ByteBufferView::new(&data, Endian::Big);
        decompress_srw_v2(&mut image, &view).unwrap();
        assert!(image.data16().unwrap().iter().all(|&v| v == 0));
    }
}
