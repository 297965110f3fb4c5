/*
 * rawspeed - ljpeg.rs
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

//! Lossless-JPEG engine (spec 4.F): SOI/DHT/SOF3/SOS/EOI marker parsing,
//! N-component left/neighbor predictor decode, the sub-sampled Cr2 sRaw
//! scan, and the Cr2 slicing variant.
//!
//! Grounded on the teacher's `decompress/ljpeg.rs` in full: the marker
//! loop, `DecompressInfo`-shaped frame/scan state, `decode_first_row` +
//! `quick_predict`'s PSV 0-7 table, and Cr2 slicing via a
//! `(numSlices, sliceWidth, lastSliceWidth)` descriptor. The sub-sampled
//! MCU decode is built from spec 4.F's textual description, since
//! `DecompressInfo` in the teacher handles only the non-sub-sampled case.

use crate::bitpump::BitPumpJpeg;
use crate::buffer::ByteBufferView;
use crate::colour::{Subsampling, YCbCrPlane};
use crate::huffman::HuffmanTable;
use crate::{Error, Result};

const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOF3: u8 = 0xC3;
const DHT: u8 = 0xC4;
const SOS: u8 = 0xDA;
const DRI: u8 = 0xDD;
const DNL: u8 = 0xDC;
const COM: u8 = 0xFE;

fn is_app(marker: u8) -> bool {
    (0xE0..=0xEF).contains(&marker)
}

#[derive(Debug, Clone)]
pub struct ComponentInfo {
    pub id: u8,
    pub h_sampling: u8,
    pub v_sampling: u8,
    pub dc_table_idx: u8,
}

#[derive(Debug, Clone)]
pub struct FrameInfo {
    pub precision: u8,
    pub height: u16,
    pub width: u16,
    pub components: Vec<ComponentInfo>,
}

#[derive(Debug, Clone, Copy)]
pub struct ScanInfo {
    /// Predictor mode (spec's `Ss`, 0..8; 1 = "sample to the left").
    pub predictor: u8,
    /// Point transform: number of low bits stripped before encoding.
    pub point_transform: u8,
}

/// Cr2-style slice descriptor: the frame is partitioned horizontally
/// into `num_slices` vertical strips of `slice_width` pixels, with the
/// final strip `last_slice_width` wide.
#[derive(Debug, Clone, Copy)]
pub struct SliceInfo {
    pub num_slices: u32,
    pub slice_width: u32,
    pub last_slice_width: u32,
}

impl SliceInfo {
    pub fn none() -> Self {
        SliceInfo {
            num_slices: 1,
            slice_width: 0,
            last_slice_width: 0,
        }
    }

    fn width_of(&self, slice: u32) -> Result<u32> {
        let w = if slice + 1 == self.num_slices {
            self.last_slice_width
        } else {
            self.slice_width
        };
        if w == 0 {
            return Err(Error::ParseError("slice width is zero".into()));
        }
        Ok(w)
    }
}

/// PSV (predictor selection value) 0-7, per spec 4.F / the teacher's
/// `quick_predict`. 1 is the only universally-required mode.
fn predict(psv: u8, left: i32, up: i32, upper_left: i32) -> i32 {
    match psv {
        0 => 0,
        1 => left,
        2 => up,
        3 => upper_left,
        4 => left + up - upper_left,
        5 => left + ((up - upper_left) >> 1),
        6 => up + ((left - upper_left) >> 1),
        7 => (left + up) >> 1,
        _ => left,
    }
}

/// Predict the next MCU-grid value from `recon` (row-major, `mcu_w`
/// wide), seeding the first MCU with `seed` and falling back to the
/// single available neighbor along the first row/column -- the same
/// boundary handling as the non-sub-sampled scan loop, just applied at
/// MCU rather than pixel resolution.
fn chain_predict(recon: &[i32], mcu_w: u32, row: u32, col: u32, seed: i32, psv: u8) -> i32 {
    let idx = |r: u32, c: u32| -> usize { (r * mcu_w + c) as usize };
    if row == 0 && col == 0 {
        seed
    } else if row == 0 {
        recon[idx(0, col - 1)]
    } else if col == 0 {
        recon[idx(row - 1, 0)]
    } else {
        let left = recon[idx(row, col - 1)];
        let up = recon[idx(row - 1, col)];
        let upper_left = recon[idx(row - 1, col - 1)];
        predict(psv, left, up, upper_left)
    }
}

/// A decoded, not-yet-remapped lossless-JPEG plane: one `u16` sample per
/// component per pixel, in MCU (row-major) order, at the frame's own
/// (possibly width-doubled) dimensions.
pub struct DecodedPlane {
    pub width: u32,
    pub height: u32,
    pub components: u32,
    pub samples: Vec<u16>,
}

pub struct LJpegEngine;

impl LJpegEngine {
    /// Parse markers up to and including SOS, returning the frame info
    /// (with each component's `dc_table_idx` filled from SOS), the scan
    /// info, the DC Huffman tables (indexed by table id 0..4), and a
    /// [`BitPumpJpeg`]-ready view positioned at the entropy-coded data.
    fn parse_markers<'a>(
        view: &ByteBufferView<'a>,
    ) -> Result<(FrameInfo, ScanInfo, [Option<HuffmanTable>; 4], ByteBufferView<'a>)> {
        let mut cur = *view;
        let mut tables: [Option<HuffmanTable>; 4] = [None, None, None, None];
        let mut frame: Option<FrameInfo> = None;

        if cur.read_u8()? != 0xFF || cur.read_u8()? != SOI {
            return Err(Error::ParseError("missing LJPEG SOI marker".into()));
        }

        loop {
            if cur.read_u8()? != 0xFF {
                return Err(Error::ParseError("expected marker prefix 0xFF".into()));
            }
            let marker = cur.read_u8()?;
            if marker == EOI {
                return Err(Error::ParseError("EOI before SOS".into()));
            }
            if marker == SOS {
                let mut frame = frame.ok_or_else(|| Error::ParseError("SOS before SOF3".into()))?;
                let scan = Self::parse_sos(&mut cur, &mut frame)?;
                return Ok((frame, scan, tables, cur));
            }

            let seg_len = cur.read_u16()? as usize;
            let seg_end = cur.pos() + seg_len - 2;
            let mut seg = cur.peek_at(cur.pos())?;

            match marker {
                SOF3 => frame = Some(Self::parse_sof(&mut seg)?),
                DHT => Self::parse_dht(&mut seg, seg_end - cur.pos(), &mut tables)?,
                m if is_app(m) || m == COM || m == DRI || m == DNL => {}
                _ => {
                    return Err(Error::ParseError(format!(
                        "unsupported LJPEG marker {marker:#x}"
                    )))
                }
            }
            cur.seek(seg_end)?;
        }
    }

    fn parse_sof(seg: &mut ByteBufferView) -> Result<FrameInfo> {
        let precision = seg.read_u8()?;
        if !(2..=16).contains(&precision) {
            return Err(Error::ParseError("invalid LJPEG precision".into()));
        }
        let height = seg.read_u16()?;
        let width = seg.read_u16()?;
        if height == 0 || width == 0 {
            return Err(Error::ParseError("zero frame dimension".into()));
        }
        let n = seg.read_u8()?;
        if !(1..=4).contains(&n) {
            return Err(Error::ParseError("invalid component count".into()));
        }
        let mut components = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let id = seg.read_u8()?;
            let sampling = seg.read_u8()?;
            let tq = seg.read_u8()?;
            if tq != 0 {
                return Err(Error::ParseError("Tq must be 0".into()));
            }
            components.push(ComponentInfo {
                id,
                h_sampling: sampling >> 4,
                v_sampling: sampling & 0xF,
                dc_table_idx: 0,
            });
        }
        Ok(FrameInfo {
            precision,
            height,
            width,
            components,
        })
    }

    fn parse_dht(seg: &mut ByteBufferView, len: usize, tables: &mut [Option<HuffmanTable>; 4]) -> Result<()> {
        let end = seg.pos() + len;
        while seg.pos() < end {
            let tc_th = seg.read_u8()?;
            let th = (tc_th & 0x0F) as usize;
            if th >= 4 {
                return Err(Error::ParseError("Huffman table index out of range".into()));
            }
            let mut bits = [0u8; 16];
            let mut total = 0usize;
            for b in bits.iter_mut() {
                *b = seg.read_u8()?;
                total += *b as usize;
            }
            let huffval = seg.get_buffer(total)?.to_vec();
            tables[th] = Some(HuffmanTable::from_dht(&bits, &huffval)?);
        }
        Ok(())
    }

    fn parse_sos(cur: &mut ByteBufferView, frame: &mut FrameInfo) -> Result<ScanInfo> {
        let seg_len = cur.read_u16()? as usize;
        let start = cur.pos();
        let ns = cur.read_u8()?;
        if ns as usize != frame.components.len() {
            return Err(Error::ParseError("SOS component count mismatch".into()));
        }
        for _ in 0..ns {
            let selector = cur.read_u8()?;
            let tables = cur.read_u8()?;
            if let Some(c) = frame.components.iter_mut().find(|c| c.id == selector) {
                c.dc_table_idx = tables >> 4;
            }
        }
        let predictor = cur.read_u8()?;
        let _se = cur.read_u8()?;
        let ah_al = cur.read_u8()?;
        let point_transform = ah_al & 0x0F;
        cur.seek(start + seg_len - 2)?;
        Ok(ScanInfo {
            predictor,
            point_transform,
        })
    }

    /// Detect Canon's width-doubled / height-halved quirk (spec 4.F):
    /// `w * cps > 2 * h`.
    pub fn detect_width_doubling(width: u32, height: u32, cps: u32) -> bool {
        cps != 3 && width.saturating_mul(cps) > 2 * height
    }

    /// Decode a non-sub-sampled N-component scan. `tiled` selects
    /// whether the declared SOF3 width is used as-is (DNG tile case) or
    /// multiplied by `num_components` (CR2/untiled case), per spec 4.F.
    pub fn decompress(view: &ByteBufferView, tiled: bool) -> Result<DecodedPlane> {
        Self::decompress_with_options(view, tiled, false)
    }

    /// As [`Self::decompress`], additionally setting the DNG 1.0
    /// bug-compat flag (spec 4.C) on every Huffman table parsed from
    /// this scan's DHT segments.
    pub fn decompress_with_options(view: &ByteBufferView, tiled: bool, dng_bug_compat: bool) -> Result<DecodedPlane> {
        let (frame, scan, mut tables, bits_view) = Self::parse_markers(view)?;
        if dng_bug_compat {
            for t in tables.iter_mut().flatten() {
                t.set_dng_bug_compat(true);
            }
        }
        let ncomp = frame.components.len() as u32;
        let mut width = frame.width as u32;
        let height = frame.height as u32;
        if !tiled {
            width *= ncomp;
        }

        let effective_height = if Self::detect_width_doubling(width, height, ncomp) {
            height * 2
        } else {
            height
        };

        let tables: Vec<&HuffmanTable> = frame
            .components
            .iter()
            .map(|c| {
                tables[c.dc_table_idx as usize]
                    .as_ref()
                    .ok_or_else(|| Error::ParseError("missing DC Huffman table".into()))
            })
            .collect::<Result<_>>()?;

        let mut pump = BitPumpJpeg::new(&bits_view);
        let samples = Self::decode_scan(
            &mut pump,
            width,
            effective_height,
            &frame.components,
            scan,
            frame.precision as u32,
            &tables,
        )?;

        Ok(DecodedPlane {
            width,
            height: effective_height,
            components: ncomp,
            samples,
        })
    }

    /// Decode a scan of `width`x`height` MCUs. Non-sub-sampled frames
    /// (every component's sampling factor 1x1) decode one sample per
    /// component per pixel; sub-sampled frames (spec 4.F "Sub-sampled
    /// scan") are handed off to [`Self::decode_scan_subsampled`].
    fn decode_scan(
        pump: &mut BitPumpJpeg,
        width: u32,
        height: u32,
        components: &[ComponentInfo],
        scan: ScanInfo,
        precision: u32,
        tables: &[&HuffmanTable],
    ) -> Result<Vec<u16>> {
        let h_max = components.iter().map(|c| c.h_sampling.max(1) as u32).max().unwrap_or(1);
        let v_max = components.iter().map(|c| c.v_sampling.max(1) as u32).max().unwrap_or(1);
        if h_max > 1 || v_max > 1 {
            return Self::decode_scan_subsampled(pump, width, height, h_max, v_max, scan, precision, tables);
        }

        let ncomp = components.len() as u32;
        let seed = 1i32 << precision.saturating_sub(scan.point_transform as u32 + 1);
        let mut recon = vec![0i32; (width * height * ncomp) as usize];
        let mut samples = vec![0u16; recon.len()];

        let idx = |row: u32, col: u32, c: u32| -> usize { ((row * width + col) * ncomp + c) as usize };

        for row in 0..height {
            for col in 0..width {
                for c in 0..ncomp {
                    let diff = tables[c as usize].decode(pump)?;
                    let pred = if row == 0 && col == 0 {
                        seed
                    } else if row == 0 {
                        recon[idx(0, col - 1, c)]
                    } else if col == 0 {
                        recon[idx(row - 1, 0, c)]
                    } else {
                        let left = recon[idx(row, col - 1, c)];
                        let up = recon[idx(row - 1, col, c)];
                        let upper_left = recon[idx(row - 1, col - 1, c)];
                        predict(scan.predictor, left, up, upper_left)
                    };
                    let value = pred + diff;
                    recon[idx(row, col, c)] = value;
                    samples[idx(row, col, c)] = (value << scan.point_transform).clamp(0, 65535) as u16;
                }
            }
        }
        Ok(samples)
    }

    /// Decode a Cr2 sRaw scan: an `h_max`x`v_max` MCU grid where each MCU
    /// holds `h_max * v_max` Y samples followed by one shared Cb and one
    /// shared Cr sample (spec 4.F). `tables` must be `[y, cb, cr]`.
    ///
    /// Each of the Y slots and the Cb/Cr channels keeps its own
    /// left/up/upper-left predictor chain over the MCU grid, mirroring
    /// the non-sub-sampled loop above but at MCU rather than pixel
    /// resolution. The result is an interleaved `(y, cb, cr)` buffer at
    /// full (luma) resolution; Cb/Cr are only meaningful at each MCU's
    /// anchor pixel (top-left of the block) -- the caller derives the
    /// has-chroma mask from `h_max`/`v_max` and fills the rest via
    /// [`crate::colour::YCbCrPlane::fill_missing_chroma`].
    #[allow(clippy::too_many_arguments)]
    fn decode_scan_subsampled(
        pump: &mut BitPumpJpeg,
        width: u32,
        height: u32,
        h_max: u32,
        v_max: u32,
        scan: ScanInfo,
        precision: u32,
        tables: &[&HuffmanTable],
    ) -> Result<Vec<u16>> {
        if tables.len() != 3 {
            return Err(Error::ParseError(
                "sub-sampled scan requires 3 components (Y, Cb, Cr)".into(),
            ));
        }
        if width % h_max != 0 || height % v_max != 0 {
            return Err(Error::ParseError(
                "frame dimensions are not a multiple of the MCU size".into(),
            ));
        }
        let mcu_w = width / h_max;
        let mcu_h = height / v_max;
        let y_per_mcu = (h_max * v_max) as usize;
        let seed = 1i32 << precision.saturating_sub(scan.point_transform as u32 + 1);

        let mcu_idx = |row: u32, col: u32| -> usize { (row * mcu_w + col) as usize };
        let mut y_recon = vec![vec![0i32; (mcu_w * mcu_h) as usize]; y_per_mcu];
        let mut cb_recon = vec![0i32; (mcu_w * mcu_h) as usize];
        let mut cr_recon = vec![0i32; (mcu_w * mcu_h) as usize];

        let mut out = vec![0u16; (width * height * 3) as usize];
        let out_idx = |x: u32, y: u32, c: u32| -> usize { ((y * width + x) * 3 + c) as usize };

        for row in 0..mcu_h {
            for col in 0..mcu_w {
                let i = mcu_idx(row, col);
                for (slot, recon) in y_recon.iter_mut().enumerate() {
                    let diff = tables[0].decode(pump)?;
                    let pred = chain_predict(recon, mcu_w, row, col, seed, scan.predictor);
                    let value = pred + diff;
                    recon[i] = value;
                    let dx = slot as u32 % h_max;
                    let dy = slot as u32 / h_max;
                    let px = col * h_max + dx;
                    let py = row * v_max + dy;
                    out[out_idx(px, py, 0)] = (value << scan.point_transform).clamp(0, 65535) as u16;
                }

                let cb_diff = tables[1].decode(pump)?;
                let cb_pred = chain_predict(&cb_recon, mcu_w, row, col, seed, scan.predictor);
                let cb_value = cb_pred + cb_diff;
                cb_recon[i] = cb_value;
                out[out_idx(col * h_max, row * v_max, 1)] = (cb_value << scan.point_transform).clamp(0, 65535) as u16;

                let cr_diff = tables[2].decode(pump)?;
                let cr_pred = chain_predict(&cr_recon, mcu_w, row, col, seed, scan.predictor);
                let cr_value = cr_pred + cr_diff;
                cr_recon[i] = cr_value;
                out[out_idx(col * h_max, row * v_max, 2)] = (cr_value << scan.point_transform).clamp(0, 65535) as u16;
            }
        }
        Ok(out)
    }

    /// Decode a Cr2 sRaw scan into a not-yet-chroma-filled
    /// [`YCbCrPlane`] (spec 4.F/4.H). Callers run
    /// [`YCbCrPlane::fill_missing_chroma`] then
    /// [`crate::colour::plane_to_rgb`] on the result.
    pub fn decompress_sraw(view: &ByteBufferView) -> Result<YCbCrPlane> {
        let (frame, scan, tables, bits_view) = Self::parse_markers(view)?;
        if frame.components.len() != 3 {
            return Err(Error::ParseError("sRaw scan requires 3 components".into()));
        }
        let h_max = frame.components.iter().map(|c| c.h_sampling.max(1) as u32).max().unwrap_or(1);
        let v_max = frame.components.iter().map(|c| c.v_sampling.max(1) as u32).max().unwrap_or(1);
        if h_max == 1 && v_max == 1 {
            return Err(Error::ParseError("scan is not sub-sampled".into()));
        }
        let subsampling = if v_max == 1 { Subsampling::H2V1 } else { Subsampling::H2V2 };

        let width = frame.width as u32;
        let height = frame.height as u32;
        let table_refs: Vec<&HuffmanTable> = frame
            .components
            .iter()
            .map(|c| {
                tables[c.dc_table_idx as usize]
                    .as_ref()
                    .ok_or_else(|| Error::ParseError("missing DC Huffman table".into()))
            })
            .collect::<Result<_>>()?;

        let mut pump = BitPumpJpeg::new(&bits_view);
        let samples = Self::decode_scan(
            &mut pump,
            width,
            height,
            &frame.components,
            scan,
            frame.precision as u32,
            &table_refs,
        )?;

        let mut plane = YCbCrPlane::new(width as usize, height as usize, subsampling);
        for row in 0..height {
            for col in 0..width {
                let i = (row * width + col) as usize;
                plane.y[i] = samples[i * 3] as i32;
                if col % h_max == 0 && row % v_max == 0 {
                    plane.cb[i] = samples[i * 3 + 1] as i32;
                    plane.cr[i] = samples[i * 3 + 2] as i32;
                    plane.has_chroma[i] = true;
                }
            }
        }
        Ok(plane)
    }

    /// Remap a decoded plane into Cr2's column-of-slices output layout
    /// (spec 4.F "Cr2 slicing variant").
    pub fn apply_slicing(plane: &DecodedPlane, slices: SliceInfo) -> Result<Vec<u16>> {
        if slices.num_slices <= 1 {
            return Ok(plane.samples.clone());
        }
        let ncomp = plane.components;
        let total_width: u32 = (0..slices.num_slices)
            .map(|s| slices.width_of(s))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .sum();
        let height = plane.height;
        let mut out = vec![0u16; (total_width * height * ncomp) as usize];

        let mut src_col = 0u32;
        let mut dst_col_base = 0u32;
        for s in 0..slices.num_slices {
            let w = slices.width_of(s)?;
            for row in 0..height {
                for x in 0..w {
                    for c in 0..ncomp {
                        let src_idx = ((row * plane.width + src_col + x) * ncomp + c) as usize;
                        let dst_idx = ((row * total_width + dst_col_base + x) * ncomp + c) as usize;
                        if src_idx < plane.samples.len() && dst_idx < out.len() {
                            out[dst_idx] = plane.samples[src_idx];
                        }
                    }
                }
            }
            src_col += w;
            dst_col_base += w;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::buffer::Endian;

    #[allow(clippy::too_many_arguments)]
    fn build_ljpeg(
        precision: u8,
        width: u16,
        height: u16,
        ncomp: u8,
        predictor: u8,
        bits: [u8; 16],
        huffval: Vec<u8>,
        scan_bits: &[u8],
    ) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&[0xFF, SOI]);
        v.extend_from_slice(&[0xFF, SOF3]);
        let sof_len = 8 + 3 * ncomp as usize;
        v.extend_from_slice(&(sof_len as u16).to_be_bytes());
        v.push(precision);
        v.extend_from_slice(&height.to_be_bytes());
        v.extend_from_slice(&width.to_be_bytes());
        v.push(ncomp);
        for i in 0..ncomp {
            v.push(i + 1);
            v.push(0x11);
            v.push(0);
        }
        v.extend_from_slice(&[0xFF, DHT]);
        let dht_len = 2 + 1 + 16 + huffval.len();
        v.extend_from_slice(&(dht_len as u16).to_be_bytes());
        v.push(0x00);
        v.extend_from_slice(&bits);
        v.extend_from_slice(&huffval);
        v.extend_from_slice(&[0xFF, SOS]);
        let sos_len = 6 + 2 * ncomp as usize;
        v.extend_from_slice(&(sos_len as u16).to_be_bytes());
        v.push(ncomp);
        for i in 0..ncomp {
            v.push(i + 1);
            v.push(0x00);
        }
        v.push(predictor);
        v.push(0);
        v.push(0);
        v.extend_from_slice(scan_bits);
        v.extend_from_slice(&[0xFF, EOI]);
        v
    }

    #[test]
    fn test_detect_width_doubling() {
        assert!(LJpegEngine::detect_width_doubling(100, 10, 1));
        assert!(!LJpegEngine::detect_width_doubling(100, 10, 3));
        assert!(!LJpegEngine::detect_width_doubling(20, 10, 1));
    }

    #[test]
    fn test_parse_sof_and_sos() {
        let mut bits = [0u8; 16];
        bits[0] = 1;
        let data = build_ljpeg(8, 2, 2, 1, 1, bits, vec![0], &[0u8; 4]);
        let view = ByteBufferView::new(&data, Endian::Big);
        let (frame, scan, tables, _) = LJpegEngine::parse_markers(&view).unwrap();
        assert_eq!(frame.width, 2);
        assert_eq!(frame.height, 2);
        assert_eq!(scan.predictor, 1);
        assert!(tables[0].is_some());
        assert_eq!(frame.components[0].dc_table_idx, 0);
    }

    #[test]
    fn test_decode_all_zero_diff_reproduces_seed_on_first_pixel() {
        // Single code of length 1 -> symbol 0 (zero diff) for every
        // sample: reconstructed values are constant across the image,
        // equal to the first-pixel predictor seed.
        let mut bits = [0u8; 16];
        bits[0] = 1;
        let data = build_ljpeg(8, 2, 2, 1, 1, bits, vec![0], &[0u8; 4]);
        let view = ByteBufferView::new(&data, Endian::Big);
        let plane = LJpegEngine::decompress(&view, true).unwrap();
        let seed = 1u16 << (8 - 1);
        assert!(plane.samples.iter().all(|&v| v == seed));
    }

    /// A sub-sampled (H2V2 / sRaw1) scan over a 2-MCU-wide, 1-MCU-tall
    /// grid: 4 Y samples + Cb + Cr per MCU, every table a single
    /// length-1 zero-diff code, so every reconstructed sample equals the
    /// predictor seed -- this exercises the MCU scatter/anchor placement
    /// across more than one MCU rather than predictor arithmetic.
    fn build_sraw_h2v2_two_mcus() -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&[0xFF, SOI]);
        v.extend_from_slice(&[0xFF, SOF3]);
        let sof_len = 8 + 3 * 3;
        v.extend_from_slice(&(sof_len as u16).to_be_bytes());
        v.push(8);
        v.extend_from_slice(&2u16.to_be_bytes()); // height: 1 MCU row * v_max(2)
        v.extend_from_slice(&4u16.to_be_bytes()); // width: 2 MCU cols * h_max(2)
        v.push(3);
        v.push(1);
        v.push(0x22); // Y: h=2, v=2
        v.push(0);
        v.push(2);
        v.push(0x11); // Cb
        v.push(0);
        v.push(3);
        v.push(0x11); // Cr
        v.push(0);

        let mut bits = [0u8; 16];
        bits[0] = 1;
        for th in 0..3u8 {
            v.extend_from_slice(&[0xFF, DHT]);
            let dht_len = 2 + 1 + 16 + 1;
            v.extend_from_slice(&(dht_len as u16).to_be_bytes());
            v.push(th);
            v.extend_from_slice(&bits);
            v.push(0);
        }

        v.extend_from_slice(&[0xFF, SOS]);
        let sos_len = 6 + 2 * 3;
        v.extend_from_slice(&(sos_len as u16).to_be_bytes());
        v.push(3);
        v.push(1);
        v.push(0x00);
        v.push(2);
        v.push(0x10);
        v.push(3);
        v.push(0x20);
        v.push(1);
        v.push(0);
        v.push(0);
        v.extend_from_slice(&[0u8; 8]);
        v.extend_from_slice(&[0xFF, EOI]);
        v
    }

    #[test]
    fn test_decompress_sraw_scatters_y_and_anchors_chroma_per_mcu() {
        let data = build_sraw_h2v2_two_mcus();
        let view = ByteBufferView::new(&data, Endian::Big);
        let plane = LJpegEngine::decompress_sraw(&view).unwrap();
        assert_eq!(plane.width, 4);
        assert_eq!(plane.height, 2);
        assert_eq!(plane.subsampling, Subsampling::H2V2);
        // Every Y sample decodes to the same seed (all-zero-diff stream).
        let seed = 1i32 << (8 - 1);
        assert!(plane.y.iter().all(|&v| v == seed));
        // Chroma is anchored only at each 2x2 block's top-left pixel.
        let expected_anchors: Vec<bool> = (0..2)
            .flat_map(|row| (0..4).map(move |col| (row, col)))
            .map(|(row, col)| col % 2 == 0 && row % 2 == 0)
            .collect();
        assert_eq!(plane.has_chroma, expected_anchors);
    }

    #[test]
    fn test_slice_passthrough_matches_unsliced() {
        let plane = DecodedPlane {
            width: 4,
            height: 2,
            components: 1,
            samples: (0..8).map(|v| v as u16).collect(),
        };
        // spec 8 scenario 5: numSlices=1 must reproduce the unsliced buffer.
        let out = LJpegEngine::apply_slicing(&plane, SliceInfo::none()).unwrap();
        assert_eq!(out, plane.samples);
    }

    #[test]
    fn test_two_slice_remap() {
        let plane = DecodedPlane {
            width: 4,
            height: 1,
            components: 1,
            samples: vec![1, 2, 3, 4],
        };
        let slices = SliceInfo {
            num_slices: 2,
            slice_width: 2,
            last_slice_width: 2,
        };
        let out = LJpegEngine::apply_slicing(&plane, slices).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4]);
    }
}
