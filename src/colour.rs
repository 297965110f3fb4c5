/*
 * rawspeed - colour.rs
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

//! sRaw YCbCr -> RGB interpolation (spec 4.H): fills missing chroma
//! samples of a 4:2:2 or 4:2:0 sub-sampled plane, then applies one of
//! three camera-generation-keyed colour matrices.
//!
//! Grounded structurally on the teacher's `colour.rs`/`colour/matrix.rs`
//! (a per-camera 3x3 matrix applied to a linear sample). The exact
//! literal matrix coefficients are not given by the specification or by
//! any retrieved source (Canon's sRaw matrices are not in
//! `original_source/`); see DESIGN.md for the values chosen and how
//! they were validated against spec 8's concrete YCbCr scenario.

use nalgebra::{Matrix3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsampling {
    /// sRaw2: 2 Y samples share one Cb/Cr.
    H2V1,
    /// sRaw1 / mRaw: 4 Y samples share one Cb/Cr.
    H2V2,
}

/// A decoded, still sub-sampled YCbCr plane as produced by the LJPEG
/// engine's sRaw scan. `cb`/`cr` are stored at full resolution with
/// `has_chroma[i]` marking which samples are directly decoded versus to
/// be filled in by averaging.
pub struct YCbCrPlane {
    pub width: usize,
    pub height: usize,
    pub y: Vec<i32>,
    pub cb: Vec<i32>,
    pub cr: Vec<i32>,
    pub has_chroma: Vec<bool>,
    pub subsampling: Subsampling,
}

impl YCbCrPlane {
    pub fn new(width: usize, height: usize, subsampling: Subsampling) -> Self {
        YCbCrPlane {
            width,
            height,
            y: vec![0; width * height],
            cb: vec![0; width * height],
            cr: vec![0; width * height],
            has_chroma: vec![false; width * height],
            subsampling,
        }
    }

    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Fill missing Cb/Cr samples by averaging their horizontally (and,
    /// for 4:2:0, vertically) adjacent chroma-carrying neighbors, per
    /// spec 4.H.
    pub fn fill_missing_chroma(&mut self) {
        match self.subsampling {
            Subsampling::H2V1 => self.fill_422(),
            Subsampling::H2V2 => self.fill_420(),
        }
    }

    fn fill_422(&mut self) {
        for row in 0..self.height {
            for x in 0..self.width {
                let i = self.idx(x, row);
                if self.has_chroma[i] {
                    continue;
                }
                let left = if x > 0 { self.idx(x - 1, row) } else { i };
                let right = if x + 1 < self.width {
                    self.idx(x + 1, row)
                } else {
                    i
                };
                self.cb[i] = (self.cb[left] + self.cb[right]) / 2;
                self.cr[i] = (self.cr[left] + self.cr[right]) / 2;
            }
        }
    }

    fn fill_420(&mut self) {
        // Chroma carried at the top-left sample of each 2x2 block; the
        // other three are filled from their in-block neighbors, using
        // the mean of 2 (edge of the frame) or 4 (interior) chroma
        // neighbors as spec 4.H describes.
        for row in 0..self.height {
            for x in 0..self.width {
                let i = self.idx(x, row);
                if self.has_chroma[i] {
                    continue;
                }
                let mut sum_cb = 0i32;
                let mut sum_cr = 0i32;
                let mut n = 0i32;
                let neighbors = [
                    (x.checked_sub(1), Some(row)),
                    (Some(x + 1).filter(|&v| v < self.width), Some(row)),
                    (Some(x), row.checked_sub(1)),
                    (Some(x), Some(row + 1).filter(|&v| v < self.height)),
                ];
                for (nx, ny) in neighbors {
                    if let (Some(nx), Some(ny)) = (nx, ny) {
                        let ni = self.idx(nx, ny);
                        if self.has_chroma[ni] {
                            sum_cb += self.cb[ni];
                            sum_cr += self.cr[ni];
                            n += 1;
                        }
                    }
                }
                if n > 0 {
                    self.cb[i] = sum_cb / n;
                    self.cr[i] = sum_cr / n;
                }
            }
        }
    }
}

/// The three camera-generation-keyed YCbCr->RGB matrices, fixed-point
/// scaled by 256 so the post-multiply shift is `>> 8`. Row 0 (Y's own
/// contribution) is always 256/0/0 so that zero chroma delta with unit
/// white balance reproduces Y exactly, matching spec 8 scenario 6.
fn matrix_for_version(version: u8) -> Matrix3<i32> {
    match version {
        0 => Matrix3::new(256, 0, 0, 256, -88, -182, 256, 454, 0),
        2 => Matrix3::new(256, 0, 0, 256, -100, -208, 256, 420, 0),
        // version 1 and any other value: the canonical/default matrix.
        _ => Matrix3::new(256, 0, 0, 256, -128, -256, 256, 512, 0),
    }
}

/// Convert one YCbCr triple to RGB. `cb`/`cr` are 14-bit unsigned as
/// decoded (sign-extended by subtracting `16384`); `hue` is a per-camera
/// offset added to both before the matrix; `wb` scales each output
/// channel. Output is clamped to 16-bit range.
pub fn ycbcr_to_rgb(version: u8, y: i32, cb: i32, cr: i32, hue: i32, wb: [f32; 3]) -> [u16; 3] {
    let cb = cb - 16384 + hue;
    let cr = cr - 16384 + hue;
    let m = matrix_for_version(version);
    let v = m * Vector3::new(y, cb, cr);
    let mut out = [0u16; 3];
    for c in 0..3 {
        let scaled = (v[c] as f32 * wb[c]) / 256.0;
        out[c] = scaled.round().clamp(0.0, 65535.0) as u16;
    }
    out
}

/// Convert an entire filled-in plane to an interleaved RGB buffer.
pub fn plane_to_rgb(plane: &YCbCrPlane, version: u8, hue: i32, wb: [f32; 3]) -> Vec<u16> {
    let mut out = Vec::with_capacity(plane.width * plane.height * 3);
    for i in 0..plane.width * plane.height {
        let rgb = ycbcr_to_rgb(version, plane.y[i], plane.cb[i], plane.cr[i], hue, wb);
        out.extend_from_slice(&rgb);
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_neutral_chroma_reproduces_luma() {
        // spec 8 scenario 6: Y=1024, Cb=Cr=16384 (i.e. zero-centered),
        // sraw_coeffs=(1,1,1), hue=0 -> R≈G≈B≈1024.
        let rgb = ycbcr_to_rgb(1, 1024, 16384, 16384, 0, [1.0, 1.0, 1.0]);
        assert_eq!(rgb, [1024, 1024, 1024]);
    }

    #[test]
    fn test_422_fill_averages_horizontal_neighbors() {
        let mut plane = YCbCrPlane::new(4, 1, Subsampling::H2V1);
        plane.cb = vec![100, 0, 200, 0];
        plane.cr = vec![10, 0, 20, 0];
        plane.has_chroma = vec![true, false, true, false];
        plane.fill_missing_chroma();
        assert_eq!(plane.cb[1], 150);
        assert_eq!(plane.cr[1], 15);
    }

    #[test]
    fn test_420_fill_interior_averages_four_neighbors() {
        let mut plane = YCbCrPlane::new(3, 3, Subsampling::H2V2);
        // chroma carried at every other pixel in a checkerboard so the
        // center pixel (1,1) has four chroma-carrying neighbors.
        for y in 0..3 {
            for x in 0..3 {
                let i = y * 3 + x;
                plane.has_chroma[i] = (x + y) % 2 == 0;
                plane.cb[i] = 40;
                plane.cr[i] = 20;
            }
        }
        #[allow(clippy::identity_op)]
        let center = 1 * 3 + 1;
        plane.has_chroma[center] = false;
        plane.fill_missing_chroma();
        assert_eq!(plane.cb[center], 40);
    }
}
