/*
 * rawspeed - decoders/cr2.rs
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

//! Canon CR2 lossless-JPEG decompressor (spec 4.G): the modern,
//! LJPEG-based Canon format, as opposed to `crw`'s older Huffman codec.
//! Plain CR2 scans decode through [`LJpegEngine::decompress`] plus Cr2
//! slicing; sRaw scans additionally run the YCbCr->RGB interpolator
//! (spec 4.H) and promote the image to 3 channels.
//!
//! Grounded on spec 4.F's slicing/sub-sampling prose plus the teacher's
//! `colour.rs`; no `original_source` file was retrieved for Cr2 itself
//! (RawSpeed's `Cr2Decoder.cpp`/`Cr2Decompressor.cpp` were not part of
//! the retrieval pack), so the slice-width x3/2 rule for sRaw2 below is
//! applied exactly as spec 4.F states it.

use crate::buffer::ByteBufferView;
use crate::colour;
use crate::image::RawImage;
use crate::ljpeg::{LJpegEngine, SliceInfo};
use crate::{Error, Result};

/// Decode a plain (non-sRaw) Cr2 scan: one LJPEG plane, optionally
/// remapped through Cr2's column-of-slices layout.
pub fn decompress(image: &mut RawImage, data: &ByteBufferView, slices: SliceInfo, tiled: bool) -> Result<()> {
    let plane = LJpegEngine::decompress(data, tiled)?;
    let samples = LJpegEngine::apply_slicing(&plane, slices)?;
    let out = image.data16_mut().ok_or(Error::WrongType)?;
    if samples.len() != out.len() {
        return Err(Error::DecodeError(format!(
            "Cr2 decode produced {} samples, expected {}",
            samples.len(),
            out.len()
        )));
    }
    out.copy_from_slice(&samples);
    Ok(())
}

/// sRaw2's slice widths are expressed in Y-pair units and must be
/// scaled by 3/2 before use (spec 4.F).
pub fn sraw2_slice_width(declared: u32) -> u32 {
    declared * 3 / 2
}

/// Decode a Cr2 sRaw (sub-sampled Y+Cb+Cr) scan and promote `image` to a
/// 3-channel RGB plane. `version`/`hue`/`wb` select the per-camera
/// YCbCr->RGB formula (spec 4.H).
pub fn decompress_sraw(
    image: &mut RawImage,
    data: &ByteBufferView,
    version: u8,
    hue: i32,
    wb: [f32; 3],
) -> Result<()> {
    let mut plane = LJpegEngine::decompress_sraw(data)?;
    if plane.width as u32 != image.width() || plane.height as u32 != image.height() {
        return Err(Error::DecodeError(format!(
            "sRaw plane is {}x{}, image is {}x{}",
            plane.width,
            plane.height,
            image.width(),
            image.height()
        )));
    }
    plane.fill_missing_chroma();
    let rgb = colour::plane_to_rgb(&plane, version, hue, wb);
    image.promote_to_rgb(rgb);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::buffer::Endian;

    /// A minimal sRaw2 (H=2,V=1) LJPEG scan: one MCU, 2 Y samples + 1
    /// Cb + 1 Cr, each via a single-length-1-code all-zero-diff table,
    /// so the decoded value is just the predictor seed everywhere.
    fn build_sraw2_ljpeg() -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&[0xFF, 0xD8]); // SOI
        v.extend_from_slice(&[0xFF, 0xC3]); // SOF3
        let sof_len = 8 + 3 * 3;
        v.extend_from_slice(&(sof_len as u16).to_be_bytes());
        v.push(8); // precision
        v.extend_from_slice(&1u16.to_be_bytes()); // height: 1 MCU row
        v.extend_from_slice(&2u16.to_be_bytes()); // width: 1 MCU col * h_max(2)
        v.push(3);
        v.push(1);
        v.push(0x21); // Y: h=2, v=1
        v.push(0);
        v.push(2);
        v.push(0x11); // Cb: h=1, v=1
        v.push(0);
        v.push(3);
        v.push(0x11); // Cr: h=1, v=1
        v.push(0);

        let mut bits = [0u8; 16];
        bits[0] = 1;
        for th in 0..3u8 {
            v.extend_from_slice(&[0xFF, 0xC4]); // DHT
            let dht_len = 2 + 1 + 16 + 1;
            v.extend_from_slice(&(dht_len as u16).to_be_bytes());
            v.push(th);
            v.extend_from_slice(&bits);
            v.push(0); // huffval[0] = symbol 0 (zero diff bits)
        }

        v.extend_from_slice(&[0xFF, 0xDA]); // SOS
        let sos_len = 6 + 2 * 3;
        v.extend_from_slice(&(sos_len as u16).to_be_bytes());
        v.push(3);
        v.push(1);
        v.push(0x00); // component 1 -> DC table 0
        v.push(2);
        v.push(0x10); // component 2 -> DC table 1
        v.push(3);
        v.push(0x20); // component 3 -> DC table 2
        v.push(1); // predictor
        v.push(0);
        v.push(0);
        v.extend_from_slice(&[0u8; 4]); // scan bits, all zero
        v.extend_from_slice(&[0xFF, 0xD9]); // EOI
        v
    }

    #[test]
    fn test_sraw2_slice_width_scales_by_three_halves() {
        assert_eq!(sraw2_slice_width(4), 6);
        assert_eq!(sraw2_slice_width(100), 150);
    }

    #[test]
    fn test_decompress_sraw_promotes_image_to_rgb() {
        let data = build_sraw2_ljpeg();
        let view = ByteBufferView::new(&data, Endian::Big);
        let mut image = RawImage::new_u16(2, 1, 1);
        decompress_sraw(&mut image, &view, 1, 0, [1.0, 1.0, 1.0]).unwrap();
        assert_eq!(image.cpp(), 3);
        assert_eq!(image.data16().unwrap().len(), 6);
    }

    #[test]
    fn test_decompress_sraw_rejects_dimension_mismatch() {
        let data = build_sraw2_ljpeg();
        let view = ByteBufferView::new(&data, Endian::Big);
        // image declared at the wrong size for this scan's 2x1 plane.
        let mut image = RawImage::new_u16(4, 4, 1);
        assert!(decompress_sraw(&mut image, &view, 1, 0, [1.0, 1.0, 1.0]).is_err());
    }
}
