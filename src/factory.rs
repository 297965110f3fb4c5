/*
 * rawspeed - factory.rs
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

//! Container / format selector (spec 4.J): from a parsed TIFF root,
//! pick the codec family a file belongs to.
//!
//! Grounded on spec 4.J's rule list directly (no single `original_source`
//! file mirrors this dispatch table -- RawSpeed scatters it across
//! `RawParser`'s chain-of-try decoders); the rule order and `Make`
//! prefixes follow the spec text verbatim.

use crate::tiff::{tag, Container, Ifd};

/// Which per-format decompressor family a container selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Dng,
    CanonCr2Crw,
    NikonNef,
    SonyArw,
    PentaxPef,
    OlympusOrf,
    SamsungSrw,
    PanasonicRw2,
    Hasselblad3fr,
    SinarSti,
    KodakLegacy,
}

const KODAK_LEGACY_MODELS: &[&str] = &["DCS Pro 14n", "DCS Pro 14nx", "DCS Pro SLR/n", "DCS Pro SLR/c"];

/// Select the format family per spec 4.J's rule order: `DNGVersion`
/// presence wins outright (rejecting DNG major versions above 1); else
/// fall back to a `Make`-prefix table consulted across every root IFD.
pub fn select_format(container: &Container) -> Option<Format> {
    if let Some(entry) = container.get_entry_recursive(tag::DNG_VERSION) {
        let major = entry
            .uint_at(container.root_view(), 0, container.endian())
            .unwrap_or(0);
        if major > 1 {
            return None;
        }
        return Some(Format::Dng);
    }

    for dir in container.directories() {
        let Some(make) = dir.entry_str(tag::MAKE) else { continue };
        let make = make.trim();
        if make.starts_with("Canon") {
            return Some(Format::CanonCr2Crw);
        }
        if make.starts_with("NIKON") {
            return Some(Format::NikonNef);
        }
        if make == "SONY " || make.starts_with("SONY") {
            return Some(Format::SonyArw);
        }
        if make.starts_with("PENTAX") || make == "RICOH IMAGING" {
            return Some(Format::PentaxPef);
        }
        if make.starts_with("OLYMPUS") {
            return Some(Format::OlympusOrf);
        }
        if make.starts_with("SAMSUNG") {
            return Some(Format::SamsungSrw);
        }
        if make.starts_with("Panasonic") {
            return Some(Format::PanasonicRw2);
        }
        if make.starts_with("Hasselblad") {
            return Some(Format::Hasselblad3fr);
        }
        if make.starts_with("Sinar AG") {
            return Some(Format::SinarSti);
        }
        if make.starts_with("Kodak") {
            if let Some(model) = dir.entry_str(tag::MODEL) {
                if KODAK_LEGACY_MODELS.iter().any(|&m| model.trim() == m) {
                    return Some(Format::KodakLegacy);
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tiff::tag;

    fn build_tiff_with_make(make: &str) -> Vec<u8> {
        let make_bytes: Vec<u8> = make.bytes().chain(std::iter::once(0)).collect();
        let inline = make_bytes.len() <= 4;
        let mut v = Vec::new();
        v.extend_from_slice(b"II");
        v.extend_from_slice(&42u16.to_le_bytes());
        v.extend_from_slice(&8u32.to_le_bytes());
        v.extend_from_slice(&1u16.to_le_bytes());
        v.extend_from_slice(&tag::MAKE.to_le_bytes());
        v.extend_from_slice(&2u16.to_le_bytes()); // ASCII
        v.extend_from_slice(&(make_bytes.len() as u32).to_le_bytes());
        if inline {
            let mut data = make_bytes.clone();
            data.resize(4, 0);
            v.extend_from_slice(&data);
        } else {
            let offset_pos = v.len();
            v.extend_from_slice(&0u32.to_le_bytes());
            let data_offset = v.len() as u32 + 4; // next_ifd field follows
            v.extend_from_slice(&0u32.to_le_bytes()); // next IFD
            let off_bytes = data_offset.to_le_bytes();
            v[offset_pos..offset_pos + 4].copy_from_slice(&off_bytes);
            v.extend_from_slice(&make_bytes);
            return v;
        }
        v.extend_from_slice(&0u32.to_le_bytes()); // next IFD
        v
    }

    #[test]
    fn test_selects_nikon() {
        let data = build_tiff_with_make("NIKON CORPORATION");
        let c = Container::parse(&data).unwrap();
        assert_eq!(select_format(&c), Some(Format::NikonNef));
    }

    #[test]
    fn test_selects_canon() {
        let data = build_tiff_with_make("Canon");
        let c = Container::parse(&data).unwrap();
        assert_eq!(select_format(&c), Some(Format::CanonCr2Crw));
    }

    #[test]
    fn test_rejects_unknown_make() {
        let data = build_tiff_with_make("Unknown Corp");
        let c = Container::parse(&data).unwrap();
        assert_eq!(select_format(&c), None);
    }
}
