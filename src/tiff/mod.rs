/*
 * rawspeed - tiff/mod.rs
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

//! TIFF/IFD container format (spec 4.D): a graph of Image File
//! Directories, each a tag-to-entry map with child IFDs from sub-IFD and
//! maker-note links.

pub mod container;
pub mod dir;
pub mod entry;

pub use container::Container;
pub use dir::Dir;
pub use entry::{Entry, EntryType};

/// Well-known tags consulted while walking the IFD graph.
pub mod tag {
    pub const IMAGE_WIDTH: u16 = 0x0100;
    pub const IMAGE_LENGTH: u16 = 0x0101;
    pub const COMPRESSION: u16 = 0x0103;
    pub const MAKE: u16 = 0x010f;
    pub const MODEL: u16 = 0x0110;
    pub const STRIP_OFFSETS: u16 = 0x0111;
    pub const STRIP_BYTE_COUNTS: u16 = 0x0117;
    pub const SUB_IFDS: u16 = 0x014a;
    pub const EXIF_IFD_POINTER: u16 = 0x8769;
    pub const MAKER_NOTE: u16 = 0x927c;
    pub const DNG_VERSION: u16 = 0xc612;
    pub const TILE_WIDTH: u16 = 0x0142;
    pub const TILE_LENGTH: u16 = 0x0143;
    pub const TILE_OFFSETS: u16 = 0x0144;
    pub const TILE_BYTE_COUNTS: u16 = 0x0145;
}

/// Trait implemented by [`dir::Dir`] so higher layers (factory,
/// decoders) can query tag values without depending on the concrete
/// container type.
pub trait Ifd {
    fn endian(&self) -> crate::buffer::Endian;
    fn num_entries(&self) -> usize;
    fn entry(&self, tag: u16) -> Option<&Entry>;

    fn entry_u32(&self, tag: u16) -> Option<u32> {
        self.entry(tag).and_then(|e| e.as_u32(self.endian()))
    }

    fn entry_str(&self, tag: u16) -> Option<String> {
        self.entry(tag).and_then(|e| e.as_ascii())
    }
}

/// Magic-header-detected variants of the TIFF container. ORF (Olympus)
/// uses a non-standard magic number but the same IFD shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffVariant {
    Standard,
    Orf,
}
