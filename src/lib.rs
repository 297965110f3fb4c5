/*
 * rawspeed - lib.rs
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

//! Camera RAW entropy decompression and container parsing.
//!
//! Decodes the compressed or packed pixel planes found in camera RAW
//! files (CR2/CRW, NEF, ARW, DNG, PEF, ORF, SRW, RW2, 3FR, ...) into a
//! uniform unpacked [`image::RawImage`]. Operates exclusively over an
//! already-provided byte buffer: no file I/O happens in this crate.

pub mod buffer;
pub mod bitpump;
pub mod huffman;
pub mod image;
pub mod tiff;
pub mod ljpeg;
pub mod colour;
pub mod tile;
pub mod camera_db;
pub mod decoders;
pub mod factory;

use std::fmt;

/// Errors produced while parsing a container or decompressing a plane.
///
/// Mirrors the three kinds from the error-handling design: `OutOfBuffer`
/// (I/O-ish, fatal to the containing tile), `ParseError` (malformed
/// container, fatal to the whole decode), `DecodeError` (mid-stream
/// corruption, recorded per-tile when one of many).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A read or seek went past the bounds of the underlying buffer.
    OutOfBuffer,
    /// Malformed TIFF, bad marker sequence, corrupt Huffman table,
    /// unsupported version.
    ParseError(String),
    /// Mid-stream corruption: bad Huffman code, predicted value out of
    /// range, truncated frame.
    DecodeError(String),
    /// A typed TIFF accessor was called on an entry of the wrong type.
    WrongType,
    /// No format selector rule matched the container.
    UnsupportedFormat,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfBuffer => write!(f, "read past end of buffer"),
            Error::ParseError(s) => write!(f, "parse error: {s}"),
            Error::DecodeError(s) => write!(f, "decode error: {s}"),
            Error::WrongType => write!(f, "wrong TIFF entry type"),
            Error::UnsupportedFormat => write!(f, "unsupported format"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

pub use image::{CfaColor, CfaPattern, Rect, RawImage};
pub use tiff::Ifd;
