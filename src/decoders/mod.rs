/*
 * rawspeed - decoders/mod.rs
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

//! Per-format entropy decompressors (spec 4.G). Each module is a small
//! state machine: constructed from an already-parsed frame/slice
//! descriptor, it writes directly into a [`crate::image::RawImage`]'s
//! pixel plane and returns [`crate::Error::DecodeError`] on mid-stream
//! corruption.

pub mod cr2;
pub mod crw;
pub mod dng;
pub mod hasselblad;
pub mod kodak;
pub mod nikon;
pub mod olympus;
pub mod panasonic;
pub mod pentax;
pub mod samsung;
pub mod sony;

/// Clamp `v` into the inclusive range of an `n`-bit unsigned value,
/// matching RawSpeed's `clampBits`.
pub fn clamp_bits(v: i32, n: u32) -> u16 {
    let max = (1i32 << n) - 1;
    v.clamp(0, max) as u16
}
