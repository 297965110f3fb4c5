/*
 * rawspeed - camera_db.rs
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

//! The per-camera XML metadata database interface point (spec §6),
//! explicitly out of scope for this crate (spec §1): only the seam the
//! core consumes is modeled here, grounded on the teacher's
//! `camera_ids.rs` id tables being consulted without the core embedding
//! a full camera database.

use crate::image::{CfaPattern, Rect};

/// What the core needs back from a camera database lookup, per spec §6.
#[derive(Debug, Clone)]
pub struct CameraInfo {
    pub cfa: CfaPattern,
    pub crop: Rect,
    pub black: [f32; 4],
    pub white: f32,
    pub supported: bool,
}

/// `mode` distinguishes sensor/compression variants of one camera model
/// (e.g. a DSLR's sRaw vs full-size mode).
pub trait CameraDatabase {
    fn get_camera(&self, make: &str, model: &str, mode: &str) -> Option<CameraInfo>;
}

/// A database that knows about no cameras. Used when no external
/// metadata source is wired in; decoders fall back to sane defaults
/// (declared CFA/black/white from the TIFF tags themselves) rather than
/// failing.
pub struct NullCameraDb;

impl CameraDatabase for NullCameraDb {
    fn get_camera(&self, _make: &str, _model: &str, _mode: &str) -> Option<CameraInfo> {
        None
    }
}
