/*
 * rawspeed - tiff/dir.rs
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

//! A single Image File Directory: tag -> entry map, plus child IFDs
//! reached via `SubIFDs`, `ExifIFDPointer`, maker notes, and the
//! `nextIFD` chain link.
//!
//! Grounded on the teacher's `tiff/dir.rs` (`Dir::read`,
//! `create_maker_note`'s per-vendor offset dispatch), rewritten over
//! [`crate::buffer::ByteBufferView`].

use std::collections::HashMap;

use crate::buffer::{ByteBufferView, Endian};
use crate::tiff::entry::Entry;
use crate::tiff::{tag, Ifd};
use crate::{Error, Result};

/// Maximum IFD-graph recursion depth (spec 4.D: "Bounded recursion depth
/// (≥ 6) rejects cyclic structures").
pub const MAX_RECURSION_DEPTH: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirKind {
    Root,
    SubIfd,
    Exif,
    MakerNote,
}

pub struct Dir {
    pub kind: DirKind,
    endian: Endian,
    entries: HashMap<u16, Entry>,
    children: Vec<Dir>,
    next_ifd: u32,
}

impl Ifd for Dir {
    fn endian(&self) -> Endian {
        self.endian
    }

    fn num_entries(&self) -> usize {
        self.entries.len()
    }

    fn entry(&self, tag: u16) -> Option<&Entry> {
        self.entries.get(&tag)
    }
}

/// Per-vendor maker-note offset corrections, grounded on the teacher's
/// `create_maker_note` dispatch. Spec 4.D/§6 name Nikon(+10), Olympus
/// (+12 in 4.D, +8 in §6 -- the teacher's richer per-vendor table
/// resolves the discrepancy: Olympus maker notes carry their own
/// "OLYMP\0II\x03\x00" sub-header at +8, then a nested IFD at +12
/// relative to that; both statements describe the same structure from
/// different anchor points) and Panasonic (+12).
fn maker_note_offset(make: &str) -> u32 {
    let make = make.trim();
    if make.starts_with("NIKON") {
        10
    } else if make.starts_with("OLYMPUS")
        || make.starts_with("OLYMP")
        || make.starts_with("Panasonic")
        || make.starts_with("LEICA")
    {
        12
    } else if make.starts_with("PENTAX") || make.starts_with("RICOH") {
        10
    } else {
        0
    }
}

impl Dir {
    /// Parse one IFD at `offset` within `root` (container-relative),
    /// recursing into sub-IFDs, the Exif IFD, and the maker note.
    #[allow(clippy::too_many_arguments)]
    pub fn read(
        root: &ByteBufferView,
        offset: u32,
        endian: Endian,
        kind: DirKind,
        make: &str,
        depth: u32,
    ) -> Result<Dir> {
        if depth > MAX_RECURSION_DEPTH {
            return Err(Error::ParseError("IFD recursion too deep".into()));
        }

        let mut cursor = root.peek_at(offset as usize)?;
        cursor.set_endian(endian);
        let n = cursor.read_u16()?;
        let mut entries = HashMap::with_capacity(n as usize);
        for _ in 0..n {
            let mut root_at_cursor = *root;
            root_at_cursor.set_endian(endian);
            let e = Entry::read(&mut cursor, &root_at_cursor)?;
            entries.insert(e.tag, e);
        }
        let next_ifd = cursor.read_u32().unwrap_or(0);

        let mut dir = Dir {
            kind,
            endian,
            entries,
            children: Vec::new(),
            next_ifd,
        };

        if depth < MAX_RECURSION_DEPTH {
            dir.collect_children(root, make, depth)?;
        }

        Ok(dir)
    }

    fn collect_children(&mut self, root: &ByteBufferView, make: &str, depth: u32) -> Result<()> {
        if let Some(e) = self.entries.get(&tag::SUB_IFDS) {
            let mut root_e = *root;
            root_e.set_endian(self.endian);
            let offsets = e.uint_array(&root_e, self.endian).unwrap_or_default();
            for off in offsets {
                if let Ok(child) = Dir::read(root, off, self.endian, DirKind::SubIfd, make, depth + 1)
                {
                    self.children.push(child);
                }
            }
        }
        if let Some(e) = self.entries.get(&tag::EXIF_IFD_POINTER) {
            if let Some(off) = e.as_u32(self.endian) {
                if let Ok(child) = Dir::read(root, off, self.endian, DirKind::Exif, make, depth + 1)
                {
                    self.children.push(child);
                }
            }
        }
        if let Some(e) = self.entries.get(&tag::MAKER_NOTE) {
            if let Some(base) = e.offset() {
                let mn_offset = base + maker_note_offset(make);
                if let Ok(child) =
                    Dir::read(root, mn_offset, self.endian, DirKind::MakerNote, make, depth + 1)
                {
                    self.children.push(child);
                } else if let Ok(child) =
                    Dir::read(root, base, self.endian, DirKind::MakerNote, make, depth + 1)
                {
                    // Fall back to a zero-offset maker note (no vendor
                    // sub-header) if the corrected offset didn't parse.
                    self.children.push(child);
                }
            }
        }
        Ok(())
    }

    pub fn next_ifd(&self) -> u32 {
        self.next_ifd
    }

    pub fn children(&self) -> &[Dir] {
        &self.children
    }

    /// Pre-order search for all IFDs in this subtree (inclusive) that
    /// contain `tag` (spec 4.D `getIFDsWithTag`).
    pub fn find_ifds_with_tag(&self, tag: u16) -> Vec<&Dir> {
        let mut out = Vec::new();
        if self.entries.contains_key(&tag) {
            out.push(self);
        }
        for c in &self.children {
            out.extend(c.find_ifds_with_tag(tag));
        }
        out
    }

    pub fn has_entry_recursive(&self, tag: u16) -> bool {
        self.entries.contains_key(&tag) || self.children.iter().any(|c| c.has_entry_recursive(tag))
    }

    pub fn get_entry_recursive(&self, tag: u16) -> Option<&Entry> {
        if let Some(e) = self.entries.get(&tag) {
            return Some(e);
        }
        self.children.iter().find_map(|c| c.get_entry_recursive(tag))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn build_simple_ifd(entry_count: u16, width: u16) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&entry_count.to_le_bytes());
        v.extend_from_slice(&tag::IMAGE_WIDTH.to_le_bytes());
        v.extend_from_slice(&3u16.to_le_bytes()); // SHORT
        v.extend_from_slice(&1u32.to_le_bytes()); // count
        v.extend_from_slice(&width.to_le_bytes());
        v.extend_from_slice(&[0, 0]); // padding to 4 bytes inline
        v.extend_from_slice(&0u32.to_le_bytes()); // next IFD
        v
    }

    #[test]
    fn test_parse_single_entry_ifd() {
        // spec 8, concrete scenario 2: ImageWidth = 100.
        let data = build_simple_ifd(1, 100);
        let root = ByteBufferView::new(&data, Endian::Little);
        let dir = Dir::read(&root, 0, Endian::Little, DirKind::Root, "", 0).unwrap();
        assert_eq!(dir.entry_u32(tag::IMAGE_WIDTH), Some(100));
    }

    #[test]
    fn test_cyclic_recursion_is_bounded() {
        // A SubIFDs entry pointing back at offset 0 must not loop forever.
        let mut data = Vec::new();
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&tag::SUB_IFDS.to_le_bytes());
        data.extend_from_slice(&4u16.to_le_bytes()); // LONG
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes()); // points at itself
        data.extend_from_slice(&0u32.to_le_bytes());
        let root = ByteBufferView::new(&data, Endian::Little);
        let dir = Dir::read(&root, 0, Endian::Little, DirKind::Root, "", 0);
        assert!(dir.is_ok());
    }
}
