/*
 * rawspeed - tile.rs
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

//! Multi-tile dispatch (spec 4.I): splits a frame into independent
//! slices/tiles (DNG tiles, Cr2 slices), decodes them in parallel via
//! rayon, and collates per-tile errors under a mutex.
//!
//! Grounded on the teacher's `decompress/tiled.rs` (`par_iter()` over
//! tile data), with the gap spec 4.I/§5 requires filled in: the
//! teacher's retrieved snapshot swallows per-tile failures with `.ok()`;
//! this collects them into the image's error list instead.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

use rayon::prelude::*;

use crate::image::Rect;

/// One independent unit of work for the dispatcher: a destination
/// rectangle plus the byte range of its compressed data.
#[derive(Debug, Clone, Copy)]
pub struct TileDescriptor {
    pub rect: Rect,
    pub byte_offset: usize,
    pub byte_count: usize,
}

/// Run `decode_one` over every tile in parallel (rayon's work-stealing
/// pool, sized to hardware parallelism per spec §5). Tile rectangles are
/// assumed disjoint, so each decode writes into disjoint output regions.
/// Returns the stringified errors of every tile that failed; a panic
/// inside a tile is caught and recorded as "Caught exception." without
/// unwinding past the dispatcher, matching spec 4.I/§7's fatal-vs-
/// per-tile error policy.
pub fn dispatch<F>(tiles: &[TileDescriptor], decode_one: F) -> Vec<String>
where
    F: Fn(&TileDescriptor) -> crate::Result<()> + Sync,
{
    let errors: Mutex<Vec<String>> = Mutex::new(Vec::new());
    tiles.par_iter().for_each(|tile| {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| decode_one(tile)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => errors.lock().unwrap().push(e.to_string()),
            Err(_) => errors.lock().unwrap().push("Caught exception.".to_string()),
        }
    });
    errors.into_inner().unwrap()
}

/// Verify tile rectangles are pairwise disjoint, as the dispatcher's
/// ordering guarantee (spec §5) requires before writes are assumed
/// race-free.
pub fn rects_disjoint(tiles: &[TileDescriptor]) -> bool {
    for (i, a) in tiles.iter().enumerate() {
        for b in &tiles[i + 1..] {
            let ax2 = a.rect.x + a.rect.width;
            let ay2 = a.rect.y + a.rect.height;
            let bx2 = b.rect.x + b.rect.width;
            let by2 = b.rect.y + b.rect.height;
            let overlap = a.rect.x < bx2 && b.rect.x < ax2 && a.rect.y < by2 && b.rect.y < ay2;
            if overlap {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tile(x: u32, y: u32, w: u32, h: u32) -> TileDescriptor {
        TileDescriptor {
            rect: Rect {
                x,
                y,
                width: w,
                height: h,
            },
            byte_offset: 0,
            byte_count: 0,
        }
    }

    #[test]
    fn test_dispatch_collects_errors() {
        let tiles = vec![tile(0, 0, 2, 2), tile(2, 0, 2, 2), tile(4, 0, 2, 2)];
        let errors = dispatch(&tiles, |t| {
            if t.rect.x == 2 {
                Err(crate::Error::DecodeError("bad tile".into()))
            } else {
                Ok(())
            }
        });
        assert_eq!(errors, vec!["decode error: bad tile".to_string()]);
    }

    #[test]
    fn test_dispatch_runs_all_tiles() {
        let tiles: Vec<_> = (0..8).map(|i| tile(i * 2, 0, 2, 2)).collect();
        let count = AtomicUsize::new(0);
        let errors = dispatch(&tiles, |_| {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(errors.is_empty());
        assert_eq!(count.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_disjoint_check() {
        let ok = vec![tile(0, 0, 2, 2), tile(2, 0, 2, 2)];
        assert!(rects_disjoint(&ok));
        let bad = vec![tile(0, 0, 2, 2), tile(1, 1, 2, 2)];
        assert!(!rects_disjoint(&bad));
    }
}
