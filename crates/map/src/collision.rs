use flipstage_common::Aabb;
use serde::{Deserialize, Serialize};

use crate::field::{IndexSet, MapChipField};

/// Shrink applied to query boxes so that resting exactly on a face is not an overlap.
const TOUCH_EPSILON: f32 = 1e-4;

/// Direction of travel for a collision query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// A solid cell overlapped by a query box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockHit {
    pub index: IndexSet,
    /// The cell face met first when travelling in the query direction:
    /// left face for `Right`, right face for `Left`, bottom for `Up`, top for `Down`.
    pub boundary: f32,
}

impl MapChipField {
    /// Solid cells overlapped by `aabb`, nearest boundary first along `direction`.
    ///
    /// Cells beyond the grid edge are treated as blank. Only the XY extent of
    /// the box is considered.
    pub fn blocks_overlapping(&self, aabb: &Aabb, direction: Direction) -> Vec<BlockHit> {
        let min = aabb.min + TOUCH_EPSILON;
        let max = aabb.max - TOUCH_EPSILON;
        if min.x > max.x || min.y > max.y {
            return Vec::new();
        }

        // Row indices grow downward, so the top edge gives the first row.
        let (x0, y0) = self.cell_coord_of(glam::Vec3::new(min.x, max.y, 0.0));
        let (x1, y1) = self.cell_coord_of(glam::Vec3::new(max.x, min.y, 0.0));

        let mut hits = Vec::new();
        for y in y0.max(0)..=y1.min(self.height() as i64 - 1) {
            for x in x0.max(0)..=x1.min(self.width() as i64 - 1) {
                if !self.tile_or_blank(x, y).is_solid() {
                    continue;
                }
                let rect = self.rect_of(x, y);
                let boundary = match direction {
                    Direction::Right => rect.left,
                    Direction::Left => rect.right,
                    Direction::Up => rect.bottom,
                    Direction::Down => rect.top,
                };
                hits.push(BlockHit {
                    index: IndexSet::new(x as u32, y as u32),
                    boundary,
                });
            }
        }

        hits.sort_by(|a, b| a.boundary.total_cmp(&b.boundary));
        if matches!(direction, Direction::Left | Direction::Down) {
            hits.reverse();
        }
        hits
    }

    /// Nearest solid cell overlapped by `aabb` along `direction`.
    pub fn first_block(&self, aabb: &Aabb, direction: Direction) -> Option<BlockHit> {
        self.blocks_overlapping(aabb, direction).into_iter().next()
    }
}
