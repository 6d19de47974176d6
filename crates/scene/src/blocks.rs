use flipstage_common::Transform;
use flipstage_map::{IndexSet, MapChipField, MapChipType};
use flipstage_render::{ModelHandle, Renderer, ViewProjection};

/// Per-cell block transforms, one optional slot per map cell.
///
/// A slot is `Some` exactly when its cell is solid after the last [`sync`](Self::sync).
#[derive(Debug, Clone, Default)]
pub struct BlockTransforms {
    width: u32,
    height: u32,
    slots: Vec<Option<Transform>>,
}

impl BlockTransforms {
    pub fn from_map(map: &MapChipField) -> Self {
        let mut blocks = Self::default();
        blocks.sync(map);
        blocks
    }

    /// Rebuild slots from the map. Existing transforms are reused where a cell
    /// stays solid; blank cells drop theirs.
    pub fn sync(&mut self, map: &MapChipField) {
        if self.width != map.width() || self.height != map.height() {
            self.width = map.width();
            self.height = map.height();
            self.slots = vec![None; (self.width * self.height) as usize];
        }

        for (index, tile) in map.iter() {
            let i = self.slot(index);
            if tile.is_solid() {
                let transform = self.slots[i].get_or_insert_with(Transform::default);
                transform.translation = map.world_position_of(index.x, index.y);
                transform.update_matrix();
            } else {
                self.slots[i] = None;
            }
        }
        tracing::trace!(count = self.len(), "block transforms synced");
    }

    /// Recompute every world matrix from its components.
    pub fn refresh(&mut self) {
        for transform in self.slots.iter_mut().flatten() {
            transform.update_matrix();
        }
    }

    pub fn get(&self, index: IndexSet) -> Option<&Transform> {
        if index.x >= self.width || index.y >= self.height {
            return None;
        }
        self.slots[self.slot(index)].as_ref()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (IndexSet, &Transform)> + '_ {
        let width = self.width;
        self.slots.iter().enumerate().filter_map(move |(i, slot)| {
            slot.as_ref()
                .map(|t| (IndexSet::new(i as u32 % width, i as u32 / width), t))
        })
    }

    /// Submit every block, choosing the model from the tile under it.
    pub fn draw(
        &self,
        map: &MapChipField,
        renderer: &mut impl Renderer,
        view_projection: &ViewProjection,
        block: ModelHandle,
        block2: ModelHandle,
    ) {
        for (index, transform) in self.iter() {
            let model = match map.tile_at(index.x, index.y) {
                Ok(MapChipType::Block2) => block2,
                _ => block,
            };
            renderer.draw(transform, view_projection, model);
        }
    }

    fn slot(&self, index: IndexSet) -> usize {
        (index.y * self.width + index.x) as usize
    }
}

#[cfg(test)]
mod tests {
    use flipstage_map::InvertMode;
    use flipstage_render::DrawLog;
    use glam::Vec3;

    use super::*;

    #[test]
    fn slots_follow_solid_cells() {
        let map = MapChipField::parse("1,0,2\n0,1,0\n").unwrap();
        let blocks = BlockTransforms::from_map(&map);
        assert_eq!(blocks.len(), 3);
        assert!(blocks.get(IndexSet::new(1, 0)).is_none());
        let t = blocks.get(IndexSet::new(2, 0)).unwrap();
        assert_eq!(t.world_position(), Vec3::new(2.0, 1.0, 0.0));
        assert!(blocks.get(IndexSet::new(9, 9)).is_none());
    }

    #[test]
    fn sync_after_invert_tracks_new_layout() {
        let mut map = MapChipField::parse("1,1,1\n0,0,0\n").unwrap();
        let mut blocks = BlockTransforms::from_map(&map);
        map.invert(InvertMode::Mirror);
        blocks.sync(&map);
        assert_eq!(blocks.len(), 3);
        for (index, t) in blocks.iter() {
            assert_eq!(index.y, 1);
            assert_eq!(t.world_position(), map.world_position_of(index.x, index.y));
        }
    }

    #[test]
    fn draw_picks_block2_model() {
        let map = MapChipField::parse("1,2\n").unwrap();
        let blocks = BlockTransforms::from_map(&map);
        let mut log = DrawLog::new();
        blocks.draw(&map, &mut log, &ViewProjection::default(), ModelHandle(2), ModelHandle(3));
        assert_eq!(log.count(ModelHandle(2)), 1);
        assert_eq!(log.count(ModelHandle(3)), 1);
    }
}
