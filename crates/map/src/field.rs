use std::fmt;
use std::path::Path;

use flipstage_common::Rect;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::layout::parse_layout;

/// Errors from loading or addressing the map grid.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed layout at line {line}: {reason}")]
    Format { line: usize, reason: String },
    #[error("unknown tile code {code} at line {line}, column {column}")]
    UnknownCode { line: usize, column: usize, code: i64 },
    #[error("layout contains no rows")]
    Empty,
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfRange {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
}

/// Tile type stored in each grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MapChipType {
    #[default]
    Blank,
    Block,
    /// Alternate solid block. Survives inversion unchanged.
    Block2,
}

impl MapChipType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Blank),
            1 => Some(Self::Block),
            2 => Some(Self::Block2),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Blank => 0,
            Self::Block => 1,
            Self::Block2 => 2,
        }
    }

    pub fn is_solid(self) -> bool {
        !matches!(self, Self::Blank)
    }

    /// Blank and block trade places; `Block2` maps to itself.
    pub fn swapped(self) -> Self {
        match self {
            Self::Blank => Self::Block,
            Self::Block => Self::Blank,
            Self::Block2 => Self::Block2,
        }
    }
}

/// Grid coordinate: `x` is the column, `y` the row (row 0 is the top of the level).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSet {
    pub x: u32,
    pub y: u32,
}

impl IndexSet {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// How [`MapChipField::invert`] relabels the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvertMode {
    /// Point-mirror every cell through the grid centre and swap blank/block.
    #[default]
    MirrorSwap,
    /// Point-mirror every cell, keep tile types.
    Mirror,
    /// Swap blank/block in place without moving any cell.
    SwapInPlace,
}

impl InvertMode {
    /// Whether cells (and the entities standing in them) move to the mirrored index.
    pub fn mirrors(self) -> bool {
        !matches!(self, Self::SwapInPlace)
    }
}

/// Rectangular grid of map chips with a fixed cell size.
///
/// Cell `(x, y)` is centred on `origin + (x * cell_width, -y * cell_height, 0)`.
/// The default origin puts the bottom row at `y = 0` in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct MapChipField {
    width: u32,
    height: u32,
    /// Row-major, row 0 first.
    cells: Vec<MapChipType>,
    cell_size: Vec2,
    origin: Vec3,
}

impl MapChipField {
    pub const DEFAULT_CELL_SIZE: Vec2 = Vec2::ONE;

    /// Build a field from parsed rows with unit cells and the default origin.
    pub fn from_rows(rows: Vec<Vec<MapChipType>>) -> Result<Self, MapError> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).ok_or(MapError::Empty)?;
        if width == 0 {
            return Err(MapError::Empty);
        }
        if let Some(bad) = rows.iter().position(|r| r.len() != width) {
            return Err(MapError::Format {
                line: bad + 1,
                reason: format!("expected {width} columns, found {}", rows[bad].len()),
            });
        }

        let mut field = Self {
            width: width as u32,
            height: height as u32,
            cells: rows.into_iter().flatten().collect(),
            cell_size: Self::DEFAULT_CELL_SIZE,
            origin: Vec3::ZERO,
        };
        field.origin = field.default_origin();
        Ok(field)
    }

    /// Parse a text layout. See [`crate::layout`] for the accepted format.
    pub fn parse(text: &str) -> Result<Self, MapError> {
        let field = Self::from_rows(parse_layout(text)?)?;
        tracing::debug!(
            width = field.width,
            height = field.height,
            "map layout parsed"
        );
        Ok(field)
    }

    /// Read and parse a layout file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let field = Self::parse(&text)?;
        tracing::info!(path = %path.display(), "map loaded");
        Ok(field)
    }

    /// Replace the cell size and origin. `None` keeps the bottom row at `y = 0`.
    pub fn with_geometry(mut self, cell_size: Vec2, origin: Option<Vec3>) -> Self {
        assert!(
            cell_size.x > 0.0 && cell_size.y > 0.0,
            "cell size must be positive"
        );
        self.cell_size = cell_size;
        self.origin = origin.unwrap_or_else(|| self.default_origin());
        self
    }

    fn default_origin(&self) -> Vec3 {
        Vec3::new(0.0, (self.height - 1) as f32 * self.cell_size.y, 0.0)
    }

    /// Number of columns.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_size(&self) -> Vec2 {
        self.cell_size
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    fn check(&self, x: i64, y: i64) -> Result<usize, MapError> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return Err(MapError::OutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y as usize * self.width as usize + x as usize)
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Result<MapChipType, MapError> {
        let i = self.check(x as i64, y as i64)?;
        Ok(self.cells[i])
    }

    pub fn set_tile(&mut self, x: u32, y: u32, tile: MapChipType) -> Result<(), MapError> {
        let i = self.check(x as i64, y as i64)?;
        self.cells[i] = tile;
        Ok(())
    }

    /// Tile lookup for collision: anything beyond the edge reads as blank.
    pub(crate) fn tile_or_blank(&self, x: i64, y: i64) -> MapChipType {
        self.check(x, y)
            .map(|i| self.cells[i])
            .unwrap_or(MapChipType::Blank)
    }

    /// Centre of cell `(x, y)` in world space.
    pub fn world_position_of(&self, x: u32, y: u32) -> Vec3 {
        self.origin
            + Vec3::new(
                x as f32 * self.cell_size.x,
                -(y as f32) * self.cell_size.y,
                0.0,
            )
    }

    /// Signed cell coordinate containing `position`, without a bounds check.
    pub(crate) fn cell_coord_of(&self, position: Vec3) -> (i64, i64) {
        let x = ((position.x - self.origin.x + self.cell_size.x * 0.5) / self.cell_size.x).floor();
        let y = ((self.origin.y - position.y + self.cell_size.y * 0.5) / self.cell_size.y).floor();
        (x as i64, y as i64)
    }

    /// Cell containing `position`. Fails if the point lies outside the grid.
    pub fn index_of(&self, position: Vec3) -> Result<IndexSet, MapError> {
        let (x, y) = self.cell_coord_of(position);
        self.check(x, y)?;
        Ok(IndexSet::new(x as u32, y as u32))
    }

    /// Cell containing `position`, pulled onto the nearest edge cell when outside.
    pub fn clamped_index_of(&self, position: Vec3) -> IndexSet {
        let (x, y) = self.cell_coord_of(position);
        IndexSet::new(
            x.clamp(0, self.width as i64 - 1) as u32,
            y.clamp(0, self.height as i64 - 1) as u32,
        )
    }

    /// World-space rectangle covered by cell `(x, y)`.
    pub fn rect_of(&self, x: i64, y: i64) -> Rect {
        let center = self.origin
            + Vec3::new(
                x as f32 * self.cell_size.x,
                -(y as f32) * self.cell_size.y,
                0.0,
            );
        let half = self.cell_size * 0.5;
        Rect::new(
            center.x - half.x,
            center.x + half.x,
            center.y - half.y,
            center.y + half.y,
        )
    }

    /// World-space rectangle covered by the whole grid.
    pub fn world_bounds(&self) -> Rect {
        let top_left = self.rect_of(0, 0);
        let bottom_right = self.rect_of(self.width as i64 - 1, self.height as i64 - 1);
        Rect::new(
            top_left.left,
            bottom_right.right,
            bottom_right.bottom,
            top_left.top,
        )
    }

    /// Index that `index` lands on after a 180° point mirror of the grid.
    pub fn mirrored_index(&self, index: IndexSet) -> IndexSet {
        IndexSet::new(self.width - 1 - index.x, self.height - 1 - index.y)
    }

    /// Relabel the whole grid. Every mode is an involution.
    pub fn invert(&mut self, mode: InvertMode) {
        match mode {
            InvertMode::MirrorSwap => {
                // In row-major order the point mirror of cell k is cell (n - 1 - k).
                self.cells.reverse();
                for cell in &mut self.cells {
                    *cell = cell.swapped();
                }
            }
            InvertMode::Mirror => self.cells.reverse(),
            InvertMode::SwapInPlace => {
                for cell in &mut self.cells {
                    *cell = cell.swapped();
                }
            }
        }
        tracing::debug!(?mode, "map inverted");
    }

    /// Iterate over `(index, tile)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (IndexSet, MapChipType)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, t)| (IndexSet::new(i as u32 % width, i as u32 / width), *t))
    }

    /// Rows of tile codes, top row first.
    pub fn rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|t| t.code()).collect())
            .collect()
    }

    /// Number of solid cells.
    pub fn solid_count(&self) -> usize {
        self.cells.iter().filter(|t| t.is_solid()).count()
    }
}

impl fmt::Display for MapChipField {
    /// Comma-separated layout, parseable by [`MapChipField::parse`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: Vec<String> = row.iter().map(u8::to_string).collect();
            writeln!(f, "{}", line.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn field(text: &str) -> MapChipField {
        MapChipField::parse(text).unwrap()
    }

    #[test]
    fn dimensions_and_lookup() {
        let f = field("1,0,0\n0,2,1\n");
        assert_eq!((f.width(), f.height()), (3, 2));
        assert_eq!(f.tile_at(0, 0).unwrap(), MapChipType::Block);
        assert_eq!(f.tile_at(1, 1).unwrap(), MapChipType::Block2);
        assert_eq!(f.solid_count(), 3);
    }

    #[test]
    fn out_of_range_access_fails() {
        let mut f = field("1,0\n0,1\n");
        assert!(matches!(
            f.tile_at(2, 0),
            Err(MapError::OutOfRange { x: 2, y: 0, .. })
        ));
        assert!(f.set_tile(0, 5, MapChipType::Block).is_err());
        f.set_tile(1, 0, MapChipType::Block2).unwrap();
        assert_eq!(f.tile_at(1, 0).unwrap(), MapChipType::Block2);
    }

    #[test]
    fn world_position_grows_right_and_up() {
        let f = field("0,0,0\n0,0,0\n0,0,0\n0,0,0\n");
        // Bottom row sits at y = 0 by default.
        assert_eq!(f.world_position_of(0, 3), Vec3::ZERO);
        assert_eq!(f.world_position_of(2, 0), Vec3::new(2.0, 3.0, 0.0));
        assert_eq!(f.world_position_of(1, 1) - f.world_position_of(1, 2), Vec3::Y);
    }

    #[test]
    fn custom_geometry() {
        let f = field("0,0\n0,0\n")
            .with_geometry(Vec2::new(2.0, 0.5), Some(Vec3::new(10.0, 10.0, 1.0)));
        assert_eq!(f.world_position_of(1, 1), Vec3::new(12.0, 9.5, 1.0));
        assert_eq!(f.index_of(Vec3::new(12.9, 9.6, 0.0)).unwrap(), IndexSet::new(1, 1));
    }

    #[test]
    fn index_of_round_trips_to_cell_centre() {
        let f = field("0,0,0,0\n0,0,0,0\n0,0,0,0\n");
        let bounds = f.world_bounds();
        let steps = 37;
        for i in 0..steps {
            for j in 0..steps {
                let p = Vec3::new(
                    bounds.left + bounds.width() * (i as f32 + 0.5) / steps as f32,
                    bounds.bottom + bounds.height() * (j as f32 + 0.5) / steps as f32,
                    0.0,
                );
                let idx = f.index_of(p).unwrap();
                let centre = f.world_position_of(idx.x, idx.y);
                let rect = f.rect_of(idx.x as i64, idx.y as i64);
                assert!(p.x >= rect.left && p.x <= rect.right);
                assert!(p.y >= rect.bottom && p.y <= rect.top);
                assert_eq!(f.index_of(centre).unwrap(), idx);
            }
        }
    }

    #[test]
    fn index_of_outside_grid_fails() {
        let f = field("0,0\n0,0\n");
        assert!(f.index_of(Vec3::new(-0.6, 0.0, 0.0)).is_err());
        assert!(f.index_of(Vec3::new(0.0, 1.6, 0.0)).is_err());
        assert_eq!(
            f.clamped_index_of(Vec3::new(-5.0, 9.0, 0.0)),
            IndexSet::new(0, 0)
        );
    }

    #[test]
    fn world_bounds_cover_all_cells() {
        let f = field("0,0,0\n0,0,0\n");
        assert_eq!(f.world_bounds(), Rect::new(-0.5, 2.5, -0.5, 1.5));
    }

    #[test]
    fn mirror_swap_inverts_small_grid() {
        let mut f = field("1,1\n0,1\n");
        f.invert(InvertMode::MirrorSwap);
        assert_eq!(f.rows(), vec![vec![0, 1], vec![0, 0]]);
    }

    #[test]
    fn mirror_only_inverts_small_grid() {
        let mut f = field("1,1\n0,1\n");
        f.invert(InvertMode::Mirror);
        assert_eq!(f.rows(), vec![vec![1, 0], vec![1, 1]]);
    }

    #[test]
    fn swap_in_place_keeps_positions() {
        let mut f = field("1,1\n0,1\n");
        f.invert(InvertMode::SwapInPlace);
        assert_eq!(f.rows(), vec![vec![0, 0], vec![1, 0]]);
    }

    #[test]
    fn every_mode_is_an_involution() {
        let original = field("1,0,2,0,1\n0,0,1,1,0\n2,1,0,0,0\n1,1,1,0,2\n");
        for mode in [InvertMode::MirrorSwap, InvertMode::Mirror, InvertMode::SwapInPlace] {
            let mut f = original.clone();
            f.invert(mode);
            assert_ne!(f, original, "{mode:?} changed nothing");
            f.invert(mode);
            assert_eq!(f, original, "{mode:?} is not an involution");
        }
    }

    #[test]
    fn odd_grid_centre_cell_swaps_in_place() {
        let mut f = field("0,0,0\n0,1,0\n0,0,0\n");
        f.invert(InvertMode::MirrorSwap);
        assert_eq!(f.tile_at(1, 1).unwrap(), MapChipType::Blank);
        assert_eq!(f.tile_at(0, 0).unwrap(), MapChipType::Block);
    }

    #[test]
    fn block2_is_fixed_under_swap() {
        assert_eq!(MapChipType::Block2.swapped(), MapChipType::Block2);
        assert_eq!(MapChipType::Blank.swapped().swapped(), MapChipType::Blank);
    }

    #[test]
    fn mirrored_index_is_point_reflection() {
        let f = field("0,0,0,0\n0,0,0,0\n0,0,0,0\n");
        assert_eq!(f.mirrored_index(IndexSet::new(0, 0)), IndexSet::new(3, 2));
        assert_eq!(f.mirrored_index(IndexSet::new(1, 2)), IndexSet::new(2, 0));
    }

    #[test]
    fn display_round_trips_through_parse() {
        let f = field("1,0,2\n0,0,1\n");
        assert_eq!(MapChipField::parse(&f.to_string()).unwrap(), f);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1,1,1").unwrap();
        writeln!(file, "0,0,0").unwrap();
        let f = MapChipField::load(file.path()).unwrap();
        assert_eq!(f.height(), 2);

        assert!(matches!(
            MapChipField::load(file.path().with_extension("missing")),
            Err(MapError::Io(_))
        ));
    }
}
