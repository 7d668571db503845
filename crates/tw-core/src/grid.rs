//! Dense grids laid over the toroidal map.
//!
//! The engine only reads terrain and biome; soil fertility is depleted by
//! planting and grazing and recovers over time.

use crate::error::{WorldError, WorldResult};
use crate::vector::{MapSize, Vec2};

/// Broad land-cover class of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Biome {
    /// Open grass; prey graze here.
    #[default]
    Grassland,
    /// Wooded land.
    Forest,
    /// Dry land; nothing grazes.
    Desert,
    /// Open water.
    Water,
    /// Rock.
    Mountain,
}

impl Biome {
    /// Whether grazers can feed in this biome.
    pub fn is_grazable(self) -> bool {
        matches!(self, Self::Grassland | Self::Forest)
    }
}

/// A row-major grid of cells wrapping on both axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    cols: usize,
    rows: usize,
    cell_width: f64,
    cell_height: f64,
    cells: Vec<T>,
}

/// Soil fertility in `0..=1` per cell.
pub type SoilGrid = Grid<f64>;

/// Terrain height per cell.
pub type HeightGrid = Grid<f32>;

/// Biome per cell.
pub type BiomeGrid = Grid<Biome>;

impl<T: Clone> Grid<T> {
    /// Cover `map` with cells no smaller than `cell_size`, all set to `fill`.
    pub fn new(map: &MapSize, cell_size: f64, fill: T) -> WorldResult<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(WorldError::InvalidGrid(cell_size));
        }
        let cols = ((map.width / cell_size).floor() as usize).max(1);
        let rows = ((map.height / cell_size).floor() as usize).max(1);
        Ok(Self {
            cols,
            rows,
            cell_width: map.width / cols as f64,
            cell_height: map.height / rows as f64,
            cells: vec![fill; cols * rows],
        })
    }

    /// Set every cell to `value`.
    pub fn fill(&mut self, value: T) {
        self.cells.iter_mut().for_each(|c| *c = value.clone());
    }
}

impl<T> Grid<T> {
    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Width of one cell in world units.
    pub fn cell_width(&self) -> f64 {
        self.cell_width
    }

    /// Height of one cell in world units.
    pub fn cell_height(&self) -> f64 {
        self.cell_height
    }

    /// Column and row of the cell containing `pos` (after wrapping).
    pub fn cell_of(&self, pos: Vec2) -> (usize, usize) {
        let w = self.cell_width * self.cols as f64;
        let h = self.cell_height * self.rows as f64;
        let x = crate::vector::wrap_coord(pos.x, w);
        let y = crate::vector::wrap_coord(pos.y, h);
        let col = ((x / self.cell_width) as usize).min(self.cols - 1);
        let row = ((y / self.cell_height) as usize).min(self.rows - 1);
        (col, row)
    }

    /// Wrap signed cell coordinates onto the grid.
    pub fn wrap_cell(&self, col: i64, row: i64) -> (usize, usize) {
        (
            col.rem_euclid(self.cols as i64) as usize,
            row.rem_euclid(self.rows as i64) as usize,
        )
    }

    /// Flat index of a cell.
    pub fn index(&self, col: usize, row: usize) -> usize {
        (row % self.rows) * self.cols + (col % self.cols)
    }

    /// World-space center of a cell.
    pub fn cell_center(&self, col: usize, row: usize) -> Vec2 {
        Vec2::new(
            (col as f64 + 0.5) * self.cell_width,
            (row as f64 + 0.5) * self.cell_height,
        )
    }

    /// Cell value by coordinates.
    pub fn get(&self, col: usize, row: usize) -> &T {
        &self.cells[self.index(col, row)]
    }

    /// Mutable cell value by coordinates.
    pub fn get_mut(&mut self, col: usize, row: usize) -> &mut T {
        let idx = self.index(col, row);
        &mut self.cells[idx]
    }

    /// Value of the cell containing `pos`.
    pub fn at(&self, pos: Vec2) -> &T {
        let (col, row) = self.cell_of(pos);
        self.get(col, row)
    }

    /// Mutable value of the cell containing `pos`.
    pub fn at_mut(&mut self, pos: Vec2) -> &mut T {
        let (col, row) = self.cell_of(pos);
        self.get_mut(col, row)
    }

    /// Iterate over all cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    /// Iterate mutably over all cells in row-major order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.cells.iter_mut()
    }

    /// Center of the nearest cell (by ring distance from `pos`) satisfying `pred`.
    ///
    /// Searches at most `max_rings` rings outward. Within a ring the cell whose
    /// center is closest to `pos` wins.
    pub fn find_nearest_cell<F>(&self, map: &MapSize, pos: Vec2, max_rings: usize, pred: F) -> Option<Vec2>
    where
        F: Fn(usize, usize) -> bool,
    {
        let (c0, r0) = self.cell_of(pos);
        let max_rings = max_rings.min(self.cols.max(self.rows));
        for ring in 0..=max_rings as i64 {
            let mut best: Option<(f64, Vec2)> = None;
            for dr in -ring..=ring {
                for dc in -ring..=ring {
                    if dr.abs() != ring && dc.abs() != ring {
                        continue;
                    }
                    let (col, row) = self.wrap_cell(c0 as i64 + dc, r0 as i64 + dr);
                    if !pred(col, row) {
                        continue;
                    }
                    let center = self.cell_center(col, row);
                    let d2 = map.distance_squared(pos, center);
                    if best.is_none_or(|(b, _)| d2 < b) {
                        best = Some((d2, center));
                    }
                }
            }
            if let Some((_, center)) = best {
                return Some(center);
            }
        }
        None
    }
}

impl Grid<f64> {
    /// Lower the value of the cell at `pos` by `amount`, clamping at zero.
    pub fn deplete(&mut self, pos: Vec2, amount: f64) {
        let cell = self.at_mut(pos);
        *cell = (*cell - amount).max(0.0);
    }

    /// Raise every cell by `amount`, clamping at one.
    pub fn recover(&mut self, amount: f64) {
        for cell in self.iter_mut() {
            *cell = (*cell + amount).min(1.0);
        }
    }
}
