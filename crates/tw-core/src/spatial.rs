//! Uniform bucket index for neighborhood queries on the torus.

use crate::entity::EntityId;
use crate::error::{WorldError, WorldResult};
use crate::vector::{MapSize, Vec2};

/// Entities bucketed by cell, rebuilt from positions once per pass.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    map: MapSize,
    cols: usize,
    rows: usize,
    cell_width: f64,
    cell_height: f64,
    buckets: Vec<Vec<(EntityId, Vec2)>>,
}

impl SpatialIndex {
    /// An empty index with cells no smaller than `cell_size`.
    pub fn new(map: MapSize, cell_size: f64) -> WorldResult<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(WorldError::InvalidGrid(cell_size));
        }
        let cols = ((map.width / cell_size).floor() as usize).max(1);
        let rows = ((map.height / cell_size).floor() as usize).max(1);
        Ok(Self {
            map,
            cols,
            rows,
            cell_width: map.width / cols as f64,
            cell_height: map.height / rows as f64,
            buckets: vec![Vec::new(); cols * rows],
        })
    }

    /// Drop every entry and re-insert from `items`.
    pub fn rebuild<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = (EntityId, Vec2)>,
    {
        self.buckets.iter_mut().for_each(Vec::clear);
        for (id, pos) in items {
            self.insert(id, pos);
        }
    }

    /// Insert one entry.
    pub fn insert(&mut self, id: EntityId, pos: Vec2) {
        let pos = self.map.wrap(pos);
        let (col, row) = self.cell_of(pos);
        self.buckets[row * self.cols + col].push((id, pos));
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    fn cell_of(&self, pos: Vec2) -> (usize, usize) {
        let col = ((pos.x / self.cell_width) as usize).min(self.cols - 1);
        let row = ((pos.y / self.cell_height) as usize).min(self.rows - 1);
        (col, row)
    }

    fn axis_span(center: usize, span: i64, len: usize) -> Vec<usize> {
        if (2 * span + 1) as usize >= len {
            return (0..len).collect();
        }
        (-span..=span)
            .map(|d| (center as i64 + d).rem_euclid(len as i64) as usize)
            .collect()
    }

    /// Entries whose wrapped distance to `pos` is at most `radius`,
    /// as `(id, distance)` sorted by id.
    pub fn query(&self, pos: Vec2, radius: f64) -> Vec<(EntityId, f64)> {
        let pos = self.map.wrap(pos);
        let (c0, r0) = self.cell_of(pos);
        let span_c = (radius / self.cell_width).ceil() as i64;
        let span_r = (radius / self.cell_height).ceil() as i64;
        let cols = Self::axis_span(c0, span_c, self.cols);
        let rows = Self::axis_span(r0, span_r, self.rows);

        let radius_sq = radius * radius;
        let mut found = Vec::new();
        for &row in &rows {
            for &col in &cols {
                for &(id, p) in &self.buckets[row * self.cols + col] {
                    let d2 = self.map.distance_squared(pos, p);
                    if d2 <= radius_sq {
                        found.push((id, d2.sqrt()));
                    }
                }
            }
        }
        found.sort_by_key(|(id, _)| *id);
        found
    }
}
