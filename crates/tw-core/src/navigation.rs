//! Obstacle grid and A* pathfinding over the toroidal map.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::WorldResult;
use crate::grid::Grid;
use crate::vector::{MapSize, Vec2};

/// Node budget per search; larger searches give up and return `None`.
pub const MAX_EXPANSIONS: usize = 4096;

const NEIGHBORS: [(i64, i64); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

#[derive(Debug, Clone, Copy)]
struct Open {
    f: f64,
    idx: usize,
}

impl PartialEq for Open {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Open {}

impl PartialOrd for Open {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Open {
    // Reversed so BinaryHeap pops the lowest f first; ties go to the lower index.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.idx.cmp(&self.idx))
    }
}

/// Blocked/free cells used for route planning.
#[derive(Debug, Clone, PartialEq)]
pub struct NavGrid {
    blocked: Grid<bool>,
}

impl NavGrid {
    /// An all-free grid over `map`.
    pub fn new(map: &MapSize, cell_size: f64) -> WorldResult<Self> {
        Ok(Self {
            blocked: Grid::new(map, cell_size, false)?,
        })
    }

    /// Mark every cell free.
    pub fn clear(&mut self) {
        self.blocked.fill(false);
    }

    /// Mark cells whose centers lie within `radius` of `center` as blocked.
    pub fn block_circle(&mut self, map: &MapSize, center: Vec2, radius: f64) {
        let span_c = (radius / self.blocked.cell_width()).ceil() as i64;
        let span_r = (radius / self.blocked.cell_height()).ceil() as i64;
        let (c0, r0) = self.blocked.cell_of(center);
        for dr in -span_r..=span_r {
            for dc in -span_c..=span_c {
                let (col, row) = self.blocked.wrap_cell(c0 as i64 + dc, r0 as i64 + dr);
                if map.distance(center, self.blocked.cell_center(col, row)) <= radius {
                    *self.blocked.get_mut(col, row) = true;
                }
            }
        }
        // The center cell is always blocked, however small the radius.
        *self.blocked.get_mut(c0, r0) = true;
    }

    /// Whether the cell containing `pos` is blocked.
    pub fn is_blocked(&self, pos: Vec2) -> bool {
        *self.blocked.at(pos)
    }

    /// Number of blocked cells.
    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|b| **b).count()
    }

    fn wrapped_cell_distance(&self, a: (usize, usize), b: (usize, usize)) -> f64 {
        let cols = self.blocked.cols();
        let rows = self.blocked.rows();
        let dx = a.0.abs_diff(b.0);
        let dy = a.1.abs_diff(b.1);
        let dx = dx.min(cols - dx) as f64;
        let dy = dy.min(rows - dy) as f64;
        // Octile distance
        let (lo, hi) = if dx < dy { (dx, dy) } else { (dy, dx) };
        hi + (std::f64::consts::SQRT_2 - 1.0) * lo
    }

    /// Plan a route from `from` to `to` as world-space waypoints.
    ///
    /// The final waypoint is `to` itself. The start cell is allowed to be
    /// blocked so agents standing next to a building can still leave. Returns
    /// `None` if the goal cell is blocked, unreachable, or the search exceeds
    /// [`MAX_EXPANSIONS`].
    pub fn find_path(&self, map: &MapSize, from: Vec2, to: Vec2) -> Option<Vec<Vec2>> {
        let grid = &self.blocked;
        let start = grid.cell_of(from);
        let goal = grid.cell_of(to);
        if start == goal {
            return Some(vec![map.wrap(to)]);
        }
        if *grid.get(goal.0, goal.1) {
            return None;
        }

        let n = grid.cols() * grid.rows();
        let mut g_score = vec![f64::INFINITY; n];
        let mut came_from: Vec<Option<usize>> = vec![None; n];
        let mut closed = vec![false; n];
        let mut open = BinaryHeap::new();

        let start_idx = grid.index(start.0, start.1);
        let goal_idx = grid.index(goal.0, goal.1);
        g_score[start_idx] = 0.0;
        open.push(Open {
            f: self.wrapped_cell_distance(start, goal),
            idx: start_idx,
        });

        let mut expansions = 0;
        while let Some(Open { idx, .. }) = open.pop() {
            if idx == goal_idx {
                return Some(self.reconstruct(map, &came_from, goal_idx, to));
            }
            if closed[idx] {
                continue;
            }
            closed[idx] = true;
            expansions += 1;
            if expansions > MAX_EXPANSIONS {
                return None;
            }

            let col = (idx % grid.cols()) as i64;
            let row = (idx / grid.cols()) as i64;
            for (dc, dr) in NEIGHBORS {
                let (nc, nr) = grid.wrap_cell(col + dc, row + dr);
                if *grid.get(nc, nr) {
                    continue;
                }
                let diagonal = dc != 0 && dr != 0;
                if diagonal {
                    // No corner cutting past blocked orthogonal neighbors.
                    let (ac, ar) = grid.wrap_cell(col + dc, row);
                    let (bc, br) = grid.wrap_cell(col, row + dr);
                    if *grid.get(ac, ar) || *grid.get(bc, br) {
                        continue;
                    }
                }
                let nidx = grid.index(nc, nr);
                if closed[nidx] {
                    continue;
                }
                let step = if diagonal { std::f64::consts::SQRT_2 } else { 1.0 };
                let tentative = g_score[idx] + step;
                if tentative < g_score[nidx] {
                    g_score[nidx] = tentative;
                    came_from[nidx] = Some(idx);
                    open.push(Open {
                        f: tentative + self.wrapped_cell_distance((nc, nr), goal),
                        idx: nidx,
                    });
                }
            }
        }
        None
    }

    fn reconstruct(&self, map: &MapSize, came_from: &[Option<usize>], goal_idx: usize, to: Vec2) -> Vec<Vec2> {
        let grid = &self.blocked;
        let mut cells = vec![goal_idx];
        let mut node = goal_idx;
        while let Some(prev) = came_from[node] {
            cells.push(prev);
            node = prev;
        }
        cells.reverse();
        // Drop the start cell; the agent is already there.
        let mut waypoints: Vec<Vec2> = cells
            .into_iter()
            .skip(1)
            .map(|idx| grid.cell_center(idx % grid.cols(), idx / grid.cols()))
            .collect();
        if let Some(last) = waypoints.last_mut() {
            *last = map.wrap(to);
        }
        waypoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> MapSize {
        MapSize::new(100.0, 100.0).unwrap()
    }

    #[test]
    fn same_cell_path_is_destination() {
        let nav = NavGrid::new(&map(), 10.0).unwrap();
        let path = nav.find_path(&map(), Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)).unwrap();
        assert_eq!(path, vec![Vec2::new(2.0, 2.0)]);
    }

    #[test]
    fn open_path_ends_at_destination() {
        let nav = NavGrid::new(&map(), 10.0).unwrap();
        let to = Vec2::new(45.0, 5.0);
        let path = nav.find_path(&map(), Vec2::new(5.0, 5.0), to).unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(*path.last().unwrap(), to);
    }

    #[test]
    fn path_wraps_across_edge() {
        let nav = NavGrid::new(&map(), 10.0).unwrap();
        let path = nav
            .find_path(&map(), Vec2::new(5.0, 5.0), Vec2::new(95.0, 5.0))
            .unwrap();
        // One step west across the edge instead of nine east.
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn path_routes_around_wall() {
        let m = map();
        let mut nav = NavGrid::new(&m, 10.0).unwrap();
        for row in 0..8 {
            nav.block_circle(&m, Vec2::new(35.0, row as f64 * 10.0 + 5.0), 1.0);
        }
        let path = nav.find_path(&m, Vec2::new(15.0, 15.0), Vec2::new(55.0, 15.0)).unwrap();
        assert!(path.iter().all(|p| !nav.is_blocked(*p)));
        assert!(path.len() > 4);
    }

    #[test]
    fn blocked_goal_has_no_path() {
        let m = map();
        let mut nav = NavGrid::new(&m, 10.0).unwrap();
        nav.block_circle(&m, Vec2::new(55.0, 55.0), 1.0);
        assert!(nav.find_path(&m, Vec2::new(5.0, 5.0), Vec2::new(55.0, 55.0)).is_none());
        assert_eq!(nav.blocked_count(), 1);
        nav.clear();
        assert_eq!(nav.blocked_count(), 0);
    }
}
