use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::error::{WorldError, WorldResult};

/// Lengths below this are treated as zero when normalizing.
pub const EPSILON: f64 = 1e-9;

/// A point or displacement in world units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };
    /// Unit vector along +x, the fallback direction for degenerate input.
    pub const UNIT_X: Self = Self { x: 1.0, y: 0.0 };

    /// Create a vector from components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `angle` radians.
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Squared Euclidean length.
    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Dot product.
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Angle of the vector in radians, `0.0` for the zero vector.
    pub fn angle(self) -> f64 {
        if self.length_squared() < EPSILON * EPSILON {
            return 0.0;
        }
        self.y.atan2(self.x)
    }

    /// Unit vector in the same direction, or `fallback` if too short or not finite.
    pub fn normalize_or(self, fallback: Self) -> Self {
        let len = self.length();
        if !len.is_finite() || len < EPSILON {
            return fallback;
        }
        Self::new(self.x / len, self.y / len)
    }

    /// Unit vector in the same direction, or [`Vec2::UNIT_X`] for degenerate input.
    pub fn normalized(self) -> Self {
        self.normalize_or(Self::UNIT_X)
    }

    /// Linear interpolation without wrapping.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }

    /// Returns `true` if both components are finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl MulAssign<f64> for Vec2 {
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Wrap a coordinate into `[0, extent)`.
///
/// Non-finite input collapses to `0.0` so a bad velocity can never push
/// `NaN` into a position.
pub fn wrap_coord(value: f64, extent: f64) -> f64 {
    if !value.is_finite() || extent <= 0.0 {
        return 0.0;
    }
    let v = value.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs
    if v >= extent { 0.0 } else { v }
}

/// Shortest signed offset along one wrapped axis.
fn wrapped_axis_delta(from: f64, to: f64, extent: f64) -> f64 {
    let d = (to - from).rem_euclid(extent);
    if d > extent * 0.5 { d - extent } else { d }
}

/// Dimensions of the toroidal map. All distance and direction math goes through here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapSize {
    /// Width in world units.
    pub width: f64,
    /// Height in world units.
    pub height: f64,
}

impl Default for MapSize {
    fn default() -> Self {
        Self {
            width: 2000.0,
            height: 2000.0,
        }
    }
}

impl MapSize {
    /// Create a map size, rejecting non-positive or non-finite dimensions.
    pub fn new(width: f64, height: f64) -> WorldResult<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(WorldError::InvalidMapSize { width, height });
        }
        Ok(Self { width, height })
    }

    /// Wrap a point onto the canonical `[0, width) x [0, height)` rectangle.
    pub fn wrap(&self, p: Vec2) -> Vec2 {
        Vec2::new(wrap_coord(p.x, self.width), wrap_coord(p.y, self.height))
    }

    /// Returns `true` if the point is already canonical.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x < self.width && p.y >= 0.0 && p.y < self.height
    }

    /// Shortest displacement from `from` to `to`, possibly crossing an edge.
    pub fn delta(&self, from: Vec2, to: Vec2) -> Vec2 {
        Vec2::new(
            wrapped_axis_delta(from.x, to.x, self.width),
            wrapped_axis_delta(from.y, to.y, self.height),
        )
    }

    /// Wrapped (shortest-path) distance between two points.
    pub fn distance(&self, a: Vec2, b: Vec2) -> f64 {
        self.delta(a, b).length()
    }

    /// Squared wrapped distance.
    pub fn distance_squared(&self, a: Vec2, b: Vec2) -> f64 {
        self.delta(a, b).length_squared()
    }

    /// Unit direction from `from` toward `to` along the shortest path.
    ///
    /// Coincident points yield [`Vec2::UNIT_X`].
    pub fn direction(&self, from: Vec2, to: Vec2) -> Vec2 {
        self.delta(from, to).normalized()
    }

    /// Interpolate along the shortest path and wrap the result.
    pub fn lerp(&self, from: Vec2, to: Vec2, t: f64) -> Vec2 {
        self.wrap(from + self.delta(from, to) * t)
    }

    /// Move `from` by at most `step` toward `to`, never overshooting.
    pub fn step_toward(&self, from: Vec2, to: Vec2, step: f64) -> Vec2 {
        let delta = self.delta(from, to);
        let dist = delta.length();
        if dist <= step || dist < EPSILON {
            return self.wrap(to);
        }
        self.wrap(from + delta * (step / dist))
    }

    /// Area of the map.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}
