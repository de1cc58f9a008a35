//! Hex grid math: cube coordinates, tile layout, tile geometry.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A hex cell in cube coordinates. The third coordinate is derived, `s = -q - r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hex {
    q: i32,
    r: i32,
}

impl Hex {
    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    pub fn q(&self) -> i32 {
        self.q
    }

    pub fn r(&self) -> i32 {
        self.r
    }

    pub fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Number of steps between two cells.
    pub fn distance_to(&self, other: &Hex) -> i32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        dq.max(dr).max(ds)
    }
}

/// Pointy-top layout for rows of hex tiles. Odd rows are shifted left by half a tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HexLayout {
    /// Center-to-corner radius of a tile.
    pub size: f32,
    /// Gap between neighbouring tiles.
    pub padding: f32,
    /// Position of tile (row 0, col 0).
    pub origin: Vec3,
}

impl Default for HexLayout {
    fn default() -> Self {
        Self {
            size: 1.0,
            padding: 0.03,
            origin: Vec3::new(-10.0, -10.0, -50.0),
        }
    }
}

impl HexLayout {
    pub fn tile_width(&self) -> f32 {
        3.0_f32.sqrt() * self.size
    }

    pub fn row_spacing(&self) -> f32 {
        2.0 * self.size * 0.75
    }

    pub fn tile_position(&self, row: u32, col: u32) -> Vec3 {
        let width = self.tile_width();
        let start_x = if row % 2 == 0 {
            self.origin.x
        } else {
            self.origin.x - width / 2.0
        };
        Vec3::new(
            start_x + (width + self.padding) * col as f32,
            self.origin.y + (self.row_spacing() + self.padding) * row as f32,
            self.origin.z,
        )
    }

    /// Tile positions for a `rows` x `cols` grid, row-major.
    pub fn grid(&self, rows: u32, cols: u32) -> impl Iterator<Item = Vec3> + '_ {
        (0..rows).flat_map(move |row| (0..cols).map(move |col| self.tile_position(row, col)))
    }
}

/// Triangle-fan outline of a unit hex scaled by `size`: the center, six
/// corners, and the first corner again to close the fan. Two floats per vertex.
pub fn hex_fan_vertices(size: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(16);
    out.extend_from_slice(&[0.0, 0.0]);
    for i in 0..=6 {
        let angle = (60.0 * i as f32 - 30.0).to_radians();
        out.push(size * angle.cos());
        out.push(size * angle.sin());
    }
    out
}
