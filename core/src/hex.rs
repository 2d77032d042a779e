//! Hex-grid geometry shared by the world and its presentation layers.
//!
//! Rows are offset columns: even rows see the columns `c - 1` and `c` of the
//! rows above and below, odd rows see `c` and `c + 1`. Cell centres sit on a
//! gentle hill so the maze can be rendered in 3D.

use std::f32::consts::PI;

use glam::Vec3;

use crate::CellCoord;

/// `sin(π/3)`, the half-height of a unit hexagon.
pub const SIN_60: f32 = 0.866_025_4;

/// Peak height of the hill the maze is laid out on.
pub const HILL_HEIGHT: f32 = 10.0;

/// Spread of the hill; larger values give flatter mazes.
pub const HILL_SPREAD: f32 = 100.0;

/// Rays intersecting a cell farther away than this are ignored when picking.
pub const MAX_PICK_DISTANCE: f32 = 600.0;

/// Ray cast from the camera, used to pick a cell under the cursor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Point the ray starts from.
    pub origin: Vec3,
    /// Direction of travel; need not be normalised.
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray.
    #[must_use]
    pub const fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }
}

/// Centre of a cell before wall height is added.
#[must_use]
pub fn base_position(cell: CellCoord, height: u32, width: u32) -> Vec3 {
    let parity = (cell.row() % 2) as f32;
    let x = 1.5 * cell.row() as f32 - 0.75 * width as f32;
    let z = (2.0 * cell.column() as f32 + parity) * SIN_60 - SIN_60 * height as f32;
    let y = HILL_HEIGHT * (-(x * x + z * z) / HILL_SPREAD).exp();
    Vec3::new(x, y, z)
}

/// Yields the in-bounds neighbours of `cell` in a maze of the given size.
///
/// Neighbours come out in row-major order: the row above, the same row,
/// then the row below.
pub fn hex_neighbours(cell: CellCoord, height: u32, width: u32) -> impl Iterator<Item = CellCoord> {
    let even = cell.row() % 2 == 0;
    let mut candidates = [None; 6];
    let mut count = 0;

    for row_offset in -1_i64..=1 {
        for column_offset in -1_i64..=1 {
            if row_offset == 0 && column_offset == 0 {
                continue;
            }
            if row_offset != 0 && ((even && column_offset == 1) || (!even && column_offset == -1)) {
                continue;
            }

            let row = i64::from(cell.row()) + row_offset;
            let column = i64::from(cell.column()) + column_offset;
            if row < 0 || column < 0 || row >= i64::from(height) || column >= i64::from(width) {
                continue;
            }

            candidates[count] = Some(CellCoord::new(row as u32, column as u32));
            count += 1;
        }
    }

    candidates.into_iter().flatten()
}

/// Reports whether `candidate` is a hex neighbour of `cell`.
#[must_use]
pub fn are_adjacent(cell: CellCoord, candidate: CellCoord, height: u32, width: u32) -> bool {
    hex_neighbours(cell, height, width).any(|neighbour| neighbour == candidate)
}

/// Squared distance between two points, ignoring height.
#[must_use]
pub fn planar_distance_squared(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz
}

/// Corner `index` of the unit hexagon outlining a cell, relative to its centre.
#[must_use]
pub fn outline_vertex(index: usize) -> Vec3 {
    let angle = (5 - index % 6) as f32 * PI / 3.0;
    Vec3::new(angle.cos(), 0.0, angle.sin())
}

/// Intersects `ray` with the flat hexagon centred at `centre`.
///
/// Returns the distance from the ray origin to the hit point, or `None` when
/// the ray misses the footprint or runs parallel to it.
#[must_use]
pub fn footprint_hit(centre: Vec3, ray: &Ray) -> Option<f32> {
    if ray.direction.y.abs() <= f32::EPSILON {
        return None;
    }

    let mut source = ray.origin;
    source.y -= centre.y;
    let point = source - (source.y / ray.direction.y) * ray.direction;

    let inside = (0..6).all(|index| {
        let current = centre + outline_vertex(index) - point;
        let next = centre + outline_vertex(index + 1) - point;
        current.z * next.x >= next.z * current.x
    });

    inside.then(|| (point - source).length())
}
