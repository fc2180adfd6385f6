/// Tile-grid collision queries.
///
/// The grid is `tiles[row][col]`, each cell `tile_size` world units square,
/// with cell (0, 0) spanning `[0, tile_size)²`. Anything outside the grid
/// is solid, so bodies can never leave the map.
///
/// Wall resolution is axis-separated: each pass picks the solid cell with
/// the deepest overlap and pushes the body out along the axis of smaller
/// penetration. A few passes settle corners touching two walls at once.

use glam::Vec2;

use super::geometry::Aabb;
use super::tile::Tile;

const PUSH_PASSES: usize = 4;

// ══════════════════════════════════════════════════════════════
// Cell queries
// ══════════════════════════════════════════════════════════════

#[inline]
pub fn tile_at(tiles: &[Vec<Tile>], col: i64, row: i64) -> Option<Tile> {
    if col < 0 || row < 0 {
        return None;
    }
    tiles.get(row as usize).and_then(|r| r.get(col as usize)).copied()
}

#[inline]
pub fn solid_at(tiles: &[Vec<Tile>], col: i64, row: i64) -> bool {
    tile_at(tiles, col, row).map_or(true, Tile::is_solid)
}

/// Cell containing a world point.
#[inline]
pub fn cell_of(point: Vec2, tile_size: f32) -> (i64, i64) {
    ((point.x / tile_size).floor() as i64, (point.y / tile_size).floor() as i64)
}

pub fn cell_bounds(col: i64, row: i64, tile_size: f32) -> Aabb {
    let min = Vec2::new(col as f32, row as f32) * tile_size;
    Aabb { min, max: min + Vec2::splat(tile_size) }
}

pub fn cell_center(col: i64, row: i64, tile_size: f32) -> Vec2 {
    (Vec2::new(col as f32, row as f32) + 0.5) * tile_size
}

/// Deepest-overlapping solid cell for a box, with its penetration.
fn deepest_solid(tiles: &[Vec<Tile>], tile_size: f32, body: &Aabb) -> Option<(Aabb, Vec2)> {
    let (c0, r0) = cell_of(body.min, tile_size);
    let (c1, r1) = cell_of(body.max, tile_size);
    let mut best: Option<(Aabb, Vec2)> = None;
    for row in r0..=r1 {
        for col in c0..=c1 {
            if !solid_at(tiles, col, row) {
                continue;
            }
            let cell = cell_bounds(col, row, tile_size);
            if !body.overlaps(&cell) {
                continue;
            }
            let pen = body.penetration(&cell);
            let deeper = best.map_or(true, |(_, b)| pen.x * pen.y > b.x * b.y);
            if deeper {
                best = Some((cell, pen));
            }
        }
    }
    best
}

pub fn overlaps_solid(tiles: &[Vec<Tile>], tile_size: f32, body: &Aabb) -> bool {
    deepest_solid(tiles, tile_size, body).is_some()
}

// ══════════════════════════════════════════════════════════════
// Resolution
// ══════════════════════════════════════════════════════════════

/// Push a box out of the walls. Returns the corrected center, or `None`
/// when the box was already clear.
///
/// If the passes cannot free the box (it is wedged deep inside a wall), it
/// is moved to the center of the nearest open cell. Bodies are smaller than
/// a cell, so that position is always clear.
pub fn push_out(tiles: &[Vec<Tile>], tile_size: f32, body: Aabb) -> Option<Vec2> {
    let half = body.half_extents();
    let mut center = body.center();
    let mut moved = false;

    for _ in 0..PUSH_PASSES {
        let current = Aabb::from_center(center, half);
        let Some((cell, pen)) = deepest_solid(tiles, tile_size, &current) else {
            return moved.then_some(center);
        };
        let away = center - cell.center();
        if pen.x < pen.y {
            center.x += if away.x < 0.0 { -pen.x } else { pen.x };
        } else {
            center.y += if away.y < 0.0 { -pen.y } else { pen.y };
        }
        moved = true;
    }

    if !overlaps_solid(tiles, tile_size, &Aabb::from_center(center, half)) {
        return Some(center);
    }
    Some(nearest_open_cell(tiles, tile_size, body.center()).unwrap_or(center))
}

pub fn nearest_open_cell(tiles: &[Vec<Tile>], tile_size: f32, from: Vec2) -> Option<Vec2> {
    tiles
        .iter()
        .enumerate()
        .flat_map(|(row, r)| {
            r.iter()
                .enumerate()
                .filter(|(_, t)| !t.is_solid())
                .map(move |(col, _)| cell_center(col as i64, row as i64, tile_size))
        })
        .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::color::Color;

    const TS: f32 = 50.0;

    fn grid(rows: &[&str]) -> Vec<Vec<Tile>> {
        rows.iter()
            .map(|r| r.chars().map(|c| Tile::from_glyph(c).unwrap()).collect())
            .collect()
    }

    fn room() -> Vec<Vec<Tile>> {
        grid(&[
            "=====",
            "=...=",
            "=.=.=",
            "=...=",
            "=====",
        ])
    }

    #[test]
    fn out_of_grid_is_solid() {
        let t = room();
        assert!(solid_at(&t, -1, 0));
        assert!(solid_at(&t, 0, 99));
        assert!(!solid_at(&t, 1, 1));
        assert_eq!(tile_at(&t, 1, 1), Some(Tile::Floor(Color::None)));
    }

    #[test]
    fn clear_box_is_untouched() {
        let t = room();
        let b = Aabb::from_center(cell_center(1, 1, TS), Vec2::splat(18.0));
        assert_eq!(push_out(&t, TS, b), None);
    }

    #[test]
    fn pushes_along_shallow_axis() {
        let t = room();
        // 5 units into the left border wall
        let center = Vec2::new(TS + 18.0 - 5.0, 75.0);
        let fixed = push_out(&t, TS, Aabb::from_center(center, Vec2::splat(18.0))).unwrap();
        assert!((fixed.x - (TS + 18.0)).abs() < 1e-4);
        assert_eq!(fixed.y, 75.0);
        assert!(!overlaps_solid(&t, TS, &Aabb::from_center(fixed, Vec2::splat(18.0))));
    }

    #[test]
    fn corner_needs_two_passes() {
        let t = room();
        let center = Vec2::new(TS + 15.0, TS + 12.0);
        let fixed = push_out(&t, TS, Aabb::from_center(center, Vec2::splat(18.0))).unwrap();
        assert!(!overlaps_solid(&t, TS, &Aabb::from_center(fixed, Vec2::splat(18.0))));
    }

    #[test]
    fn wedged_box_snaps_to_nearest_open_cell() {
        let t = room();
        // dead center of the pillar at (2, 2)
        let center = cell_center(2, 2, TS);
        let fixed = push_out(&t, TS, Aabb::from_center(center, Vec2::splat(18.0))).unwrap();
        assert!(!overlaps_solid(&t, TS, &Aabb::from_center(fixed, Vec2::splat(18.0))));
    }
}
