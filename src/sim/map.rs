//! Chunked obstacle map
//!
//! The world is an unbounded plane cut into square chunks. A chunk's walls
//! are generated the first time it is requested and cached forever. Only the
//! 3x3 neighborhood around the player is collidable, rebuilt every frame.

use std::collections::HashMap;

use glam::Vec2;
use rand::Rng;

use super::collision::Rect;
use crate::consts::*;

/// Chunk coordinate
pub type ChunkKey = (i32, i32);

#[derive(Debug, Clone, Default)]
pub struct GameMap {
    chunks: HashMap<ChunkKey, Vec<Rect>>,
    /// Active collision set, in neighborhood order
    walls: Vec<Rect>,
}

/// Chunk containing a world position
pub fn chunk_key(pos: Vec2) -> ChunkKey {
    (
        (pos.x / CHUNK_SIZE).floor() as i32,
        (pos.y / CHUNK_SIZE).floor() as i32,
    )
}

impl GameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream chunks around `center` and rebuild the active wall list
    pub fn update<R: Rng + ?Sized>(&mut self, center: Vec2, rng: &mut R) {
        let (cx, cy) = chunk_key(center);
        self.walls.clear();
        for x in cx - 1..=cx + 1 {
            for y in cy - 1..=cy + 1 {
                let walls = self
                    .chunks
                    .entry((x, y))
                    .or_insert_with(|| generate_chunk(x, y, rng));
                self.walls.extend_from_slice(walls);
            }
        }
    }

    /// Walls currently collidable
    pub fn walls(&self) -> &[Rect] {
        &self.walls
    }

    /// Cached walls for a chunk, if it has been generated
    pub fn chunk(&self, key: ChunkKey) -> Option<&[Rect]> {
        self.chunks.get(&key).map(Vec::as_slice)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// First active wall overlapping a centered box of side `size`
    pub fn check_collision(&self, pos: Vec2, size: f32) -> Option<Rect> {
        self.walls.iter().copied().find(|w| w.overlaps_box(pos, size))
    }

    /// Push a box out of the first wall it overlaps. Returns true if moved.
    ///
    /// Only a single wall is resolved per call; a box wedged between two
    /// walls may remain inside the second one.
    pub fn resolve_collision(&self, pos: &mut Vec2, size: f32) -> bool {
        let Some(wall) = self.check_collision(*pos, size) else {
            return false;
        };
        let (_, offset) = wall.penetration(*pos, size / 2.0).push_out();
        *pos += offset;
        true
    }

    #[cfg(test)]
    pub(crate) fn with_walls(walls: Vec<Rect>) -> Self {
        Self {
            chunks: HashMap::new(),
            walls,
        }
    }
}

fn generate_chunk<R: Rng + ?Sized>(cx: i32, cy: i32, rng: &mut R) -> Vec<Rect> {
    let base_x = cx as f32 * CHUNK_SIZE;
    let base_y = cy as f32 * CHUNK_SIZE;
    let count = WALLS_PER_CHUNK_MIN + (rng.random::<f32>() * WALLS_PER_CHUNK_EXTRA as f32) as u32;

    let mut walls = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let w = WALL_MIN_SIDE + rng.random::<f32>() * WALL_SIDE_RANGE;
        let h = WALL_MIN_SIDE + rng.random::<f32>() * WALL_SIDE_RANGE;
        let x = base_x + rng.random::<f32>() * (CHUNK_SIZE - w);
        let y = base_y + rng.random::<f32>() * (CHUNK_SIZE - h);
        // Keep the spawn point open
        if x.abs() < ORIGIN_CLEARANCE && y.abs() < ORIGIN_CLEARANCE {
            continue;
        }
        walls.push(Rect::new(x, y, w, h));
    }
    log::debug!("Generated chunk ({}, {}) with {} walls", cx, cy, walls.len());
    walls
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_update_loads_neighborhood() {
        let mut map = GameMap::new();
        let mut rng = Pcg32::seed_from_u64(7);
        map.update(Vec2::new(10.0, 10.0), &mut rng);
        assert_eq!(map.chunk_count(), 9);
        for x in -1..=1 {
            for y in -1..=1 {
                assert!(map.chunk((x, y)).is_some());
            }
        }
        let total: usize = (-1..=1)
            .flat_map(|x| (-1..=1).map(move |y| (x, y)))
            .map(|k| map.chunk(k).map_or(0, <[Rect]>::len))
            .sum();
        assert_eq!(map.walls().len(), total);
    }

    #[test]
    fn test_far_chunks_are_not_collidable() {
        let mut map = GameMap::new();
        let mut rng = Pcg32::seed_from_u64(3);
        map.update(Vec2::ZERO, &mut rng);
        map.update(Vec2::new(5500.0, 0.0), &mut rng);
        // Chunks around the origin stay cached but drop out of the active set
        let origin = map.chunk((0, 0)).map(<[Rect]>::to_vec).unwrap_or_default();
        for wall in &origin {
            assert!(!map.walls().contains(wall));
        }
        assert!(map.walls().iter().all(|w| w.x >= 4000.0));
    }

    #[test]
    fn test_chunk_walls_respect_bounds() {
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..50 {
            let walls = generate_chunk(2, -3, &mut rng);
            assert!(walls.len() <= 9);
            for w in walls {
                assert!(w.w >= 64.0 && w.w <= 192.0);
                assert!(w.h >= 64.0 && w.h <= 192.0);
                assert!(w.x >= 2000.0 && w.right() <= 3000.0 + 0.01);
                assert!(w.y >= -3000.0 && w.bottom() <= -2000.0 + 0.01);
            }
        }
    }

    #[test]
    fn test_origin_chunk_keeps_spawn_clear() {
        let mut rng = Pcg32::seed_from_u64(99);
        for _ in 0..100 {
            for w in generate_chunk(0, 0, &mut rng) {
                assert!(!(w.x.abs() < 200.0 && w.y.abs() < 200.0));
            }
        }
    }

    #[test]
    fn test_resolve_collision_pushes_out() {
        let map = GameMap::with_walls(vec![Rect::new(100.0, 0.0, 100.0, 100.0)]);
        let mut pos = Vec2::new(90.0, 50.0);
        assert!(map.resolve_collision(&mut pos, 28.0));
        assert!((pos.x - 86.0).abs() < 1e-4);
        assert_eq!(pos.y, 50.0);
        assert!(map.check_collision(pos, 28.0).is_none());
        assert!(!map.resolve_collision(&mut pos, 28.0));
    }

    #[test]
    fn test_check_collision_returns_first_match() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(10.0, 10.0, 50.0, 50.0);
        let map = GameMap::with_walls(vec![a, b]);
        assert_eq!(map.check_collision(Vec2::new(30.0, 30.0), 4.0), Some(a));
    }

    proptest! {
        #[test]
        fn prop_chunk_generation_is_idempotent(
            seed in any::<u64>(),
            x in -5000.0f32..5000.0,
            y in -5000.0f32..5000.0,
        ) {
            let mut map = GameMap::new();
            let mut rng = Pcg32::seed_from_u64(seed);
            let pos = Vec2::new(x, y);
            map.update(pos, &mut rng);
            let (cx, cy) = chunk_key(pos);
            let before: Vec<Vec<Rect>> = (cx - 1..=cx + 1)
                .flat_map(|i| (cy - 1..=cy + 1).map(move |j| (i, j)))
                .map(|k| map.chunk(k).map(<[Rect]>::to_vec).unwrap_or_default())
                .collect();
            let active = map.walls().to_vec();

            for _ in 0..3 {
                map.update(pos, &mut rng);
            }
            let after: Vec<Vec<Rect>> = (cx - 1..=cx + 1)
                .flat_map(|i| (cy - 1..=cy + 1).map(move |j| (i, j)))
                .map(|k| map.chunk(k).map(<[Rect]>::to_vec).unwrap_or_default())
                .collect();
            prop_assert_eq!(before, after);
            prop_assert_eq!(active, map.walls().to_vec());
            prop_assert_eq!(map.chunk_count(), 9);
        }
    }
}
