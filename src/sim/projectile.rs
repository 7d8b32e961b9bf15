//! Straight-line projectiles with lifetime and ricochet

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use crate::consts::*;

/// Who fired a projectile and what it does on hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShotFlags {
    pub frost: bool,
    pub explosive: bool,
    pub enemy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub damage: f32,
    pub flags: ShotFlags,
    /// Seconds left before expiry
    pub life_time: f32,
    /// Wall bounces remaining
    pub ricochet_count: u32,
    pub marked_for_deletion: bool,
}

impl Projectile {
    /// Create a projectile aimed from `pos` at `target`.
    ///
    /// Direction is fixed at creation. A zero-length aim fires along +x.
    /// Zero or NaN damage falls back to [`DEFAULT_PROJECTILE_DAMAGE`].
    pub fn new(id: u32, pos: Vec2, target: Vec2, damage: f32, flags: ShotFlags) -> Self {
        let speed = if flags.enemy {
            ENEMY_BULLET_SPEED
        } else {
            PLAYER_BULLET_SPEED
        };
        let dir = target - pos;
        let dist = dir.length();
        let vel = if dist > 0.0 {
            dir / dist * speed
        } else {
            Vec2::new(speed, 0.0)
        };
        let damage = if damage == 0.0 || damage.is_nan() {
            DEFAULT_PROJECTILE_DAMAGE
        } else {
            damage
        };
        Self {
            id,
            pos,
            vel,
            size: PROJECTILE_SIZE,
            damage,
            flags,
            life_time: PROJECTILE_LIFETIME,
            ricochet_count: 0,
            marked_for_deletion: false,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.life_time -= dt;
        if self.life_time <= 0.0 {
            self.marked_for_deletion = true;
        }
    }

    /// Reflect off `wall` if a ricochet is left. Returns false when spent.
    ///
    /// Only the velocity component of the penetrated axis is negated and the
    /// projectile is pushed back out along that axis.
    pub fn bounce(&mut self, wall: &Rect) -> bool {
        if self.ricochet_count == 0 {
            return false;
        }
        self.ricochet_count -= 1;

        let (side, offset) = wall.penetration(self.pos, PROJECTILE_WALL_PROBE).push_out();
        if side.is_horizontal() {
            self.vel.x = -self.vel.x;
        } else {
            self.vel.y = -self.vel.y;
        }
        self.pos += offset;
        true
    }
}
