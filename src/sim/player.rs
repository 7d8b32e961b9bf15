//! Player avatar: movement, auto-fire, abilities, i-frames

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::enemy::Enemy;
use super::map::GameMap;
use super::projectile::{Projectile, ShotFlags};
use super::state::EntityIds;
use crate::consts::*;
use crate::unit_from_angle;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub size: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub speed: f32,
    pub damage: f32,
    pub range: f32,

    // === Fire rate ===
    pub base_fire_rate: f32,
    /// Additive bonus, 0.10 = 10% faster
    pub fire_rate_bonus: f32,
    /// Effective seconds between volleys
    pub fire_rate: f32,
    pub fire_timer: f32,

    // === Abilities ===
    pub has_fire_aura: bool,
    pub fire_aura_damage: f32,
    pub fire_aura_range: f32,
    pub fire_aura_timer: f32,

    pub orbital_count: u32,
    pub orbital_damage: f32,
    pub orbital_angle: f32,
    pub orbital_radius: f32,

    pub ricochet_count: u32,
    pub projectile_count: u32,
    pub regen_rate: f32,
    pub thorns_damage: f32,
    pub lifesteal_chance: f32,
    /// Percent chance (0-100) that a volley crits
    pub crit_chance: f32,
    pub gold_multiplier: f32,
    pub has_frost_shot: bool,
    pub has_explosive_shots: bool,

    // === I-frames ===
    pub invincible_timer: f32,
    /// Cosmetic blink state while invincible
    pub is_flashing: bool,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            size: PLAYER_SIZE,
            hp: PLAYER_MAX_HP,
            max_hp: PLAYER_MAX_HP,
            speed: PLAYER_SPEED,
            damage: PLAYER_DAMAGE,
            range: PLAYER_RANGE,
            base_fire_rate: BASE_FIRE_RATE,
            fire_rate_bonus: 0.0,
            fire_rate: BASE_FIRE_RATE,
            fire_timer: 0.0,
            has_fire_aura: false,
            fire_aura_damage: 0.0,
            fire_aura_range: FIRE_AURA_RANGE,
            fire_aura_timer: 0.0,
            orbital_count: 0,
            orbital_damage: 0.0,
            orbital_angle: 0.0,
            orbital_radius: ORBITAL_RADIUS,
            ricochet_count: 0,
            projectile_count: 1,
            regen_rate: 0.0,
            thorns_damage: 0.0,
            lifesteal_chance: 0.0,
            crit_chance: 0.0,
            gold_multiplier: 1.0,
            has_frost_shot: false,
            has_explosive_shots: false,
            invincible_timer: 0.0,
            is_flashing: false,
        }
    }

    /// Recompute the effective fire interval from base rate and bonus
    pub fn update_fire_rate(&mut self) {
        self.fire_rate = effective_fire_rate(self.base_fire_rate, self.fire_rate_bonus);
    }

    /// Apply damage unless invincible. HP may go negative.
    pub fn take_damage(&mut self, amount: f32) {
        if self.invincible_timer > 0.0 {
            return;
        }
        self.hp -= amount;
        self.invincible_timer = INVINCIBILITY_TIME;
    }

    /// Lifesteal roll after a bullet drops an enemy
    pub fn on_kill<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.lifesteal_chance > 0.0 && rng.random::<f32>() < self.lifesteal_chance {
            self.hp = (self.hp + 1.0).min(self.max_hp);
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    /// Advance one frame.
    ///
    /// Order is fixed: i-frames, regen, X move + resolve, Y move + resolve,
    /// auto-fire, fire aura, orbitals.
    #[allow(clippy::too_many_arguments)]
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        axis: Vec2,
        map: Option<&GameMap>,
        enemies: &mut [Enemy],
        projectiles: &mut Vec<Projectile>,
        ids: &mut EntityIds,
        rng: &mut R,
    ) {
        if self.invincible_timer > 0.0 {
            self.invincible_timer -= dt;
            self.is_flashing = ((self.invincible_timer * 10.0).floor() as i32) % 2 == 0;
        } else {
            self.is_flashing = false;
        }

        if self.regen_rate > 0.0 && self.hp < self.max_hp {
            self.hp = (self.hp + self.regen_rate * dt).min(self.max_hp);
        }

        // Axis passes are separate so the player slides along walls
        self.pos.x += axis.x * self.speed * dt;
        if let Some(map) = map {
            map.resolve_collision(&mut self.pos, self.size);
        }
        self.pos.y += axis.y * self.speed * dt;
        if let Some(map) = map {
            map.resolve_collision(&mut self.pos, self.size);
        }

        self.fire_timer -= dt;
        if self.fire_timer <= 0.0 {
            if let Some(target) = self.find_nearest_enemy(enemies) {
                self.shoot(target, projectiles, ids, rng);
                self.fire_timer = self.fire_rate;
            }
        }

        if self.has_fire_aura {
            self.fire_aura_timer -= dt;
            if self.fire_aura_timer <= 0.0 {
                self.fire_aura_timer = FIRE_AURA_INTERVAL;
                for enemy in enemies.iter_mut() {
                    if enemy.pos.distance(self.pos) < self.fire_aura_range {
                        enemy.hp -= self.fire_aura_damage;
                    }
                }
            }
        }

        if self.orbital_count > 0 {
            self.orbital_angle += ORBITAL_SPIN * dt;
            for orbital in self.orbital_positions() {
                for enemy in enemies.iter_mut() {
                    if enemy.pos.distance(orbital) < ORBITAL_HIT_RADIUS {
                        enemy.hp -= self.orbital_damage * dt * ORBITAL_DPS_FACTOR;
                    }
                }
            }
        }
    }

    /// World positions of the orbiting shields
    pub fn orbital_positions(&self) -> Vec<Vec2> {
        if self.orbital_count == 0 {
            return Vec::new();
        }
        let step = TAU / self.orbital_count as f32;
        (0..self.orbital_count)
            .map(|i| self.pos + unit_from_angle(self.orbital_angle + i as f32 * step) * self.orbital_radius)
            .collect()
    }

    /// Position of the closest enemy strictly inside `range`
    ///
    /// Ties keep the earlier enemy.
    pub fn find_nearest_enemy(&self, enemies: &[Enemy]) -> Option<Vec2> {
        let mut nearest = None;
        let mut min_dist = self.range;
        for enemy in enemies {
            let dist = enemy.pos.distance(self.pos);
            if dist < min_dist {
                min_dist = dist;
                nearest = Some(enemy.pos);
            }
        }
        nearest
    }

    /// Fire a volley of parallel bullets at `target`
    pub fn shoot<R: Rng + ?Sized>(
        &self,
        target: Vec2,
        projectiles: &mut Vec<Projectile>,
        ids: &mut EntityIds,
        rng: &mut R,
    ) {
        let to_target = target - self.pos;
        let base_angle = to_target.y.atan2(to_target.x);
        let forward = unit_from_angle(base_angle);
        let perpendicular = unit_from_angle(base_angle + FRAC_PI_2);

        // One crit roll shared by the whole volley
        let crit = rng.random::<f32>() * 100.0 < self.crit_chance;
        let damage = if crit {
            self.damage * CRIT_MULTIPLIER
        } else {
            self.damage
        };
        let flags = ShotFlags {
            frost: self.has_frost_shot,
            explosive: self.has_explosive_shots,
            enemy: false,
        };

        let count = self.projectile_count;
        for i in 0..count {
            let offset = (i as f32 - (count as f32 - 1.0) / 2.0) * MULTISHOT_SPACING;
            let spawn = self.pos + perpendicular * offset;
            // Aim from each bullet's own spawn to keep the fan parallel
            let aim = spawn + forward * AIM_PROJECTION;
            let mut projectile = Projectile::new(ids.next(), spawn, aim, damage, flags);
            projectile.ricochet_count = self.ricochet_count;
            projectiles.push(projectile);
        }
    }
}

/// `max(MIN_FIRE_INTERVAL, base / (1 + bonus))`
pub fn effective_fire_rate(base: f32, bonus: f32) -> f32 {
    (base / (1.0 + bonus)).max(MIN_FIRE_INTERVAL)
}

/// Normalize a raw direction so diagonals are not faster
pub fn movement_axis(x: f32, y: f32) -> Vec2 {
    if x != 0.0 && y != 0.0 {
        Vec2::new(x, y) / (x * x + y * y).sqrt()
    } else {
        Vec2::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::Rect;
    use crate::sim::enemy::EnemyKind;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(1)
    }

    #[test]
    fn test_invincibility_blocks_second_hit() {
        let mut player = Player::new(Vec2::ZERO);
        player.hp = 10.0;
        player.take_damage(5.0);
        player.take_damage(5.0);
        assert_eq!(player.hp, 5.0);
        assert_eq!(player.invincible_timer, INVINCIBILITY_TIME);
    }

    #[test]
    fn test_damage_is_not_clamped() {
        let mut player = Player::new(Vec2::ZERO);
        player.hp = 3.0;
        player.take_damage(10.0);
        assert_eq!(player.hp, -7.0);
        assert!(player.is_dead());
    }

    #[test]
    fn test_iframes_expire() {
        let mut player = Player::new(Vec2::ZERO);
        let mut ids = EntityIds::default();
        let mut projectiles = Vec::new();
        player.take_damage(1.0);
        for _ in 0..12 {
            player.update(0.1, Vec2::ZERO, None, &mut [], &mut projectiles, &mut ids, &mut rng());
        }
        assert!(player.invincible_timer <= 0.0);
        assert!(!player.is_flashing);
        player.take_damage(1.0);
        assert_eq!(player.hp, 98.0);
    }

    #[test]
    fn test_regen_clamps_to_max() {
        let mut player = Player::new(Vec2::ZERO);
        player.hp = 99.5;
        player.regen_rate = 5.0;
        player.update(1.0, Vec2::ZERO, None, &mut [], &mut Vec::new(), &mut EntityIds::default(), &mut rng());
        assert_eq!(player.hp, player.max_hp);
    }

    #[test]
    fn test_axis_passes_slide_along_wall() {
        // Wall directly right of the player; moving diagonally still makes Y progress
        let map = GameMap::with_walls(vec![Rect::new(15.0, -500.0, 100.0, 1000.0)]);
        let mut player = Player::new(Vec2::ZERO);
        let axis = movement_axis(1.0, 1.0);
        for _ in 0..10 {
            player.update(0.1, axis, Some(&map), &mut [], &mut Vec::new(), &mut EntityIds::default(), &mut rng());
        }
        assert!(player.pos.x <= 1.0 + 1e-3);
        assert!(player.pos.y > 100.0);
    }

    #[test]
    fn test_movement_axis_normalizes_diagonal() {
        let axis = movement_axis(-1.0, 1.0);
        assert!((axis.length() - 1.0).abs() < 1e-6);
        assert_eq!(movement_axis(1.0, 0.0), Vec2::X);
    }

    #[test]
    fn test_auto_fire_targets_nearest_in_range() {
        let mut player = Player::new(Vec2::ZERO);
        let mut enemies = vec![
            Enemy::new(0, EnemyKind::Chaser, Vec2::new(300.0, 0.0)),
            Enemy::new(1, EnemyKind::Chaser, Vec2::new(0.0, -200.0)),
            Enemy::new(2, EnemyKind::Chaser, Vec2::new(0.0, 500.0)),
        ];
        let mut projectiles = Vec::new();
        player.update(0.01, Vec2::ZERO, None, &mut enemies, &mut projectiles, &mut EntityIds::default(), &mut rng());
        assert_eq!(projectiles.len(), 1);
        assert!(projectiles[0].vel.y < 0.0);
        assert!(projectiles[0].vel.x.abs() < 1e-3);
        assert_eq!(player.fire_timer, player.fire_rate);
    }

    #[test]
    fn test_no_fire_without_target() {
        let mut player = Player::new(Vec2::ZERO);
        let mut enemies = vec![Enemy::new(0, EnemyKind::Chaser, Vec2::new(400.0, 0.0))];
        let mut projectiles = Vec::new();
        player.update(0.01, Vec2::ZERO, None, &mut enemies, &mut projectiles, &mut EntityIds::default(), &mut rng());
        assert!(projectiles.is_empty());
        // Timer keeps counting down so the next target fires immediately
        assert!(player.fire_timer < 0.0);
    }

    #[test]
    fn test_multishot_is_parallel_fan() {
        let mut player = Player::new(Vec2::ZERO);
        player.projectile_count = 3;
        player.ricochet_count = 2;
        let mut projectiles = Vec::new();
        player.shoot(Vec2::new(100.0, 0.0), &mut projectiles, &mut EntityIds::default(), &mut rng());
        assert_eq!(projectiles.len(), 3);
        let ys: Vec<f32> = projectiles.iter().map(|p| p.pos.y).collect();
        assert!((ys[0] + 12.0).abs() < 1e-3);
        assert!(ys[1].abs() < 1e-3);
        assert!((ys[2] - 12.0).abs() < 1e-3);
        for p in &projectiles {
            assert!((p.vel - Vec2::new(600.0, 0.0)).length() < 1e-2);
            assert_eq!(p.ricochet_count, 2);
        }
    }

    #[test]
    fn test_crit_doubles_whole_volley() {
        let mut player = Player::new(Vec2::ZERO);
        player.projectile_count = 2;
        player.crit_chance = 100.0;
        let mut projectiles = Vec::new();
        player.shoot(Vec2::X, &mut projectiles, &mut EntityIds::default(), &mut rng());
        assert!(projectiles.iter().all(|p| p.damage == 20.0));
    }

    #[test]
    fn test_fire_aura_ticks_every_half_second() {
        let mut player = Player::new(Vec2::ZERO);
        player.has_fire_aura = true;
        player.fire_aura_damage = 25.0;
        player.range = 0.0;
        let mut enemies = vec![
            Enemy::new(0, EnemyKind::Tank, Vec2::new(50.0, 0.0)),
            Enemy::new(1, EnemyKind::Tank, Vec2::new(150.0, 0.0)),
        ];
        for _ in 0..10 {
            player.update(0.1, Vec2::ZERO, None, &mut enemies, &mut Vec::new(), &mut EntityIds::default(), &mut rng());
        }
        // Two aura ticks within one second
        assert_eq!(enemies[0].hp, 80.0 - 50.0);
        assert_eq!(enemies[1].hp, 80.0);
    }

    #[test]
    fn test_orbitals_deal_contact_dps() {
        let mut player = Player::new(Vec2::ZERO);
        player.range = 0.0;
        player.orbital_count = 1;
        player.orbital_damage = 60.0;
        let mut enemies = vec![Enemy::new(0, EnemyKind::Tank, Vec2::new(60.0, 0.0))];
        // Angle after the update is 0.02 rad, the shield sits almost on the enemy
        player.update(0.01, Vec2::ZERO, None, &mut enemies, &mut Vec::new(), &mut EntityIds::default(), &mut rng());
        assert!((enemies[0].hp - (80.0 - 60.0 * 0.01 * 2.0)).abs() < 1e-3);
    }

    #[test]
    fn test_lifesteal_heals_one() {
        let mut player = Player::new(Vec2::ZERO);
        player.hp = 50.0;
        player.lifesteal_chance = 1.0;
        player.on_kill(&mut rng());
        assert_eq!(player.hp, 51.0);
        player.hp = player.max_hp;
        player.on_kill(&mut rng());
        assert_eq!(player.hp, player.max_hp);
    }

    proptest! {
        #[test]
        fn prop_fire_rate_floor(base in 0.0f32..10.0, bonus in 0.0f32..1000.0) {
            prop_assert!(effective_fire_rate(base, bonus) >= MIN_FIRE_INTERVAL);
        }
    }
}
