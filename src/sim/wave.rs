//! Wave director: pacing, enemy mix, stat scaling, modifiers, challenges

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::enemy::{Enemy, EnemyKind};
use super::map::GameMap;
use crate::consts::*;
use crate::unit_from_angle;

/// Per-wave multiplier set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveModifier {
    Speed,
    Horde,
    Armored,
    Elite,
}

impl WaveModifier {
    pub const ALL: [WaveModifier; 4] = [
        WaveModifier::Speed,
        WaveModifier::Horde,
        WaveModifier::Armored,
        WaveModifier::Elite,
    ];

    pub fn speed_mult(self) -> f64 {
        match self {
            WaveModifier::Speed => 1.4,
            WaveModifier::Armored => 0.8,
            WaveModifier::Horde | WaveModifier::Elite => 1.0,
        }
    }

    pub fn hp_mult(self) -> f64 {
        match self {
            WaveModifier::Speed => 1.0,
            WaveModifier::Horde => 0.7,
            WaveModifier::Armored => 1.8,
            WaveModifier::Elite => 2.5,
        }
    }

    pub fn count_mult(self) -> f64 {
        match self {
            WaveModifier::Horde => 1.5,
            WaveModifier::Elite => 0.5,
            WaveModifier::Speed | WaveModifier::Armored => 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WaveModifier::Speed => "SPEED WAVE",
            WaveModifier::Horde => "HORDE WAVE",
            WaveModifier::Armored => "ARMORED WAVE",
            WaveModifier::Elite => "ELITE WAVE",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            WaveModifier::Speed => "Enemies move faster.",
            WaveModifier::Horde => "More, weaker enemies.",
            WaveModifier::Armored => "Fewer, tankier enemies.",
            WaveModifier::Elite => "Fewer, much stronger enemies.",
        }
    }
}

/// Optional bonus objective evaluated at wave end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Challenge {
    /// End the wave with at least the HP it started with
    Flawless,
    /// Clear with 15s or more left on the wave timer
    Speed,
    /// End the wave at 90% HP or better
    Survivor,
}

impl Challenge {
    pub const ALL: [Challenge; 3] = [Challenge::Flawless, Challenge::Speed, Challenge::Survivor];

    pub fn label(self) -> &'static str {
        match self {
            Challenge::Flawless => "FLAWLESS",
            Challenge::Speed => "SPEED RUN",
            Challenge::Survivor => "SURVIVOR",
        }
    }
}

pub const CHALLENGE_CHANCE: f32 = 0.4;
pub const SPEED_CHALLENGE_TIME_LEFT: f32 = 15.0;
pub const SURVIVOR_HP_FRACTION: f32 = 0.9;

/// Outcome of the wave's challenge, if it had one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChallengeResult {
    pub challenge: Option<Challenge>,
    pub success: bool,
}

/// Signals raised when a wave finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveEvent {
    /// Wave cleared, more waves remain in this world
    WaveComplete(ChallengeResult),
    /// Final wave of the world cleared
    WorldClear(ChallengeResult),
}

/// Player numbers the director reads for challenges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerVitals {
    pub pos: Vec2,
    pub hp: f32,
    pub max_hp: f32,
}

/// `(1 + wave*0.4) * 1.06^(wave-1)`
pub fn hp_scale(wave: u32) -> f64 {
    (1.0 + wave as f64 * 0.4) * 1.06f64.powf(wave as f64 - 1.0)
}

/// `1.08^(wave-1)`
pub fn damage_scale(wave: u32) -> f64 {
    1.08f64.powf(wave as f64 - 1.0)
}

/// `floor(xp * (1 + wave*0.15) * 1.05^(wave-1))`
pub fn scaled_xp(base: f32, wave: u32) -> f32 {
    (base as f64 * (1.0 + wave as f64 * 0.15) * 1.05f64.powf(wave as f64 - 1.0)).floor() as f32
}

/// `floor(base * mult)`, computed in double precision
pub fn scaled_stat(base: f32, mult: f64) -> f32 {
    (base as f64 * mult).floor() as f32
}

pub fn is_boss_wave(wave: u32) -> bool {
    wave % BOSS_WAVE_INTERVAL == 0
}

/// Non-boss enemy type for a uniform roll in [0, 1)
///
/// Rarer types unlock at waves 4/6/7/9/12/15 and are checked rarest first.
pub fn pick_enemy_kind(wave: u32, roll: f32) -> EnemyKind {
    if wave >= 15 && roll < 0.1 {
        EnemyKind::Teleporter
    } else if wave >= 12 && roll < 0.25 {
        EnemyKind::Splitter
    } else if wave >= 9 && roll < 0.35 {
        EnemyKind::Healer
    } else if wave >= 7 && roll < 0.5 {
        EnemyKind::Swarm
    } else if wave >= 6 && roll < 0.7 {
        EnemyKind::Tank
    } else if wave >= 4 && roll < 0.85 {
        EnemyKind::Shooter
    } else {
        EnemyKind::Chaser
    }
}

/// Per-run wave state machine (inactive, active, complete)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveManager {
    /// 1-based wave number
    pub wave: u32,
    pub wave_active: bool,
    /// Seconds left on the wave clock (challenges only)
    pub timer: f32,
    pub wave_time: f32,
    pub enemies_to_spawn: u32,
    pub total_enemies: u32,
    pub spawned_this_wave: u32,
    pub spawn_timer: f32,
    /// Seconds between successful spawns
    pub spawn_rate: f32,
    pub modifier: Option<WaveModifier>,
    pub challenge: Option<Challenge>,
    pub is_boss_wave: bool,
    pub player_hp_at_wave_start: f32,
    /// Waves in the current world
    pub world_waves: u32,
    /// Carried from the world descriptor; scaling is driven by wave alone
    pub difficulty_offset: u32,
}

impl Default for WaveManager {
    fn default() -> Self {
        Self::new(u32::MAX, 0)
    }
}

impl WaveManager {
    pub fn new(world_waves: u32, difficulty_offset: u32) -> Self {
        Self {
            wave: 1,
            wave_active: false,
            timer: WAVE_TIME,
            wave_time: WAVE_TIME,
            enemies_to_spawn: 0,
            total_enemies: 0,
            spawned_this_wave: 0,
            spawn_timer: 0.0,
            spawn_rate: 1.0,
            modifier: None,
            challenge: None,
            is_boss_wave: false,
            player_hp_at_wave_start: PLAYER_MAX_HP,
            world_waves,
            difficulty_offset,
        }
    }

    /// Arm the current wave: roll challenge and modifier, size the spawn queue
    pub fn start_wave<R: Rng + ?Sized>(&mut self, player_hp: f32, rng: &mut R) {
        self.wave_active = true;
        self.timer = self.wave_time;
        self.player_hp_at_wave_start = player_hp;

        self.challenge = None;
        if self.wave > 2 && rng.random::<f32>() < CHALLENGE_CHANCE {
            let challenge = Challenge::ALL[rng.random_range(0..Challenge::ALL.len())];
            log::info!("Wave challenge: {}", challenge.label());
            self.challenge = Some(challenge);
        }

        self.modifier = None;
        if self.wave >= 3 && self.wave % 3 == 0 && !is_boss_wave(self.wave) {
            let modifier = WaveModifier::ALL[rng.random_range(0..WaveModifier::ALL.len())];
            log::info!("{}!", modifier.name());
            self.modifier = Some(modifier);
        }

        let base = 5 + self.wave * 3;
        self.enemies_to_spawn = match self.modifier {
            Some(m) => (base as f64 * m.count_mult()).floor() as u32,
            None => base,
        };
        self.spawn_rate = (1.0 - self.wave as f32 * 0.1).max(0.5);
        self.spawned_this_wave = 0;

        self.is_boss_wave = is_boss_wave(self.wave);
        if self.is_boss_wave {
            self.enemies_to_spawn = 1 + 12 + rng.random_range(0..4);
            self.modifier = None;
            log::info!("BOSS WAVE {}!", self.wave);
        }
        self.total_enemies = self.enemies_to_spawn;

        log::info!(
            "Starting wave {}: {} enemies, rate {:.2}s{}",
            self.wave,
            self.enemies_to_spawn,
            self.spawn_rate,
            self.modifier.map(|m| format!(" [{}]", m.name())).unwrap_or_default()
        );
    }

    /// Advance pacing, push new enemies, and report completion.
    ///
    /// A wave completes exactly when the spawn queue is empty and no enemy
    /// is alive.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        player: Option<PlayerVitals>,
        map: &GameMap,
        enemies: &mut Vec<Enemy>,
        rng: &mut R,
    ) -> Option<WaveEvent> {
        if !self.wave_active {
            return None;
        }
        self.timer -= dt;

        if self.enemies_to_spawn > 0 {
            self.spawn_timer -= dt;
            if self.spawn_timer <= 0.0 {
                let spawned = player.is_some_and(|p| self.spawn_enemy(p.pos, map, enemies, rng));
                if spawned {
                    self.spawn_timer = self.spawn_rate;
                    self.enemies_to_spawn -= 1;
                } else {
                    self.spawn_timer = SPAWN_RETRY_DELAY;
                }
            }
        }

        if self.enemies_to_spawn == 0 && enemies.is_empty() {
            return Some(self.end_wave(player));
        }
        None
    }

    /// One spawn attempt burst. Returns false if no open point was found.
    pub fn spawn_enemy<R: Rng + ?Sized>(
        &mut self,
        player_pos: Vec2,
        map: &GameMap,
        enemies: &mut Vec<Enemy>,
        rng: &mut R,
    ) -> bool {
        for _ in 0..SPAWN_ATTEMPTS {
            let angle = rng.random::<f32>() * TAU;
            let distance = SPAWN_MIN_DISTANCE + rng.random::<f32>() * SPAWN_DISTANCE_RANGE;
            let pos = player_pos + unit_from_angle(angle) * distance;
            if map.check_collision(pos, SPAWN_CLEARANCE).is_some() {
                continue;
            }

            let kind = if self.is_boss_wave && self.spawned_this_wave == 0 {
                EnemyKind::Boss
            } else {
                pick_enemy_kind(self.wave, rng.random::<f32>())
            };

            let boss_mult = if self.is_boss_wave {
                BOSS_HP_MULTIPLIER as f64
            } else {
                1.0
            };
            let mut enemy = Enemy::new(0, kind, pos);
            // The boss multiplier covers every spawn on a boss wave
            enemy.hp = (enemy.hp as f64 * hp_scale(self.wave) * boss_mult).floor() as f32;
            enemy.damage = scaled_stat(enemy.damage, damage_scale(self.wave));
            if let Some(m) = self.modifier {
                enemy.hp = scaled_stat(enemy.hp, m.hp_mult());
                enemy.speed = scaled_stat(enemy.speed, m.speed_mult());
                enemy.base_speed = enemy.speed;
            }
            enemy.xp_value = scaled_xp(enemy.xp_value, self.wave);
            enemy.max_hp = enemy.hp;
            enemies.push(enemy);

            if kind == EnemyKind::Swarm {
                self.spawn_swarm_cluster(pos, map, enemies, rng);
            }

            self.spawned_this_wave += 1;
            return true;
        }
        false
    }

    /// 2-4 extra swarmers around a swarm spawn
    fn spawn_swarm_cluster<R: Rng + ?Sized>(
        &self,
        center: Vec2,
        map: &GameMap,
        enemies: &mut Vec<Enemy>,
        rng: &mut R,
    ) {
        let extra = 2 + rng.random_range(0..3);
        for _ in 0..extra {
            let angle = rng.random::<f32>() * TAU;
            let dist = 30.0 + rng.random::<f32>() * 40.0;
            let pos = center + unit_from_angle(angle) * dist;
            if map.check_collision(pos, EnemyKind::Swarm.base_stats().size).is_some() {
                continue;
            }
            let mut swarm = Enemy::new(0, EnemyKind::Swarm, pos);
            swarm.hp = scaled_stat(swarm.hp, hp_scale(self.wave));
            swarm.damage = scaled_stat(swarm.damage, damage_scale(self.wave));
            swarm.xp_value = scaled_xp(swarm.xp_value, self.wave);
            swarm.max_hp = swarm.hp;
            enemies.push(swarm);
        }
    }

    /// Close the wave and evaluate its challenge
    pub fn end_wave(&mut self, player: Option<PlayerVitals>) -> WaveEvent {
        self.wave_active = false;
        log::info!("Wave {} cleared", self.wave);

        let mut result = ChallengeResult {
            challenge: self.challenge,
            success: false,
        };
        if let (Some(challenge), Some(p)) = (self.challenge, player) {
            result.success = match challenge {
                Challenge::Flawless => p.hp >= self.player_hp_at_wave_start,
                Challenge::Speed => self.timer >= SPEED_CHALLENGE_TIME_LEFT,
                Challenge::Survivor => p.hp >= p.max_hp * SURVIVOR_HP_FRACTION,
            };
            log::info!(
                "Challenge {}: {}",
                challenge.label(),
                if result.success { "COMPLETE" } else { "FAILED" }
            );
        }

        if self.wave >= self.world_waves {
            log::info!("World cleared at wave {}", self.wave);
            WaveEvent::WorldClear(result)
        } else {
            WaveEvent::WaveComplete(result)
        }
    }

    /// Queued plus live enemies
    pub fn remaining(&self, live: usize) -> usize {
        self.enemies_to_spawn as usize + live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::Rect;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn vitals(hp: f32) -> Option<PlayerVitals> {
        Some(PlayerVitals {
            pos: Vec2::ZERO,
            hp,
            max_hp: 100.0,
        })
    }

    #[test]
    fn test_scaling_formulas() {
        assert_eq!(scaled_stat(30.0, hp_scale(1)), 42.0);
        assert_eq!(scaled_stat(10.0, damage_scale(1)), 10.0);
        assert_eq!(scaled_xp(10.0, 1), 11.0);
        // Wave 10: (1 + 4) * 1.06^9 = 8.447...
        assert_eq!(scaled_stat(30.0, hp_scale(10)), 253.0);
        assert_eq!(scaled_stat(10.0, damage_scale(10)), 19.0);
    }

    #[test]
    fn test_pick_enemy_kind_thresholds() {
        assert_eq!(pick_enemy_kind(3, 0.0), EnemyKind::Chaser);
        assert_eq!(pick_enemy_kind(4, 0.84), EnemyKind::Shooter);
        assert_eq!(pick_enemy_kind(4, 0.85), EnemyKind::Chaser);
        assert_eq!(pick_enemy_kind(6, 0.1), EnemyKind::Tank);
        assert_eq!(pick_enemy_kind(7, 0.49), EnemyKind::Swarm);
        assert_eq!(pick_enemy_kind(9, 0.3), EnemyKind::Healer);
        assert_eq!(pick_enemy_kind(12, 0.2), EnemyKind::Splitter);
        assert_eq!(pick_enemy_kind(14, 0.05), EnemyKind::Splitter);
        assert_eq!(pick_enemy_kind(15, 0.05), EnemyKind::Teleporter);
        assert_eq!(pick_enemy_kind(20, 0.99), EnemyKind::Chaser);
    }

    #[test]
    fn test_start_wave_counts() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut wm = WaveManager::new(30, 0);
        wm.start_wave(100.0, &mut rng);
        assert!(wm.wave_active);
        assert_eq!(wm.enemies_to_spawn, 8);
        assert_eq!(wm.spawn_rate, 0.9);
        assert!(wm.challenge.is_none());
        assert!(wm.modifier.is_none());

        wm.wave = 8;
        wm.start_wave(100.0, &mut rng);
        assert_eq!(wm.enemies_to_spawn, 29);
        assert_eq!(wm.spawn_rate, 0.5);
        assert!(wm.modifier.is_none());
    }

    #[test]
    fn test_modifier_waves() {
        let mut rng = Pcg32::seed_from_u64(9);
        for _ in 0..20 {
            let mut wm = WaveManager::new(30, 0);
            wm.wave = 6;
            wm.start_wave(100.0, &mut rng);
            let m = wm.modifier.expect("wave 6 always has a modifier");
            assert_eq!(wm.enemies_to_spawn, (23.0 * m.count_mult()).floor() as u32);
        }
        let mut wm = WaveManager::new(30, 0);
        wm.wave = 15;
        wm.start_wave(100.0, &mut rng);
        assert!(wm.modifier.is_none());
        assert!(wm.is_boss_wave);
    }

    #[test]
    fn test_boss_wave_spawns_boss_first() {
        let mut rng = Pcg32::seed_from_u64(77);
        let map = GameMap::new();
        for _ in 0..10 {
            let mut wm = WaveManager::new(30, 0);
            wm.wave = 5;
            wm.start_wave(100.0, &mut rng);
            assert!(wm.is_boss_wave);
            assert!(wm.modifier.is_none());
            assert!((13..=16).contains(&wm.enemies_to_spawn));

            let queued = wm.enemies_to_spawn;
            let mut enemies = Vec::new();
            let mut spawns = 0;
            while wm.enemies_to_spawn > 0 {
                let before = enemies.len();
                assert!(wm.spawn_enemy(Vec2::ZERO, &map, &mut enemies, &mut rng));
                wm.enemies_to_spawn -= 1;
                if spawns == 0 {
                    assert_eq!(enemies[before].kind(), EnemyKind::Boss);
                    // 500 * 3.0 * 1.06^4 * 3
                    assert_eq!(enemies[before].hp, 5681.0);
                } else {
                    assert_ne!(enemies[before].kind(), EnemyKind::Boss);
                }
                spawns += 1;
            }
            assert_eq!(spawns, queued);
            assert!((12..=15).contains(&(spawns - 1)));
        }
    }

    #[test]
    fn test_spawn_distance_and_retry() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut wm = WaveManager::new(30, 0);
        wm.start_wave(100.0, &mut rng);
        let mut enemies = Vec::new();
        assert!(wm.spawn_enemy(Vec2::ZERO, &GameMap::new(), &mut enemies, &mut rng));
        let d = enemies[0].pos.length();
        assert!((700.0..=800.0).contains(&d));

        // Everything blocked: retry after 0.1s without consuming budget
        let blocked = GameMap::with_walls(vec![Rect::new(-2000.0, -2000.0, 4000.0, 4000.0)]);
        let queued = wm.enemies_to_spawn;
        wm.spawn_timer = 0.0;
        let event = wm.update(0.01, vitals(100.0), &blocked, &mut enemies, &mut rng);
        assert!(event.is_none());
        assert_eq!(wm.enemies_to_spawn, queued);
        assert_eq!(wm.spawn_timer, SPAWN_RETRY_DELAY);
    }

    #[test]
    fn test_modifier_scaling_applied() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut wm = WaveManager::new(30, 0);
        wm.wave = 3;
        wm.start_wave(100.0, &mut rng);
        wm.modifier = Some(WaveModifier::Armored);
        let mut enemies = Vec::new();
        // Wave 3 only rolls chasers
        assert!(wm.spawn_enemy(Vec2::ZERO, &GameMap::new(), &mut enemies, &mut rng));
        let e = &enemies[0];
        // floor(30 * 2.2 * 1.1236) = 74, then floor(74 * 1.8) = 133
        assert_eq!(e.hp, 133.0);
        assert_eq!(e.max_hp, 133.0);
        assert_eq!(e.speed, 80.0);
        assert_eq!(e.base_speed, 80.0);
    }

    #[test]
    fn test_swarm_spawns_cluster() {
        let mut rng = Pcg32::seed_from_u64(12);
        let mut wm = WaveManager::new(30, 0);
        wm.wave = 7;
        wm.start_wave(100.0, &mut rng);
        wm.modifier = None;
        let map = GameMap::new();
        let mut saw_cluster = false;
        for _ in 0..100 {
            let mut enemies = Vec::new();
            wm.spawn_enemy(Vec2::ZERO, &map, &mut enemies, &mut rng);
            if enemies[0].kind() == EnemyKind::Swarm {
                assert!((3..=5).contains(&enemies.len()));
                for s in &enemies[1..] {
                    let d = s.pos.distance(enemies[0].pos);
                    assert!((30.0 - 0.01..=70.0 + 0.01).contains(&d));
                    assert_eq!(s.kind(), EnemyKind::Swarm);
                }
                saw_cluster = true;
            } else {
                assert_eq!(enemies.len(), 1);
            }
        }
        assert!(saw_cluster);
    }

    #[test]
    fn test_completion_iff_queue_and_field_empty() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut wm = WaveManager::new(30, 0);
        wm.start_wave(100.0, &mut rng);
        let map = GameMap::new();

        // Queue empty but an enemy alive
        wm.enemies_to_spawn = 0;
        let mut enemies = vec![Enemy::new(1, EnemyKind::Chaser, Vec2::ZERO)];
        assert!(wm.update(0.1, vitals(100.0), &map, &mut enemies, &mut rng).is_none());
        assert!(wm.wave_active);

        // Field empty but queue pending (spawn timer not yet elapsed)
        enemies.clear();
        wm.enemies_to_spawn = 1;
        wm.spawn_timer = 5.0;
        assert!(wm.update(0.1, vitals(100.0), &map, &mut enemies, &mut rng).is_none());

        wm.enemies_to_spawn = 0;
        let event = wm.update(0.1, vitals(100.0), &map, &mut enemies, &mut rng);
        assert!(matches!(event, Some(WaveEvent::WaveComplete(_))));
        assert!(!wm.wave_active);
        // Inactive manager is inert
        assert!(wm.update(0.1, vitals(100.0), &map, &mut enemies, &mut rng).is_none());
    }

    #[test]
    fn test_world_clear_on_last_wave() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut wm = WaveManager::new(3, 0);
        wm.wave = 3;
        wm.start_wave(100.0, &mut rng);
        wm.enemies_to_spawn = 0;
        let event = wm.update(0.1, vitals(100.0), &GameMap::new(), &mut Vec::new(), &mut rng);
        assert!(matches!(event, Some(WaveEvent::WorldClear(_))));
    }

    #[test]
    fn test_challenge_evaluation() {
        let mut wm = WaveManager::new(30, 0);
        wm.wave_active = true;
        wm.player_hp_at_wave_start = 80.0;

        wm.challenge = Some(Challenge::Flawless);
        // Regen back to the starting HP still counts
        let WaveEvent::WaveComplete(r) = wm.end_wave(vitals(80.0)) else { panic!() };
        assert!(r.success);
        let WaveEvent::WaveComplete(r) = wm.end_wave(vitals(79.0)) else { panic!() };
        assert!(!r.success);

        wm.challenge = Some(Challenge::Speed);
        wm.timer = 15.0;
        let WaveEvent::WaveComplete(r) = wm.end_wave(vitals(1.0)) else { panic!() };
        assert!(r.success);
        wm.timer = 14.9;
        let WaveEvent::WaveComplete(r) = wm.end_wave(vitals(1.0)) else { panic!() };
        assert!(!r.success);

        wm.challenge = Some(Challenge::Survivor);
        let WaveEvent::WaveComplete(r) = wm.end_wave(vitals(90.0)) else { panic!() };
        assert!(r.success);
        let WaveEvent::WaveComplete(r) = wm.end_wave(vitals(89.0)) else { panic!() };
        assert!(!r.success);

        wm.challenge = None;
        let WaveEvent::WaveComplete(r) = wm.end_wave(vitals(1.0)) else { panic!() };
        assert_eq!(r, ChallengeResult::default());
    }
}
