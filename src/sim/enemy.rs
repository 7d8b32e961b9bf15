//! Enemy archetypes and per-frame AI
//!
//! Each archetype's behavior state lives in its [`Behavior`] variant, so the
//! AI dispatch is an exhaustive match over a closed set. Side effects that
//! touch other entities (bullets, minions, heal pulses) are returned to the
//! caller instead of being applied here.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::map::GameMap;
use super::wave::{damage_scale, hp_scale, scaled_stat};
use crate::consts::*;
use crate::unit_from_angle;

/// HP fractions at which a boss calls in minions
pub const BOSS_PHASE_THRESHOLDS: [f32; 3] = [0.7, 0.4, 0.1];
pub const BOSS_MINIONS_PER_PHASE: u32 = 3;
pub const BOSS_ENRAGE_THRESHOLD: f32 = 0.5;
pub const BOSS_ENRAGE_SPEED: f32 = 1.2;

pub const SHOOTER_RANGE: f32 = 300.0;
pub const SHOOTER_FIRE_INTERVAL: f32 = 2.5;
pub const BOSS_FIRE_INTERVAL: f32 = 1.5;

pub const HEAL_RADIUS: f32 = 200.0;
pub const HEAL_AMOUNT: f32 = 4.0;
pub const HEAL_INTERVAL: f32 = 1.0;
/// Healers stop advancing once this close
pub const HEALER_HOLD_DISTANCE: f32 = 150.0;

pub const TELEPORT_COOLDOWN: f32 = 3.0;
pub const TELEPORT_MIN_GAP: f32 = 100.0;
pub const TELEPORT_MIN_DISTANCE: f32 = 200.0;
pub const TELEPORT_DISTANCE_RANGE: f32 = 100.0;
pub const TELEPORT_FLASH: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Chaser,
    Shooter,
    Tank,
    Boss,
    Swarm,
    Healer,
    Splitter,
    Teleporter,
}

/// Unscaled stats for an archetype
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseStats {
    pub hp: f32,
    pub speed: f32,
    pub damage: f32,
    pub xp: f32,
    pub size: f32,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 8] = [
        EnemyKind::Chaser,
        EnemyKind::Shooter,
        EnemyKind::Tank,
        EnemyKind::Boss,
        EnemyKind::Swarm,
        EnemyKind::Healer,
        EnemyKind::Splitter,
        EnemyKind::Teleporter,
    ];

    pub fn base_stats(self) -> BaseStats {
        let (hp, speed, damage, xp, size) = match self {
            EnemyKind::Chaser => (30.0, 100.0, 10.0, 10.0, 24.0),
            EnemyKind::Shooter => (20.0, 80.0, 10.0, 15.0, 24.0),
            EnemyKind::Tank => (80.0, 50.0, 20.0, 25.0, 30.0),
            EnemyKind::Boss => (500.0, 60.0, 25.0, 500.0, 50.0),
            EnemyKind::Swarm => (15.0, 150.0, 8.0, 8.0, 10.0),
            EnemyKind::Healer => (40.0, 60.0, 5.0, 30.0, 24.0),
            EnemyKind::Splitter => (35.0, 90.0, 10.0, 20.0, 24.0),
            EnemyKind::Teleporter => (25.0, 100.0, 10.0, 18.0, 24.0),
        };
        BaseStats {
            hp,
            speed,
            damage,
            xp,
            size,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EnemyKind::Chaser => "CHASER",
            EnemyKind::Shooter => "SHOOTER",
            EnemyKind::Tank => "TANK",
            EnemyKind::Boss => "BOSS",
            EnemyKind::Swarm => "SWARM",
            EnemyKind::Healer => "HEALER",
            EnemyKind::Splitter => "SPLITTER",
            EnemyKind::Teleporter => "TELEPORTER",
        }
    }
}

/// Archetype-specific AI state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    Chaser,
    Tank,
    Swarm,
    Shooter {
        shoot_timer: f32,
    },
    Boss {
        shoot_timer: f32,
        phases_triggered: [bool; 3],
        enraged: bool,
    },
    Healer {
        heal_timer: f32,
    },
    Splitter {
        can_split: bool,
    },
    Teleporter {
        timer: f32,
        cooldown: f32,
        flash: f32,
    },
}

impl Behavior {
    fn initial(kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::Chaser => Behavior::Chaser,
            EnemyKind::Tank => Behavior::Tank,
            EnemyKind::Swarm => Behavior::Swarm,
            EnemyKind::Shooter => Behavior::Shooter { shoot_timer: 2.0 },
            EnemyKind::Boss => Behavior::Boss {
                shoot_timer: BOSS_FIRE_INTERVAL,
                phases_triggered: [false; 3],
                enraged: false,
            },
            EnemyKind::Healer => Behavior::Healer { heal_timer: 0.0 },
            EnemyKind::Splitter => Behavior::Splitter { can_split: true },
            EnemyKind::Teleporter => Behavior::Teleporter {
                timer: TELEPORT_COOLDOWN,
                cooldown: TELEPORT_COOLDOWN,
                flash: 0.0,
            },
        }
    }

    pub fn kind(&self) -> EnemyKind {
        match self {
            Behavior::Chaser => EnemyKind::Chaser,
            Behavior::Tank => EnemyKind::Tank,
            Behavior::Swarm => EnemyKind::Swarm,
            Behavior::Shooter { .. } => EnemyKind::Shooter,
            Behavior::Boss { .. } => EnemyKind::Boss,
            Behavior::Healer { .. } => EnemyKind::Healer,
            Behavior::Splitter { .. } => EnemyKind::Splitter,
            Behavior::Teleporter { .. } => EnemyKind::Teleporter,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub pos: Vec2,
    pub size: f32,
    pub hp: f32,
    /// Fixed at spawn after scaling
    pub max_hp: f32,
    /// Speed used this frame (halved while slowed)
    pub speed: f32,
    pub base_speed: f32,
    pub damage: f32,
    pub xp_value: f32,
    pub slow_timer: f32,
    // Jump arc (airborne enemies ignore walls and contact)
    pub z: f32,
    pub vz: f32,
    pub is_jumping: bool,
    pub behavior: Behavior,
}

/// A bullet an enemy wants fired this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyShot {
    pub from: Vec2,
    pub target: Vec2,
    pub damage: f32,
}

/// Heal every other damaged enemy within `radius` of `center`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealPulse {
    pub source_id: u32,
    pub center: Vec2,
    pub radius: f32,
    pub amount: f32,
}

/// Effects collected across one enemy pass, applied by the frame loop
#[derive(Debug, Default)]
pub struct EnemyOutput {
    pub shots: Vec<EnemyShot>,
    /// Staged spawns (ids assigned on merge)
    pub minions: Vec<Enemy>,
    /// Boss thresholds crossed this pass
    pub boss_phases: u32,
}

impl Enemy {
    pub fn new(id: u32, kind: EnemyKind, pos: Vec2) -> Self {
        let stats = kind.base_stats();
        Self {
            id,
            pos,
            size: stats.size,
            hp: stats.hp,
            max_hp: stats.hp,
            speed: stats.speed,
            base_speed: stats.speed,
            damage: stats.damage,
            xp_value: stats.xp,
            slow_timer: 0.0,
            z: 0.0,
            vz: 0.0,
            is_jumping: false,
            behavior: Behavior::initial(kind),
        }
    }

    pub fn kind(&self) -> EnemyKind {
        self.behavior.kind()
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    pub fn is_slowed(&self) -> bool {
        self.slow_timer > 0.0
    }

    pub fn apply_slow(&mut self, duration: f32) {
        self.slow_timer = duration;
    }

    pub fn is_boss(&self) -> bool {
        self.kind() == EnemyKind::Boss
    }

    /// Splitters that have not been disarmed split on death
    pub fn splits_on_death(&self) -> bool {
        matches!(self.behavior, Behavior::Splitter { can_split: true })
    }

    /// Teleport flash timer for renderers (0 when not a teleporter)
    pub fn teleport_flash(&self) -> f32 {
        match self.behavior {
            Behavior::Teleporter { flash, .. } => flash.max(0.0),
            _ => 0.0,
        }
    }

    /// Advance AI and movement for one frame.
    ///
    /// Returns a heal pulse for the caller to apply to the other enemies
    /// before the next enemy updates.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        player_pos: Vec2,
        map: Option<&GameMap>,
        wave: u32,
        rng: &mut R,
        out: &mut EnemyOutput,
    ) -> Option<HealPulse> {
        let mut speed = self.base_speed;
        if self.slow_timer > 0.0 {
            self.slow_timer -= dt;
            speed *= SLOW_SPEED_FACTOR;
        }
        self.speed = speed;

        let to_player = player_pos - self.pos;
        let dist = to_player.length();
        let mut should_move = true;
        let mut heal = None;

        match &mut self.behavior {
            Behavior::Chaser | Behavior::Tank | Behavior::Swarm | Behavior::Splitter { .. } => {}
            Behavior::Shooter { shoot_timer } => {
                *shoot_timer -= dt;
                if *shoot_timer <= 0.0 && dist < ENEMY_FIRE_RANGE {
                    *shoot_timer = SHOOTER_FIRE_INTERVAL;
                    out.shots.push(EnemyShot {
                        from: self.pos,
                        target: player_pos,
                        damage: self.damage,
                    });
                }
                if dist < SHOOTER_RANGE {
                    should_move = false;
                }
            }
            Behavior::Boss {
                shoot_timer,
                phases_triggered,
                enraged,
            } => {
                *shoot_timer -= dt;
                if *shoot_timer <= 0.0 && dist < ENEMY_FIRE_RANGE {
                    *shoot_timer = BOSS_FIRE_INTERVAL;
                    out.shots.push(EnemyShot {
                        from: self.pos,
                        target: player_pos,
                        damage: self.damage,
                    });
                }

                let hp_fraction = self.hp / self.max_hp;
                // Every crossed threshold fires once, even several in one frame
                for (index, threshold) in BOSS_PHASE_THRESHOLDS.iter().enumerate() {
                    if hp_fraction <= *threshold && !phases_triggered[index] {
                        phases_triggered[index] = true;
                        out.boss_phases += 1;
                        log::debug!("Boss {} phase {} at {:.0}% hp", self.id, index + 1, hp_fraction * 100.0);
                        spawn_boss_minions(self.pos, map, wave, rng, &mut out.minions);
                    }
                }

                if hp_fraction <= BOSS_ENRAGE_THRESHOLD && !*enraged {
                    *enraged = true;
                    self.base_speed = (self.base_speed * BOSS_ENRAGE_SPEED).floor();
                    speed = self.base_speed;
                    log::debug!("Boss {} enraged, speed {}", self.id, speed);
                }
            }
            Behavior::Healer { heal_timer } => {
                *heal_timer += dt;
                if *heal_timer >= HEAL_INTERVAL {
                    *heal_timer = 0.0;
                    heal = Some(HealPulse {
                        source_id: self.id,
                        center: self.pos,
                        radius: HEAL_RADIUS,
                        amount: HEAL_AMOUNT,
                    });
                }
                if dist < HEALER_HOLD_DISTANCE {
                    should_move = false;
                }
            }
            Behavior::Teleporter {
                timer,
                cooldown,
                flash,
            } => {
                *timer -= dt;
                if *flash > 0.0 {
                    *flash -= dt;
                }
                if *timer <= 0.0 && dist > TELEPORT_MIN_GAP {
                    *timer = *cooldown;
                    let jump = TELEPORT_MIN_DISTANCE + rng.random::<f32>() * TELEPORT_DISTANCE_RANGE;
                    let angle = to_player.y.atan2(to_player.x);
                    let dest = self.pos + unit_from_angle(angle) * jump;
                    if let Some(map) = map {
                        if map.check_collision(dest, self.size).is_none() {
                            self.pos = dest;
                            *flash = TELEPORT_FLASH;
                            log::debug!("Teleporter {} blinked {:.0} units", self.id, jump);
                        }
                    }
                }
            }
        }

        if should_move && dist > 0.0 {
            // Direction is taken before any teleport this frame
            let next = self.pos + to_player / dist * speed * dt;
            if let Some(map) = map {
                if !self.is_jumping && map.check_collision(next, self.size).is_some() {
                    self.is_jumping = true;
                    self.vz = JUMP_VELOCITY;
                    self.z = 1.0;
                }
            }
            self.pos = next;
            if let Some(map) = map {
                if self.z <= 0.0 {
                    map.resolve_collision(&mut self.pos, self.size);
                }
            }
        }

        if self.is_jumping {
            self.z += self.vz * dt;
            self.vz -= JUMP_GRAVITY * dt;
            if self.z <= 0.0 {
                self.z = 0.0;
                self.vz = 0.0;
                self.is_jumping = false;
            }
        }

        self.speed = self.base_speed;
        heal
    }
}

/// Three CHASER/SHOOTER minions around a boss, scaled to the current wave
fn spawn_boss_minions<R: Rng + ?Sized>(
    center: Vec2,
    map: Option<&GameMap>,
    wave: u32,
    rng: &mut R,
    minions: &mut Vec<Enemy>,
) {
    for _ in 0..BOSS_MINIONS_PER_PHASE {
        let angle = rng.random::<f32>() * TAU;
        let dist = 80.0 + rng.random::<f32>() * 40.0;
        let pos = center + unit_from_angle(angle) * dist;
        let blocked = map.is_some_and(|m| m.check_collision(pos, SPAWN_CLEARANCE).is_some());
        if blocked {
            continue;
        }
        let kind = if rng.random::<f32>() < 0.5 {
            EnemyKind::Chaser
        } else {
            EnemyKind::Shooter
        };
        let mut minion = Enemy::new(0, kind, pos);
        minion.hp = scaled_stat(minion.hp, hp_scale(wave));
        minion.max_hp = minion.hp;
        minion.damage = scaled_stat(minion.damage, damage_scale(wave));
        minions.push(minion);
    }
}

/// Apply a heal pulse to every enemy except its source
pub fn apply_heal(enemies: &mut [Enemy], pulse: &HealPulse) {
    for enemy in enemies.iter_mut() {
        if enemy.id == pulse.source_id || enemy.hp >= enemy.max_hp {
            continue;
        }
        if enemy.pos.distance(pulse.center) < pulse.radius {
            enemy.hp = (enemy.hp + pulse.amount).min(enemy.max_hp);
        }
    }
}
