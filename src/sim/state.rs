//! Game state and core simulation types
//!
//! `GameState` is the arena that owns every live entity for one run. Each
//! subsystem borrows the pieces it needs for the duration of a frame.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::enemy::{Enemy, EnemyKind};
use super::map::GameMap;
use super::player::Player;
use super::projectile::Projectile;
use super::wave::{ChallengeResult, WaveManager};
use crate::consts::*;
use crate::unit_from_angle;
use crate::world::World;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Between waves, waiting for an in-run upgrade pick
    Shop,
    /// Game is paused
    Paused,
    /// Player died or quit
    GameOver,
    /// Final wave of the world cleared
    Victory,
}

impl GamePhase {
    pub fn is_finished(self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::Victory)
    }
}

/// Monotonic entity id allocator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityIds {
    next: u32,
}

impl Default for EntityIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl EntityIds {
    pub fn next(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Explosion particle (visual only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
}

const EXPLOSION_START_SIZE: f32 = 10.0;
const EXPLOSION_PARTICLES: usize = 8;
const EXPLOSION_PARTICLE_SPEED: f32 = 100.0;
const EXPLOSION_PARTICLE_LIFE: f32 = 0.5;

/// Expanding shockwave. Purely visual; AoE damage is applied by the frame loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosion {
    pub pos: Vec2,
    pub size: f32,
    pub max_size: f32,
    pub color: String,
    /// Cosmetic kill effect id, if any
    pub effect: Option<String>,
    pub life_time: f32,
    pub particles: Vec<Particle>,
    pub marked_for_deletion: bool,
}

impl Explosion {
    pub fn new(pos: Vec2, max_size: f32, color: &str, effect: Option<String>) -> Self {
        let particles = (0..EXPLOSION_PARTICLES)
            .map(|i| Particle {
                pos,
                vel: unit_from_angle(TAU * i as f32 / EXPLOSION_PARTICLES as f32)
                    * EXPLOSION_PARTICLE_SPEED,
                life: EXPLOSION_PARTICLE_LIFE,
            })
            .collect();
        Self {
            pos,
            size: EXPLOSION_START_SIZE,
            max_size,
            color: color.to_string(),
            effect,
            life_time: EXPLOSION_LIFETIME,
            particles,
            marked_for_deletion: false,
        }
    }

    /// Shot impact burst
    pub fn impact(pos: Vec2) -> Self {
        Self::new(pos, EXPLOSION_DEFAULT_SIZE, "#e74c3c", None)
    }

    pub fn update(&mut self, dt: f32) {
        self.life_time -= dt;
        let progress = 1.0 - self.life_time / EXPLOSION_LIFETIME;
        self.size = EXPLOSION_START_SIZE + (self.max_size - EXPLOSION_START_SIZE) * progress;
        for p in &mut self.particles {
            p.pos += p.vel * dt;
            p.life -= dt;
        }
        if self.life_time <= 0.0 {
            self.marked_for_deletion = true;
        }
    }
}

/// Top-left of the view, centered on the followed target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub offset: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
    }
}

impl Camera {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            offset: Vec2::ZERO,
            width,
            height,
        }
    }

    pub fn follow(&mut self, target: Vec2) {
        self.offset = target - Vec2::new(self.width / 2.0, self.height / 2.0);
    }

    pub fn to_world(&self, screen: Vec2) -> Vec2 {
        screen + self.offset
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed.wrapping_add(self.stream))
    }
}

/// Complete state of one run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub rng_state: RngState,
    pub rng: Pcg32,
    pub phase: GamePhase,
    pub world: World,
    pub player: Player,
    /// Live enemies in spawn order
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub explosions: Vec<Explosion>,
    pub map: GameMap,
    pub waves: WaveManager,
    pub camera: Camera,
    /// Gold earned this run (credited to the profile at settlement)
    pub gold: u64,
    pub score: u64,
    pub kills: u32,
    /// Elapsed run time in seconds
    pub time: f32,
    pub time_ticks: u64,
    /// Challenge outcome of the most recently cleared wave
    pub last_wave_result: Option<ChallengeResult>,
    /// Equipped kill effect, attached to kill explosions
    pub kill_effect: Option<String>,
    /// Gold granted for a successful wave challenge
    pub challenge_bonus_gold: u64,
    /// Longest frame the sim will integrate in one step
    pub max_frame_dt: f32,
    pub ids: EntityIds,
}

impl GameState {
    /// Create a run in `world` with a fresh player at the origin
    pub fn new(seed: u64, world: World) -> Self {
        let rng_state = RngState::new(seed);
        let rng = rng_state.to_rng();
        let waves = WaveManager::new(world.waves, world.difficulty_offset);
        Self {
            rng_state,
            rng,
            phase: GamePhase::Playing,
            world,
            player: Player::new(Vec2::ZERO),
            enemies: Vec::new(),
            projectiles: Vec::new(),
            explosions: Vec::new(),
            map: GameMap::new(),
            waves,
            camera: Camera::default(),
            gold: 0,
            score: 0,
            kills: 0,
            time: 0.0,
            time_ticks: 0,
            last_wave_result: None,
            kill_effect: None,
            challenge_bonus_gold: CHALLENGE_BONUS_GOLD,
            max_frame_dt: MAX_FRAME_DT,
            ids: EntityIds::default(),
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        self.ids.next()
    }

    pub fn wave(&self) -> u32 {
        self.waves.wave
    }

    /// Arm the current wave and enter play
    pub fn start_wave(&mut self) {
        self.waves.start_wave(self.player.hp, &mut self.rng);
        self.phase = GamePhase::Playing;
    }

    /// Leave the shop: advance to the next wave and start it
    pub fn next_wave(&mut self) {
        self.waves.wave += 1;
        self.start_wave();
    }

    /// Give fresh ids to staged enemies and append them to the live list
    pub fn merge_spawns(&mut self, spawns: &mut Vec<Enemy>) {
        for mut enemy in spawns.drain(..) {
            enemy.id = self.ids.next();
            self.enemies.push(enemy);
        }
    }

    /// Assign ids to enemies the wave director pushed this frame
    pub(crate) fn assign_missing_ids(&mut self) {
        for enemy in self.enemies.iter_mut().filter(|e| e.id == 0) {
            enemy.id = self.ids.next();
        }
    }

    /// Debug helper: count live enemies by kind
    pub fn count_kind(&self, kind: EnemyKind) -> usize {
        self.enemies.iter().filter(|e| e.kind() == kind).count()
    }

    /// Read-only view for a renderer
    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot {
            phase: self.phase,
            world_id: self.world.id.to_string(),
            camera: self.camera.offset,
            player: PlayerView {
                pos: self.player.pos,
                hp: self.player.hp,
                max_hp: self.player.max_hp,
                flashing: self.player.is_flashing,
                orbitals: self.player.orbital_positions(),
                fire_aura_range: self.player.has_fire_aura.then_some(self.player.fire_aura_range),
            },
            enemies: self
                .enemies
                .iter()
                .map(|e| EnemyView {
                    id: e.id,
                    kind: e.kind(),
                    pos: e.pos,
                    z: e.z,
                    size: e.size,
                    hp_fraction: (e.hp / e.max_hp).clamp(0.0, 1.0),
                    slowed: e.is_slowed(),
                    teleport_flash: e.teleport_flash(),
                })
                .collect(),
            projectiles: self
                .projectiles
                .iter()
                .map(|p| ProjectileView {
                    pos: p.pos,
                    enemy: p.flags.enemy,
                    frost: p.flags.frost,
                    explosive: p.flags.explosive,
                })
                .collect(),
            explosions: self.explosions.iter().map(|e| (e.pos, e.size)).collect(),
            walls: self.map.walls().to_vec(),
            wave: self.waves.wave,
            wave_timer: self.waves.timer,
            remaining: self.waves.remaining(self.enemies.len()),
            gold: self.gold,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    pub flashing: bool,
    pub orbitals: Vec<Vec2>,
    pub fire_aura_range: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnemyView {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub z: f32,
    pub size: f32,
    pub hp_fraction: f32,
    pub slowed: bool,
    pub teleport_flash: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileView {
    pub pos: Vec2,
    pub enemy: bool,
    pub frost: bool,
    pub explosive: bool,
}

/// Per-frame state handed to the renderer. Never fed back into the sim.
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot {
    pub phase: GamePhase,
    pub world_id: String,
    pub camera: Vec2,
    pub player: PlayerView,
    pub enemies: Vec<EnemyView>,
    pub projectiles: Vec<ProjectileView>,
    pub explosions: Vec<(Vec2, f32)>,
    pub walls: Vec<super::collision::Rect>,
    pub wave: u32,
    pub wave_timer: f32,
    pub remaining: usize,
    pub gold: u64,
}
