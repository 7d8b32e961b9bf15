//! Wave Survivor - top-down wave-survival arcade core
//!
//! Core modules:
//! - `sim`: Frame simulation (player, enemies, projectiles, chunked map, wave director)
//! - `world`: World descriptors and themes
//! - `progression`: Meta economy (crates, store rank, upgrade tree, services, offers)
//! - `persistence`: Versioned profile storage behind an injected store
//! - `run`: Run lifecycle glue between the simulation and the profile
//! - `settings`: Runtime configuration

pub mod highscores;
pub mod persistence;
pub mod progression;
pub mod run;
pub mod settings;
pub mod sim;
pub mod world;

pub use highscores::HighScores;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep used by the headless driver
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Default clamp applied to incoming frame deltas
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Viewport used for camera centering
    pub const VIEWPORT_WIDTH: f32 = 1280.0;
    pub const VIEWPORT_HEIGHT: f32 = 720.0;

    /// Map chunking
    pub const CHUNK_SIZE: f32 = 1000.0;
    pub const WALLS_PER_CHUNK_MIN: u32 = 5;
    pub const WALLS_PER_CHUNK_EXTRA: u32 = 5;
    pub const WALL_MIN_SIDE: f32 = 64.0;
    pub const WALL_SIDE_RANGE: f32 = 128.0;
    /// Walls never spawn with |x| and |y| both inside this radius
    pub const ORIGIN_CLEARANCE: f32 = 200.0;

    /// Player defaults
    pub const PLAYER_SIZE: f32 = 28.0;
    pub const PLAYER_SPEED: f32 = 200.0;
    pub const PLAYER_MAX_HP: f32 = 100.0;
    pub const PLAYER_DAMAGE: f32 = 10.0;
    pub const PLAYER_RANGE: f32 = 400.0;
    pub const BASE_FIRE_RATE: f32 = 0.5;
    /// Shortest allowed interval between volleys (20 shots/sec)
    pub const MIN_FIRE_INTERVAL: f32 = 0.05;
    pub const INVINCIBILITY_TIME: f32 = 1.0;
    pub const MULTISHOT_SPACING: f32 = 12.0;
    /// Distance ahead of each bullet's spawn used as its aim point
    pub const AIM_PROJECTION: f32 = 100.0;
    pub const CRIT_MULTIPLIER: f32 = 2.0;
    pub const FIRE_AURA_RANGE: f32 = 100.0;
    pub const FIRE_AURA_INTERVAL: f32 = 0.5;
    pub const ORBITAL_RADIUS: f32 = 60.0;
    pub const ORBITAL_SPIN: f32 = 2.0;
    pub const ORBITAL_HIT_RADIUS: f32 = 24.0;
    pub const ORBITAL_DPS_FACTOR: f32 = 2.0;

    /// Projectiles
    pub const PROJECTILE_SIZE: f32 = 8.0;
    /// Damage for shots created without any
    pub const DEFAULT_PROJECTILE_DAMAGE: f32 = 10.0;
    pub const PLAYER_BULLET_SPEED: f32 = 600.0;
    pub const ENEMY_BULLET_SPEED: f32 = 300.0;
    pub const PROJECTILE_LIFETIME: f32 = 2.0;
    /// Probe size for projectile vs wall checks
    pub const PROJECTILE_WALL_PROBE: f32 = 4.0;

    /// Status and hit effects
    pub const FROST_SLOW_TIME: f32 = 2.0;
    pub const SLOW_SPEED_FACTOR: f32 = 0.5;
    pub const SLOWED_CONTACT_FACTOR: f32 = 0.7;
    pub const EXPLOSION_RADIUS: f32 = 150.0;
    pub const EXPLOSION_DAMAGE_FACTOR: f32 = 0.8;
    pub const EXPLOSION_LIFETIME: f32 = 0.4;
    pub const EXPLOSION_DEFAULT_SIZE: f32 = 50.0;

    /// Enemy jump arc
    pub const JUMP_VELOCITY: f32 = 350.0;
    pub const JUMP_GRAVITY: f32 = 800.0;
    /// Enemies only fire when the player is closer than this
    pub const ENEMY_FIRE_RANGE: f32 = 500.0;

    /// Wave director
    pub const WAVE_TIME: f32 = 30.0;
    pub const SPAWN_RETRY_DELAY: f32 = 0.1;
    pub const SPAWN_ATTEMPTS: u32 = 10;
    pub const SPAWN_MIN_DISTANCE: f32 = 700.0;
    pub const SPAWN_DISTANCE_RANGE: f32 = 100.0;
    pub const SPAWN_CLEARANCE: f32 = 20.0;
    pub const BOSS_WAVE_INTERVAL: u32 = 5;
    pub const BOSS_HP_MULTIPLIER: f32 = 3.0;

    /// Economy
    pub const CHALLENGE_BONUS_GOLD: u64 = 50;
    pub const TOKENS_PER_WAVE: f32 = 2.0;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Unit vector for an angle in radians
#[inline]
pub fn unit_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}
