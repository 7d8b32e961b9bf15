//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (spawn order, staged spawns appended)
//! - No rendering, persistence, or platform dependencies

pub mod collision;
pub mod enemy;
pub mod map;
pub mod player;
pub mod projectile;
pub mod shop;
pub mod state;
pub mod tick;
pub mod wave;

pub use collision::{Rect, boxes_overlap};
pub use enemy::{Behavior, Enemy, EnemyKind};
pub use map::GameMap;
pub use player::Player;
pub use projectile::{Projectile, ShotFlags};
pub use shop::{ShopUpgrade, generate_options};
pub use state::{Camera, Explosion, GamePhase, GameState, RenderSnapshot};
pub use tick::{TickInput, tick};
pub use wave::{Challenge, ChallengeResult, WaveEvent, WaveManager, WaveModifier};
