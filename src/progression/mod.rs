//! Meta-progression economy
//!
//! Everything here mutates a [`ProfileData`](crate::persistence::ProfileData)
//! in place. Operations validate first and only then charge the profile, so a
//! returned [`StoreError`] means nothing changed.

pub mod gacha;
pub mod items;
pub mod offers;
pub mod perm_upgrades;
pub mod rank;
pub mod services;
pub mod upgrade_tree;

use thiserror::Error;

pub use items::{CrateKind, ItemCategory, ItemInstance, Rarity, StatKind};
pub use perm_upgrades::LoadoutStats;
pub use upgrade_tree::StoreBonuses;

/// Why a store operation was refused. Messages are shown to the player.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Not enough gold. Need {0} gold.")]
    NotEnoughGold(u64),
    #[error("Not enough shop tokens. Need {0} tokens.")]
    NotEnoughTokens(u64),
    #[error("Not enough Upgrade Points")]
    NotEnoughPoints,
    #[error("Requires Store Rank {0}")]
    RankRequired(u32),
    #[error("Already at max level")]
    MaxLevel,
    #[error("Conflicts with {0}")]
    Conflict(&'static str),
    #[error("{0} is locked. Upgrade the store tree to unlock it.")]
    ServiceLocked(&'static str),
    #[error("{0} is not unlocked yet")]
    Locked(String),
    #[error("Item not found")]
    ItemNotFound,
    #[error("Only stat gems can be reforged")]
    NotReforgeable,
    #[error("Item has no stats to reforge")]
    NoStats,
    #[error("Fusion requires exactly {0} items")]
    FusionCount(usize),
    #[error("All items must be the same rarity")]
    FusionMismatch,
    #[error("All items must be the same category")]
    FusionCategoryMismatch,
    #[error("No {rarity} items exist in category {category}")]
    NoFusionResult {
        rarity: Rarity,
        category: ItemCategory,
    },
    #[error("Already at max rarity")]
    MaxRarity,
    #[error("Daily promotion limit reached ({0} per day)")]
    DailyLimit(u32),
    #[error("Promotion requires {0} sacrifice items")]
    MaterialCount(usize),
    #[error("Sacrifice items cannot include the item being promoted")]
    InvalidMaterials,
    #[error("Offer not found or expired")]
    OfferNotFound,
    #[error("Not enough gold ({gold}) or tokens ({tokens}) to refresh")]
    RefreshUnaffordable { gold: u64, tokens: u64 },
    #[error("Unknown upgrade: {0}")]
    UnknownUpgrade(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
