//! Profile persistence
//!
//! Features:
//! - `ProfileData`: everything that outlives a run
//! - Versioned JSON envelope with pure migrations
//! - `ProfileStore` trait with file and in-memory backends
//! - Fire-and-forget save helper that logs and swallows failures

pub mod migration;
pub mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::highscores::{HighScores, now_ms};
use crate::progression::items::{ItemCategory, ItemInstance};
use crate::progression::rank;
use crate::progression::{StoreError, StoreResult};

pub use migration::{CURRENT_VERSION, SaveEnvelope};
pub use store::{FileStore, MemoryStore, ProfileStore};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("save file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("save file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported save version {0}")]
    UnsupportedVersion(u32),
}

pub const GEM_SLOTS: usize = 3;
pub const DEFAULT_USERNAME: &str = "Guest";
pub const STARTING_WORLD: &str = "tech";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inventory {
    pub items: Vec<ItemInstance>,
}

/// Equipped item uids
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Loadout {
    pub weapon_skin: Option<String>,
    pub character_skin: Option<String>,
    pub kill_effect: Option<String>,
    pub aura_effect: Option<String>,
    pub stat_gems: [Option<String>; GEM_SLOTS],
}

impl Loadout {
    fn slot_mut(&mut self, category: ItemCategory) -> Option<&mut Option<String>> {
        match category {
            ItemCategory::WeaponSkin => Some(&mut self.weapon_skin),
            ItemCategory::CharacterSkin => Some(&mut self.character_skin),
            ItemCategory::KillEffect => Some(&mut self.kill_effect),
            ItemCategory::AuraEffect => Some(&mut self.aura_effect),
            ItemCategory::StatGem => None,
        }
    }

    pub fn is_equipped(&self, uid: &str) -> bool {
        self.all_slots().any(|s| s == Some(uid))
    }

    fn all_slots(&self) -> impl Iterator<Item = Option<&str>> {
        [
            &self.weapon_skin,
            &self.character_skin,
            &self.kill_effect,
            &self.aura_effect,
        ]
        .into_iter()
        .chain(self.stat_gems.iter())
        .map(|s| s.as_deref())
    }

    /// Clear every slot holding `uid`
    pub fn unequip(&mut self, uid: &str) {
        for slot in [
            &mut self.weapon_skin,
            &mut self.character_skin,
            &mut self.kill_effect,
            &mut self.aura_effect,
        ]
        .into_iter()
        .chain(self.stat_gems.iter_mut())
        {
            if slot.as_deref() == Some(uid) {
                *slot = None;
            }
        }
    }
}

/// Daily service counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceUsage {
    /// Day number (days since the epoch) the counters belong to
    pub last_reset_day: u64,
    pub rarity_promotions_used: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RotatingOffersState {
    /// Offer ids still available for purchase
    pub current_offers: Vec<String>,
    pub free_refresh_used: bool,
    /// Unix ms of the last refresh
    pub last_refresh: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileData {
    pub username: String,
    pub gold: u64,
    pub shop_tokens: u64,
    pub high_scores: HighScores,
    /// Permanent upgrade id -> level
    pub upgrades: BTreeMap<String, u32>,
    pub inventory: Inventory,
    pub loadout: Loadout,
    pub store_rank: u32,
    #[serde(rename = "storeXP")]
    pub store_xp: u64,
    pub store_upgrade_points: u32,
    /// Store tree node id -> level
    pub store_upgrades: BTreeMap<String, u32>,
    pub unlocked_worlds: Vec<String>,
    pub services: ServiceUsage,
    pub rotating_offers: RotatingOffersState,
}

impl Default for ProfileData {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            gold: 0,
            shop_tokens: 0,
            high_scores: HighScores::new(),
            upgrades: BTreeMap::new(),
            inventory: Inventory::default(),
            loadout: Loadout::default(),
            store_rank: 1,
            store_xp: 0,
            store_upgrade_points: 0,
            store_upgrades: BTreeMap::new(),
            unlocked_worlds: vec![STARTING_WORLD.to_string()],
            services: ServiceUsage::default(),
            rotating_offers: RotatingOffersState::default(),
        }
    }
}

impl ProfileData {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            ..Self::default()
        }
    }

    pub fn add_gold(&mut self, amount: u64) {
        self.gold += amount;
    }

    /// Deduct gold or report the full price that was missing
    pub fn spend_gold(&mut self, cost: u64) -> StoreResult<()> {
        if self.gold < cost {
            return Err(StoreError::NotEnoughGold(cost));
        }
        self.gold -= cost;
        Ok(())
    }

    pub fn spend_tokens(&mut self, cost: u64) -> StoreResult<()> {
        if self.shop_tokens < cost {
            return Err(StoreError::NotEnoughTokens(cost));
        }
        self.shop_tokens -= cost;
        Ok(())
    }

    /// Record a finished run on the leaderboard, stamped with the current time.
    /// Returns the place taken, counted from 1.
    pub fn add_high_score(&mut self, wave: u32, score: u64) -> Option<usize> {
        let name = self.username.clone();
        self.high_scores.add_score(wave, score, &name, now_ms())
    }

    /// Grant tokens plus the rank token bonus. Store XP grows by the base
    /// amount. Returns the tokens actually granted.
    pub fn add_shop_tokens(&mut self, amount: u64) -> u64 {
        let bonus = (amount as f64 * rank::token_bonus(self.store_rank)).floor() as u64;
        let granted = amount + bonus;
        self.shop_tokens += granted;
        self.add_store_xp(amount);
        granted
    }

    /// Add store XP, awarding upgrade points for every rank gained.
    /// Returns the new rank on a rank-up.
    pub fn add_store_xp(&mut self, amount: u64) -> Option<u32> {
        self.store_xp += amount;
        let new_rank = rank::rank_for_xp(self.store_xp);
        if new_rank <= self.store_rank {
            return None;
        }
        let points: u32 = ((self.store_rank + 1)..=new_rank)
            .filter_map(rank::rank_def)
            .map(|r| r.upgrade_points)
            .sum();
        log::info!(
            "Store rank {} -> {} (+{} upgrade points)",
            self.store_rank,
            new_rank,
            points
        );
        self.store_rank = new_rank;
        self.store_upgrade_points += points;
        Some(new_rank)
    }

    pub fn upgrade_level(&self, id: &str) -> u32 {
        self.upgrades.get(id).copied().unwrap_or(0)
    }

    /// Raise a permanent upgrade by one level if `cost` is affordable
    pub fn buy_upgrade(&mut self, id: &str, cost: u64) -> bool {
        if self.spend_gold(cost).is_err() {
            return false;
        }
        *self.upgrades.entry(id.to_string()).or_insert(0) += 1;
        true
    }

    pub fn store_upgrade_level(&self, id: &str) -> u32 {
        self.store_upgrades.get(id).copied().unwrap_or(0)
    }

    /// Raise a store tree node by one level if `points` are available
    pub fn buy_store_upgrade(&mut self, id: &str, points: u32) -> bool {
        if self.store_upgrade_points < points {
            return false;
        }
        self.store_upgrade_points -= points;
        *self.store_upgrades.entry(id.to_string()).or_insert(0) += 1;
        true
    }

    pub fn item_by_uid(&self, uid: &str) -> Option<&ItemInstance> {
        self.inventory.items.iter().find(|i| i.uid == uid)
    }

    pub fn item_by_uid_mut(&mut self, uid: &str) -> Option<&mut ItemInstance> {
        self.inventory.items.iter_mut().find(|i| i.uid == uid)
    }

    /// Equipped stat gems, skipping empty or dangling slots
    pub fn equipped_gems(&self) -> impl Iterator<Item = &ItemInstance> {
        self.loadout
            .stat_gems
            .iter()
            .flatten()
            .filter_map(|uid| self.item_by_uid(uid))
    }

    /// Catalog id of the equipped kill effect
    pub fn kill_effect_id(&self) -> Option<&str> {
        let uid = self.loadout.kill_effect.as_deref()?;
        self.item_by_uid(uid).map(|i| i.id.as_str())
    }

    /// Equip an owned item. Gems take the first free slot, or replace the
    /// first slot when all are full.
    pub fn equip(&mut self, uid: &str) -> StoreResult<()> {
        let category = self.item_by_uid(uid).ok_or(StoreError::ItemNotFound)?.category;
        match self.loadout.slot_mut(category) {
            Some(slot) => *slot = Some(uid.to_string()),
            None => {
                if self.loadout.stat_gems.iter().flatten().any(|g| g == uid) {
                    return Ok(());
                }
                let slot = self
                    .loadout
                    .stat_gems
                    .iter()
                    .position(Option::is_none)
                    .unwrap_or(0);
                self.loadout.stat_gems[slot] = Some(uid.to_string());
            }
        }
        Ok(())
    }

    pub fn unequip_uid(&mut self, uid: &str) {
        self.loadout.unequip(uid);
    }

    /// Consume one unit of a stack. The stack is dropped, and unequipped,
    /// once its count reaches zero.
    pub fn consume_one(&mut self, uid: &str) -> StoreResult<ItemInstance> {
        let index = self
            .inventory
            .items
            .iter()
            .position(|i| i.uid == uid)
            .ok_or(StoreError::ItemNotFound)?;
        let item = &mut self.inventory.items[index];
        if item.count > 1 {
            item.count -= 1;
            let mut unit = item.clone();
            unit.count = 1;
            return Ok(unit);
        }
        let removed = self.inventory.items.remove(index);
        self.loadout.unequip(uid);
        Ok(removed)
    }

    pub fn is_world_unlocked(&self, id: &str) -> bool {
        self.unlocked_worlds.iter().any(|w| w == id)
    }

    /// Returns true if the world was newly unlocked
    pub fn unlock_world(&mut self, id: &str) -> bool {
        if self.is_world_unlocked(id) {
            return false;
        }
        self.unlocked_worlds.push(id.to_string());
        true
    }
}

/// Save without surfacing failures. A failed save never disturbs the
/// in-memory profile.
pub fn save_fire_and_forget<S: ProfileStore + ?Sized>(store: &mut S, profile: &ProfileData) {
    match store.save(profile) {
        Ok(()) => log::debug!("Profile '{}' saved", profile.username),
        Err(e) => log::error!("Failed to save profile '{}': {}", profile.username, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::items::{generate_instance, item_def};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn with_item(profile: &mut ProfileData, id: &str, count: u32) -> String {
        let mut rng = Pcg32::seed_from_u64(profile.inventory.items.len() as u64);
        let mut item = generate_instance(item_def(id).expect("catalog item"), 0.0, &mut rng);
        item.count = count;
        let uid = item.uid.clone();
        profile.inventory.items.push(item);
        uid
    }

    #[test]
    fn test_defaults() {
        let profile = ProfileData::default();
        assert_eq!(profile.username, "Guest");
        assert_eq!(profile.store_rank, 1);
        assert_eq!(profile.unlocked_worlds, vec!["tech".to_string()]);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let profile: ProfileData = serde_json::from_str(r#"{"gold": 42}"#).expect("parse");
        assert_eq!(profile.gold, 42);
        assert_eq!(profile.store_rank, 1);
        assert_eq!(profile.loadout.stat_gems, [None, None, None]);
    }

    #[test]
    fn test_store_xp_key_matches_save_format() {
        let json = serde_json::to_value(ProfileData::default()).expect("serialize");
        assert!(json.get("storeXP").is_some());
        assert!(json.get("shopTokens").is_some());
    }

    #[test]
    fn test_buy_upgrade_needs_gold() {
        let mut profile = ProfileData::default();
        profile.gold = 150;
        assert!(profile.buy_upgrade("dmg_c", 100));
        assert!(!profile.buy_upgrade("dmg_c", 100));
        assert_eq!(profile.gold, 50);
        assert_eq!(profile.upgrade_level("dmg_c"), 1);
    }

    #[test]
    fn test_tokens_grant_xp_and_rank_points() {
        let mut profile = ProfileData::default();
        assert_eq!(profile.add_shop_tokens(320), 320);
        assert_eq!(profile.store_xp, 320);
        assert_eq!(profile.store_rank, 3);
        assert_eq!(profile.store_upgrade_points, 2);
    }

    #[test]
    fn test_max_rank_token_boost() {
        let mut profile = ProfileData::default();
        profile.add_store_xp(4500);
        assert_eq!(profile.store_rank, 10);
        assert_eq!(profile.store_upgrade_points, 11);
        assert_eq!(profile.add_shop_tokens(100), 105);
        assert_eq!(profile.store_xp, 4600);
    }

    #[test]
    fn test_equip_and_consume_unequips_last_copy() {
        let mut profile = ProfileData::default();
        let gem = with_item(&mut profile, "g_dmg_s", 2);
        let skin = with_item(&mut profile, "k_gold", 1);
        profile.equip(&gem).expect("equip gem");
        profile.equip(&gem).expect("equip gem twice");
        profile.equip(&skin).expect("equip kill effect");
        assert_eq!(profile.equipped_gems().count(), 1);
        assert_eq!(profile.kill_effect_id(), Some("k_gold"));

        profile.consume_one(&gem).expect("first unit");
        assert!(profile.loadout.is_equipped(&gem));
        profile.consume_one(&gem).expect("second unit");
        assert!(!profile.loadout.is_equipped(&gem));
        assert!(profile.item_by_uid(&gem).is_none());
        assert_eq!(profile.consume_one(&gem), Err(StoreError::ItemNotFound));
    }

    #[test]
    fn test_unlock_world_once() {
        let mut profile = ProfileData::default();
        assert!(profile.unlock_world("magma"));
        assert!(!profile.unlock_world("magma"));
        assert!(profile.is_world_unlocked("magma"));
    }

    #[test]
    fn test_fire_and_forget_swallows_errors() {
        struct Broken;
        impl ProfileStore for Broken {
            fn load(&mut self, _username: &str) -> Result<Option<ProfileData>, PersistenceError> {
                Ok(None)
            }
            fn save(&mut self, _profile: &ProfileData) -> Result<(), PersistenceError> {
                Err(PersistenceError::UnsupportedVersion(99))
            }
        }
        let profile = ProfileData::default();
        save_fire_and_forget(&mut Broken, &profile);
        assert_eq!(profile.gold, 0);
    }
}
