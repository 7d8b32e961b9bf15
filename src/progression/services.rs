//! Store services: reforge, fusion, and rarity promotion
//!
//! All three are unlocked by their store tree node and validate everything
//! before charging. Each listed uid stands for one unit of its stack.

use std::collections::HashMap;

use rand::Rng;
use rand::seq::IndexedRandom;

use super::gacha::add_to_inventory;
use super::items::{
    ITEMS, ItemCategory, ItemInstance, ItemStats, Rarity, describe_stats, generate_instance,
    item_def, new_uid, roll_stats,
};
use super::upgrade_tree::StoreBonuses;
use super::{StoreError, StoreResult};
use crate::persistence::ProfileData;

pub const FUSION_COUNT: usize = 3;
pub const PROMOTION_MATERIALS: usize = 3;

/// Days since the Unix epoch, used to reset daily counters
pub fn day_number(now_ms: u64) -> u64 {
    now_ms / 86_400_000
}

/// Fail unless every uid exists with enough units to cover its repeats
fn check_owned(profile: &ProfileData, uids: &[&str]) -> StoreResult<()> {
    let mut wanted: HashMap<&str, u32> = HashMap::new();
    for &uid in uids {
        *wanted.entry(uid).or_insert(0) += 1;
    }
    for (uid, n) in wanted {
        match profile.item_by_uid(uid) {
            Some(item) if item.count >= n => {}
            _ => return Err(StoreError::ItemNotFound),
        }
    }
    Ok(())
}

/// Detach one unit from a stack so it can change on its own. Returns the
/// index of the single unit.
fn split_one<R: Rng + ?Sized>(profile: &mut ProfileData, uid: &str, rng: &mut R) -> StoreResult<usize> {
    let items = &mut profile.inventory.items;
    let index = items
        .iter()
        .position(|i| i.uid == uid)
        .ok_or(StoreError::ItemNotFound)?;
    if items[index].count <= 1 {
        return Ok(index);
    }
    items[index].count -= 1;
    let mut unit = items[index].clone();
    unit.uid = new_uid(rng);
    unit.count = 1;
    items.push(unit);
    Ok(items.len() - 1)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReforgeOutcome {
    pub cost: u64,
    pub uid: String,
    pub old_stats: ItemStats,
    pub new_stats: ItemStats,
}

/// Re-roll a stat gem's stats within its catalog variance
pub fn reforge<R: Rng + ?Sized>(
    profile: &mut ProfileData,
    uid: &str,
    rng: &mut R,
) -> StoreResult<ReforgeOutcome> {
    let bonuses = StoreBonuses::from_profile(profile);
    if !bonuses.reforge_unlocked() {
        return Err(StoreError::ServiceLocked("Reforge"));
    }
    let item = profile.item_by_uid(uid).ok_or(StoreError::ItemNotFound)?;
    if item.category != ItemCategory::StatGem {
        return Err(StoreError::NotReforgeable);
    }
    let old_stats = item.stats.clone().ok_or(StoreError::NoStats)?;
    let def = item_def(&item.id)
        .filter(|d| d.variance > 0.0)
        .ok_or(StoreError::NotReforgeable)?;

    let cost = bonuses.reforge_cost();
    profile.spend_gold(cost)?;

    let mut roll = || roll_stats(def, bonuses.stat_stability, rng).unwrap_or_default();
    let new_stats = if bonuses.reforge_double_roll() {
        let first = roll();
        let second = roll();
        let total = |s: &ItemStats| s.values().sum::<f64>();
        if total(&first) >= total(&second) { first } else { second }
    } else {
        roll()
    };

    let index = split_one(profile, uid, rng)?;
    let gem = &mut profile.inventory.items[index];
    gem.stats = Some(new_stats.clone());
    gem.desc = describe_stats(&new_stats);
    log::info!("Reforged {} for {} gold: {}", gem.name, cost, gem.desc);

    Ok(ReforgeOutcome {
        cost,
        uid: gem.uid.clone(),
        old_stats,
        new_stats,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct FusionOutcome {
    pub consumed: Vec<ItemInstance>,
    pub result: ItemInstance,
    /// The bonus rarity upgrade fired
    pub upgraded: bool,
}

/// Combine three items into one random item of their average rarity
pub fn fuse<R: Rng + ?Sized>(
    profile: &mut ProfileData,
    uids: &[&str],
    rng: &mut R,
) -> StoreResult<FusionOutcome> {
    let bonuses = StoreBonuses::from_profile(profile);
    if !bonuses.fusion_unlocked() {
        return Err(StoreError::ServiceLocked("Fusion"));
    }
    if uids.len() != FUSION_COUNT {
        return Err(StoreError::FusionCount(FUSION_COUNT));
    }
    check_owned(profile, uids)?;
    let inputs: Vec<&ItemInstance> = uids.iter().filter_map(|u| profile.item_by_uid(u)).collect();
    let first = inputs[0];
    if bonuses.mixed_rarity_fusion() {
        if inputs.iter().any(|i| i.category != first.category) {
            return Err(StoreError::FusionCategoryMismatch);
        }
    } else if inputs.iter().any(|i| i.id != first.id) {
        return Err(StoreError::FusionMismatch);
    }

    let category = first.category;
    let average = inputs.iter().map(|i| i.rarity.index()).sum::<usize>() / inputs.len();
    let base = Rarity::from_index(average).unwrap_or(Rarity::Common);
    let upgraded = bonuses.fusion_upgrade_chance() > 0.0
        && rng.random::<f64>() < bonuses.fusion_upgrade_chance()
        && base.next().is_some();
    let rarity = if upgraded { base.next().unwrap_or(base) } else { base };

    let pool: Vec<_> = ITEMS
        .iter()
        .filter(|d| d.rarity == rarity && d.category == category)
        .collect();
    let def = *pool
        .choose(rng)
        .ok_or(StoreError::NoFusionResult { rarity, category })?;

    let consumed = uids
        .iter()
        .map(|uid| profile.consume_one(uid))
        .collect::<StoreResult<Vec<_>>>()?;
    let result = generate_instance(def, bonuses.stat_stability, rng);
    add_to_inventory(profile, result.clone());
    log::info!(
        "Fused {} items into {} ({}{})",
        consumed.len(),
        result.name,
        rarity,
        if upgraded { ", upgraded" } else { "" }
    );

    Ok(FusionOutcome {
        consumed,
        result,
        upgraded,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromotionOutcome {
    pub cost: u64,
    pub uid: String,
    pub old_rarity: Rarity,
    pub new_rarity: Rarity,
    pub remaining_uses: u32,
}

/// Raise one item a rarity tier by sacrificing three others.
/// `today` is a day number from [`day_number`].
pub fn promote<R: Rng + ?Sized>(
    profile: &mut ProfileData,
    uid: &str,
    materials: &[&str],
    today: u64,
    rng: &mut R,
) -> StoreResult<PromotionOutcome> {
    let bonuses = StoreBonuses::from_profile(profile);
    if !bonuses.promotion_unlocked() {
        return Err(StoreError::ServiceLocked("Rarity Promotion"));
    }
    let item = profile.item_by_uid(uid).ok_or(StoreError::ItemNotFound)?;
    let old_rarity = item.rarity;
    let new_rarity = old_rarity.next().ok_or(StoreError::MaxRarity)?;

    let limit = bonuses.promotion_daily_limit();
    let used = if profile.services.last_reset_day == today {
        profile.services.rarity_promotions_used
    } else {
        0
    };
    if used >= limit {
        return Err(StoreError::DailyLimit(limit));
    }
    let cost = bonuses.promotion_cost();
    if profile.gold < cost {
        return Err(StoreError::NotEnoughGold(cost));
    }
    if materials.len() != PROMOTION_MATERIALS {
        return Err(StoreError::MaterialCount(PROMOTION_MATERIALS));
    }
    if materials.contains(&uid) {
        return Err(StoreError::InvalidMaterials);
    }
    check_owned(profile, materials)?;

    profile.spend_gold(cost)?;
    for material in materials {
        profile.consume_one(material)?;
    }
    let index = split_one(profile, uid, rng)?;
    let promoted = &mut profile.inventory.items[index];
    promoted.rarity = new_rarity;
    promoted.sell_price = new_rarity.gold_value();
    let promoted_uid = promoted.uid.clone();
    log::info!("Promoted {} from {} to {}", promoted.name, old_rarity, new_rarity);

    profile.services.last_reset_day = today;
    profile.services.rarity_promotions_used = used + 1;

    Ok(PromotionOutcome {
        cost,
        uid: promoted_uid,
        old_rarity,
        new_rarity,
        remaining_uses: limit - (used + 1),
    })
}
