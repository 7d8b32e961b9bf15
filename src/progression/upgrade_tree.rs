//! Store upgrade tree
//!
//! Three branches of three rows. Nodes cost upgrade points earned from store
//! ranks, and their effects are read back through [`StoreBonuses`].

use super::items::{CrateKind, Rarity};
use super::{StoreError, StoreResult};
use crate::persistence::ProfileData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Economy,
    LootQuality,
    Services,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpgradeNode {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub branch: Branch,
    pub row: u32,
    pub max_level: u32,
    pub point_cost: u32,
    pub unlock_rank: u32,
    /// Blocked while any of these is at its max level
    pub conflicts: &'static [&'static str],
    /// One line per level
    pub effects: &'static [&'static str],
}

pub const BETTER_SELL_PRICES: &str = "better_sell_prices";
pub const CRATE_DISCOUNTS: &str = "crate_discounts";
pub const RUN_DIVIDEND: &str = "run_dividend";
pub const RARITY_FLOOR: &str = "rarity_floor";
pub const STAT_STABILITY: &str = "stat_stability";
pub const DUPLICATE_INSURANCE: &str = "duplicate_insurance";
pub const REFORGE_SPECIALIST: &str = "reforge_specialist";
pub const FUSION_LAB: &str = "fusion_lab";
pub const RARITY_PROMOTION: &str = "rarity_promotion";

pub static UPGRADE_TREE: [UpgradeNode; 9] = [
    UpgradeNode {
        id: BETTER_SELL_PRICES,
        name: "Better Sell Prices",
        description: "Increase gold earned from selling items",
        branch: Branch::Economy,
        row: 1,
        max_level: 3,
        point_cost: 1,
        unlock_rank: 2,
        conflicts: &[],
        effects: &["+10% sell price", "+20% sell price", "+30% sell price"],
    },
    UpgradeNode {
        id: CRATE_DISCOUNTS,
        name: "Crate Discounts",
        description: "Reduce the cost of all crates",
        branch: Branch::Economy,
        row: 2,
        max_level: 3,
        point_cost: 1,
        unlock_rank: 5,
        conflicts: &[BETTER_SELL_PRICES],
        effects: &["-3% crate cost", "-6% crate cost", "-10% crate cost"],
    },
    UpgradeNode {
        id: RUN_DIVIDEND,
        name: "Run Dividend",
        description: "Earn bonus gold after each run",
        branch: Branch::Economy,
        row: 3,
        max_level: 3,
        point_cost: 1,
        unlock_rank: 7,
        conflicts: &[],
        effects: &[
            "+5% bonus gold after runs",
            "+10% bonus gold after runs",
            "+15% bonus gold after runs",
        ],
    },
    UpgradeNode {
        id: RARITY_FLOOR,
        name: "Rarity Floor",
        description: "Guarantee minimum rarities in crates",
        branch: Branch::LootQuality,
        row: 1,
        max_level: 3,
        point_cost: 1,
        unlock_rank: 2,
        conflicts: &[],
        effects: &[
            "Basic Crates guarantee at least 1 Rare",
            "Silver Crates guarantee at least 1 Epic",
            "+1% Mythic chance in Gold/Legendary Crates",
        ],
    },
    UpgradeNode {
        id: STAT_STABILITY,
        name: "Stat Stability",
        description: "Improve stat roll ranges on gems",
        branch: Branch::LootQuality,
        row: 2,
        max_level: 2,
        point_cost: 1,
        unlock_rank: 5,
        conflicts: &[],
        effects: &["Exclude bottom 25% of stat rolls", "Exclude bottom 40% of stat rolls"],
    },
    UpgradeNode {
        id: DUPLICATE_INSURANCE,
        name: "Duplicate Insurance",
        description: "Convert excess duplicates into Shop Tokens",
        branch: Branch::LootQuality,
        row: 3,
        max_level: 3,
        point_cost: 1,
        unlock_rank: 7,
        conflicts: &[],
        effects: &[
            "Dupes beyond 5 stack give 10 tokens each",
            "Dupes beyond 4 stack give 15 tokens each",
            "Dupes beyond 3 stack give 25 tokens each",
        ],
    },
    UpgradeNode {
        id: REFORGE_SPECIALIST,
        name: "Reforge Specialist",
        description: "Unlock and enhance the Reforge service",
        branch: Branch::Services,
        row: 1,
        max_level: 3,
        point_cost: 1,
        unlock_rank: 2,
        conflicts: &[],
        effects: &[
            "Unlock Reforge service",
            "-25% Reforge cost",
            "Reforge rolls twice, keeps better result",
        ],
    },
    UpgradeNode {
        id: FUSION_LAB,
        name: "Fusion Lab",
        description: "Unlock and enhance the Fusion service",
        branch: Branch::Services,
        row: 2,
        max_level: 3,
        point_cost: 1,
        unlock_rank: 5,
        conflicts: &[],
        effects: &[
            "Combine 3 items into stronger version",
            "20% chance to upgrade rarity",
            "Can fuse mixed rarities (2 Rare + 1 Epic)",
        ],
    },
    UpgradeNode {
        id: RARITY_PROMOTION,
        name: "Rarity Promotion",
        description: "Unlock service to upgrade item rarity",
        branch: Branch::Services,
        row: 3,
        max_level: 2,
        point_cost: 1,
        unlock_rank: 7,
        conflicts: &[],
        effects: &["Upgrade 1 item rarity/day (500g)", "-30% cost, 2 uses/day"],
    },
];

pub fn node(id: &str) -> Option<&'static UpgradeNode> {
    UPGRADE_TREE.iter().find(|n| n.id == id)
}

/// Nodes of one branch, ordered by row
pub fn branch_nodes(branch: Branch) -> impl Iterator<Item = &'static UpgradeNode> {
    UPGRADE_TREE.iter().filter(move |n| n.branch == branch)
}

pub fn is_unlocked(profile: &ProfileData, id: &str) -> bool {
    node(id).is_some_and(|n| profile.store_rank >= n.unlock_rank)
}

/// Checks in order: rank, max level, points, conflicts
pub fn can_purchase(profile: &ProfileData, id: &str) -> StoreResult<&'static UpgradeNode> {
    let node = node(id).ok_or_else(|| StoreError::UnknownUpgrade(id.to_string()))?;
    if profile.store_rank < node.unlock_rank {
        return Err(StoreError::RankRequired(node.unlock_rank));
    }
    if profile.store_upgrade_level(id) >= node.max_level {
        return Err(StoreError::MaxLevel);
    }
    if profile.store_upgrade_points < node.point_cost {
        return Err(StoreError::NotEnoughPoints);
    }
    for conflict in node.conflicts.iter().filter_map(|c| self::node(c)) {
        if profile.store_upgrade_level(conflict.id) >= conflict.max_level {
            return Err(StoreError::Conflict(conflict.name));
        }
    }
    Ok(node)
}

/// Buy one level. Returns the new level.
pub fn purchase(profile: &mut ProfileData, id: &str) -> StoreResult<u32> {
    let node = can_purchase(profile, id)?;
    if !profile.buy_store_upgrade(node.id, node.point_cost) {
        return Err(StoreError::NotEnoughPoints);
    }
    let level = profile.store_upgrade_level(node.id);
    log::info!("Purchased {} level {}", node.name, level);
    Ok(level)
}

/// Duplicate stacks above `threshold` are converted to tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateInsurance {
    pub threshold: u32,
    pub tokens_per_dupe: u64,
}

/// Effects of the purchased tree, flattened for the services that use them
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StoreBonuses {
    pub sell_price_bonus: f64,
    pub crate_discount: f64,
    pub run_gold_bonus: f64,
    /// Fraction of the bottom of each stat roll that is excluded
    pub stat_stability: f64,
    pub duplicate_insurance: Option<DuplicateInsurance>,
    pub rarity_floor_level: u32,
    pub reforge_level: u32,
    pub fusion_level: u32,
    pub promotion_level: u32,
}

fn at_level<T: Copy + Default>(table: &[T], level: u32) -> T {
    match level {
        0 => T::default(),
        l => table.get(l as usize - 1).or(table.last()).copied().unwrap_or_default(),
    }
}

impl StoreBonuses {
    pub fn from_profile(profile: &ProfileData) -> Self {
        let level = |id| profile.store_upgrade_level(id);
        let insurance_level = level(DUPLICATE_INSURANCE);
        Self {
            sell_price_bonus: at_level(&[0.10, 0.20, 0.30], level(BETTER_SELL_PRICES)),
            crate_discount: at_level(&[0.03, 0.06, 0.10], level(CRATE_DISCOUNTS)),
            run_gold_bonus: at_level(&[0.05, 0.10, 0.15], level(RUN_DIVIDEND)),
            stat_stability: at_level(&[0.25, 0.40], level(STAT_STABILITY)),
            duplicate_insurance: (insurance_level > 0).then(|| {
                let (threshold, tokens_per_dupe) =
                    at_level(&[(5, 10), (4, 15), (3, 25)], insurance_level);
                DuplicateInsurance {
                    threshold,
                    tokens_per_dupe,
                }
            }),
            rarity_floor_level: level(RARITY_FLOOR),
            reforge_level: level(REFORGE_SPECIALIST),
            fusion_level: level(FUSION_LAB),
            promotion_level: level(RARITY_PROMOTION),
        }
    }

    /// Minimum rarity guaranteed in one crate. Floors stack across levels.
    pub fn rarity_floor(&self, kind: CrateKind) -> Option<Rarity> {
        match kind {
            CrateKind::BasicCrate if self.rarity_floor_level >= 1 => Some(Rarity::Rare),
            CrateKind::SilverCrate if self.rarity_floor_level >= 2 => Some(Rarity::Epic),
            _ => None,
        }
    }

    /// Extra Mythic weight, in percent points
    pub fn mythic_boost(&self, kind: CrateKind) -> f64 {
        match kind {
            CrateKind::GoldCrate | CrateKind::LegendaryCrate if self.rarity_floor_level >= 3 => 1.0,
            _ => 0.0,
        }
    }

    pub fn reforge_unlocked(&self) -> bool {
        self.reforge_level >= 1
    }

    pub fn reforge_cost(&self) -> u64 {
        if self.reforge_level >= 2 { 75 } else { 100 }
    }

    pub fn reforge_double_roll(&self) -> bool {
        self.reforge_level >= 3
    }

    pub fn fusion_unlocked(&self) -> bool {
        self.fusion_level >= 1
    }

    pub fn fusion_upgrade_chance(&self) -> f64 {
        if self.fusion_level >= 2 { 0.20 } else { 0.0 }
    }

    pub fn mixed_rarity_fusion(&self) -> bool {
        self.fusion_level >= 3
    }

    pub fn promotion_unlocked(&self) -> bool {
        self.promotion_level >= 1
    }

    pub fn promotion_cost(&self) -> u64 {
        if self.promotion_level >= 2 { 350 } else { 500 }
    }

    pub fn promotion_daily_limit(&self) -> u32 {
        self.promotion_level.min(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(rank: u32, points: u32) -> ProfileData {
        let mut profile = ProfileData::default();
        profile.store_rank = rank;
        profile.store_upgrade_points = points;
        profile
    }

    #[test]
    fn test_rows_follow_ranks() {
        for node in &UPGRADE_TREE {
            let expected = match node.row {
                1 => 2,
                2 => 5,
                _ => 7,
            };
            assert_eq!(node.unlock_rank, expected, "{}", node.id);
            assert_eq!(node.effects.len() as u32, node.max_level, "{}", node.id);
        }
        assert_eq!(branch_nodes(Branch::Services).count(), 3);
    }

    #[test]
    fn test_purchase_checks_in_order() {
        let mut profile = ranked(1, 0);
        assert_eq!(purchase(&mut profile, "nope"), Err(StoreError::UnknownUpgrade("nope".into())));
        assert_eq!(purchase(&mut profile, RARITY_FLOOR), Err(StoreError::RankRequired(2)));
        profile.store_rank = 2;
        assert_eq!(purchase(&mut profile, RARITY_FLOOR), Err(StoreError::NotEnoughPoints));
        profile.store_upgrade_points = 1;
        assert_eq!(purchase(&mut profile, RARITY_FLOOR), Ok(1));
        assert_eq!(profile.store_upgrade_points, 0);
    }

    #[test]
    fn test_max_level() {
        let mut profile = ranked(5, 5);
        profile.store_upgrades.insert(STAT_STABILITY.into(), 2);
        assert_eq!(purchase(&mut profile, STAT_STABILITY), Err(StoreError::MaxLevel));
    }

    #[test]
    fn test_conflict_only_at_max_level() {
        let mut profile = ranked(5, 5);
        profile.store_upgrades.insert(BETTER_SELL_PRICES.into(), 2);
        assert_eq!(purchase(&mut profile, CRATE_DISCOUNTS), Ok(1));
        profile.store_upgrades.insert(BETTER_SELL_PRICES.into(), 3);
        assert_eq!(
            purchase(&mut profile, CRATE_DISCOUNTS),
            Err(StoreError::Conflict("Better Sell Prices"))
        );
    }

    #[test]
    fn test_bonuses_from_levels() {
        let mut profile = ProfileData::default();
        assert_eq!(StoreBonuses::from_profile(&profile), StoreBonuses::default());

        profile.store_upgrades.insert(CRATE_DISCOUNTS.into(), 3);
        profile.store_upgrades.insert(DUPLICATE_INSURANCE.into(), 2);
        profile.store_upgrades.insert(RARITY_FLOOR.into(), 3);
        profile.store_upgrades.insert(RARITY_PROMOTION.into(), 2);
        let bonuses = StoreBonuses::from_profile(&profile);
        assert_eq!(bonuses.crate_discount, 0.10);
        assert_eq!(
            bonuses.duplicate_insurance,
            Some(DuplicateInsurance { threshold: 4, tokens_per_dupe: 15 })
        );
        assert_eq!(bonuses.rarity_floor(CrateKind::BasicCrate), Some(Rarity::Rare));
        assert_eq!(bonuses.rarity_floor(CrateKind::SilverCrate), Some(Rarity::Epic));
        assert_eq!(bonuses.rarity_floor(CrateKind::GoldCrate), None);
        assert_eq!(bonuses.mythic_boost(CrateKind::LegendaryCrate), 1.0);
        assert_eq!(bonuses.promotion_cost(), 350);
        assert_eq!(bonuses.promotion_daily_limit(), 2);
    }
}
