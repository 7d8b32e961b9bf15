//! Store rank ladder
//!
//! Store XP is earned one-for-one with shop tokens. Each rank grants upgrade
//! points for the tree and may unlock crates, services or tree rows.

use super::items::CrateKind;

pub const MAX_RANK: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Unlock {
    Crate(CrateKind),
    Service(Service),
    UpgradeRow(u32),
    RotatingDeals,
    /// Extra fraction of every token grant
    TokenBoost(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Reforge,
    Fusion,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankDef {
    pub rank: u32,
    pub name: &'static str,
    pub xp_required: u64,
    pub upgrade_points: u32,
    pub unlocks: &'static [Unlock],
}

pub static RANKS: [RankDef; 10] = [
    RankDef {
        rank: 1,
        name: "Novice Merchant",
        xp_required: 0,
        upgrade_points: 0,
        unlocks: &[Unlock::Crate(CrateKind::BasicCrate)],
    },
    RankDef {
        rank: 2,
        name: "Apprentice Trader",
        xp_required: 100,
        upgrade_points: 1,
        unlocks: &[
            Unlock::Crate(CrateKind::SilverCrate),
            Unlock::Service(Service::Reforge),
            Unlock::UpgradeRow(1),
        ],
    },
    RankDef {
        rank: 3,
        name: "Skilled Vendor",
        xp_required: 300,
        upgrade_points: 1,
        unlocks: &[Unlock::RotatingDeals],
    },
    RankDef {
        rank: 4,
        name: "Master Merchant",
        xp_required: 600,
        upgrade_points: 1,
        unlocks: &[Unlock::Crate(CrateKind::GoldCrate)],
    },
    RankDef {
        rank: 5,
        name: "Elite Broker",
        xp_required: 1000,
        upgrade_points: 2,
        unlocks: &[Unlock::UpgradeRow(2)],
    },
    RankDef {
        rank: 6,
        name: "Arcane Artisan",
        xp_required: 1500,
        upgrade_points: 1,
        unlocks: &[Unlock::Service(Service::Fusion)],
    },
    RankDef {
        rank: 7,
        name: "Legendary Dealer",
        xp_required: 2100,
        upgrade_points: 1,
        unlocks: &[Unlock::UpgradeRow(3)],
    },
    RankDef {
        rank: 8,
        name: "Mythic Curator",
        xp_required: 2800,
        upgrade_points: 1,
        unlocks: &[Unlock::Crate(CrateKind::LegendaryCrate)],
    },
    RankDef {
        rank: 9,
        name: "Cosmic Merchant",
        xp_required: 3600,
        upgrade_points: 1,
        unlocks: &[],
    },
    RankDef {
        rank: 10,
        name: "Transcendent Tycoon",
        xp_required: 4500,
        upgrade_points: 2,
        unlocks: &[Unlock::TokenBoost(0.05)],
    },
];

pub fn rank_def(rank: u32) -> Option<&'static RankDef> {
    RANKS.iter().find(|r| r.rank == rank)
}

/// Highest rank whose threshold `xp` meets
pub fn rank_for_xp(xp: u64) -> u32 {
    RANKS
        .iter()
        .rev()
        .find(|r| xp >= r.xp_required)
        .map_or(1, |r| r.rank)
}

/// XP threshold of the next rank, `None` at max rank
pub fn xp_for_next_rank(rank: u32) -> Option<u64> {
    rank_def(rank + 1).map(|r| r.xp_required)
}

/// Fraction of the way from the current rank to the next, 1.0 at max rank
pub fn progress(xp: u64, rank: u32) -> f64 {
    let (Some(current), Some(next)) = (rank_def(rank), xp_for_next_rank(rank)) else {
        return 1.0;
    };
    let span = next.saturating_sub(current.xp_required);
    if span == 0 {
        return 1.0;
    }
    (xp.saturating_sub(current.xp_required) as f64 / span as f64).clamp(0.0, 1.0)
}

/// Every unlock granted at or below `rank`
pub fn unlocks_up_to(rank: u32) -> impl Iterator<Item = &'static Unlock> {
    RANKS
        .iter()
        .take_while(move |r| r.rank <= rank)
        .flat_map(|r| r.unlocks.iter())
}

pub fn is_crate_unlocked(kind: CrateKind, rank: u32) -> bool {
    unlocks_up_to(rank).any(|u| *u == Unlock::Crate(kind))
}

pub fn is_service_unlocked(service: Service, rank: u32) -> bool {
    unlocks_up_to(rank).any(|u| *u == Unlock::Service(service))
}

pub fn rotating_deals_unlocked(rank: u32) -> bool {
    unlocks_up_to(rank).any(|u| *u == Unlock::RotatingDeals)
}

/// Upgrade rows reachable in the store tree
pub fn unlocked_upgrade_rows(rank: u32) -> u32 {
    unlocks_up_to(rank)
        .filter_map(|u| match u {
            Unlock::UpgradeRow(row) => Some(*row),
            _ => None,
        })
        .max()
        .unwrap_or(0)
}

/// Sum of points granted by ranks 2 through `rank`
pub fn total_upgrade_points(rank: u32) -> u32 {
    RANKS
        .iter()
        .take_while(|r| r.rank <= rank)
        .map(|r| r.upgrade_points)
        .sum()
}

/// Bonus fraction applied to token grants
pub fn token_bonus(rank: u32) -> f64 {
    unlocks_up_to(rank)
        .map(|u| match u {
            Unlock::TokenBoost(bonus) => *bonus,
            _ => 0.0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_thresholds() {
        assert_eq!(rank_for_xp(0), 1);
        assert_eq!(rank_for_xp(99), 1);
        assert_eq!(rank_for_xp(100), 2);
        assert_eq!(rank_for_xp(2799), 7);
        assert_eq!(rank_for_xp(1_000_000), MAX_RANK);
    }

    #[test]
    fn test_progress_within_rank() {
        assert!((progress(200, 2) - 0.5).abs() < 1e-9);
        assert_eq!(progress(9999, MAX_RANK), 1.0);
        assert_eq!(xp_for_next_rank(MAX_RANK), None);
    }

    #[test]
    fn test_unlocks_accumulate() {
        assert!(is_crate_unlocked(CrateKind::BasicCrate, 1));
        assert!(!is_crate_unlocked(CrateKind::SilverCrate, 1));
        assert!(is_crate_unlocked(CrateKind::GoldCrate, 6));
        assert!(!is_crate_unlocked(CrateKind::LegendaryCrate, 7));
        assert!(is_service_unlocked(Service::Reforge, 2));
        assert!(!is_service_unlocked(Service::Fusion, 5));
        assert!(!rotating_deals_unlocked(2));
        assert!(rotating_deals_unlocked(3));
    }

    #[test]
    fn test_rows_points_and_token_bonus() {
        assert_eq!(unlocked_upgrade_rows(1), 0);
        assert_eq!(unlocked_upgrade_rows(6), 2);
        assert_eq!(unlocked_upgrade_rows(10), 3);
        assert_eq!(total_upgrade_points(5), 5);
        assert_eq!(total_upgrade_points(MAX_RANK), 11);
        assert_eq!(token_bonus(9), 0.0);
        assert_eq!(token_bonus(10), 0.05);
    }
}
