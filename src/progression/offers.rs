//! Rotating store deals
//!
//! Three offers drawn by weight from a fixed pool. Each can be bought once;
//! the set is replaced by a refresh, the first of which is free.

use rand::Rng;
use rand::seq::IndexedRandom;

use super::gacha::{CrateOpening, add_to_inventory, open_crate};
use super::items::{CrateKind, ITEMS, ItemCategory, ItemInstance, Rarity, StatKind, generate_instance};
use super::rank;
use super::upgrade_tree::StoreBonuses;
use super::{StoreError, StoreResult};
use crate::persistence::ProfileData;

pub const OFFERS_PER_REFRESH: usize = 3;
pub const REFRESH_GOLD: u64 = 50;
pub const REFRESH_TOKENS: u64 = 20;
/// Store rank that opens the rotating deals
pub const ROTATING_DEALS_RANK: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferCost {
    Gold(u64),
    Tokens(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundlePart {
    Crate(CrateKind),
    Tokens(u64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OfferReward {
    /// One item from the given categories, of one rarity or any
    RandomItem {
        categories: &'static [ItemCategory],
        rarity: Option<Rarity>,
    },
    /// Items of a category that carry `stat`
    FilteredItems {
        category: ItemCategory,
        stat: StatKind,
        count: u32,
    },
    Bundle(&'static [BundlePart]),
    StoreXp(u64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offer {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub cost: OfferCost,
    pub reward: OfferReward,
    /// Relative draw weight
    pub weight: u32,
}

pub static OFFER_POOL: [Offer; 10] = [
    Offer {
        id: "epic_gem_bundle",
        name: "Epic Gem Bundle",
        description: "Random Epic-rarity stat gem at a discount",
        cost: OfferCost::Gold(400),
        reward: OfferReward::RandomItem {
            categories: &[ItemCategory::StatGem],
            rarity: Some(Rarity::Epic),
        },
        weight: 10,
    },
    Offer {
        id: "legendary_gem_bundle",
        name: "Legendary Gem Bundle",
        description: "Random Legendary-rarity stat gem",
        cost: OfferCost::Gold(1500),
        reward: OfferReward::RandomItem {
            categories: &[ItemCategory::StatGem],
            rarity: Some(Rarity::Legendary),
        },
        weight: 5,
    },
    Offer {
        id: "damage_focus_crate",
        name: "Damage Focus Crate",
        description: "3 stat gems focused on damage",
        cost: OfferCost::Gold(350),
        reward: OfferReward::FilteredItems {
            category: ItemCategory::StatGem,
            stat: StatKind::Damage,
            count: 3,
        },
        weight: 8,
    },
    Offer {
        id: "defense_focus_crate",
        name: "Defense Focus Crate",
        description: "3 stat gems focused on HP/survivability",
        cost: OfferCost::Gold(350),
        reward: OfferReward::FilteredItems {
            category: ItemCategory::StatGem,
            stat: StatKind::MaxHp,
            count: 3,
        },
        weight: 8,
    },
    Offer {
        id: "token_boost_pack",
        name: "Token Boost Pack",
        description: "100 Shop Tokens + 1 Silver Crate",
        cost: OfferCost::Gold(600),
        reward: OfferReward::Bundle(&[BundlePart::Tokens(100), BundlePart::Crate(CrateKind::SilverCrate)]),
        weight: 7,
    },
    Offer {
        id: "store_xp_boost",
        name: "Store XP Boost",
        description: "200 Store XP to rank up faster",
        cost: OfferCost::Tokens(50),
        reward: OfferReward::StoreXp(200),
        weight: 6,
    },
    Offer {
        id: "starter_pack",
        name: "Adventurer's Starter Pack",
        description: "2 Basic Crates + 50 Shop Tokens",
        cost: OfferCost::Gold(150),
        reward: OfferReward::Bundle(&[
            BundlePart::Crate(CrateKind::BasicCrate),
            BundlePart::Crate(CrateKind::BasicCrate),
            BundlePart::Tokens(50),
        ]),
        weight: 12,
    },
    Offer {
        id: "gold_saver_pack",
        name: "Economy Pack",
        description: "1 Silver Crate + 1 Gold Crate at 15% discount",
        cost: OfferCost::Gold(2100),
        reward: OfferReward::Bundle(&[
            BundlePart::Crate(CrateKind::SilverCrate),
            BundlePart::Crate(CrateKind::GoldCrate),
        ]),
        weight: 9,
    },
    Offer {
        id: "random_cosmetic",
        name: "Mystery Cosmetic",
        description: "Random weapon or character skin",
        cost: OfferCost::Gold(300),
        reward: OfferReward::RandomItem {
            categories: &[ItemCategory::WeaponSkin, ItemCategory::CharacterSkin],
            rarity: None,
        },
        weight: 10,
    },
    Offer {
        id: "jackpot_bundle",
        name: "Jackpot Bundle",
        description: "1 Legendary Crate + 200 Shop Tokens",
        cost: OfferCost::Gold(9500),
        reward: OfferReward::Bundle(&[
            BundlePart::Crate(CrateKind::LegendaryCrate),
            BundlePart::Tokens(200),
        ]),
        weight: 3,
    },
];

pub fn offer(id: &str) -> Option<&'static Offer> {
    OFFER_POOL.iter().find(|o| o.id == id)
}

/// Weighted draw without replacement
pub fn select_weighted_offers<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<&'static Offer> {
    let mut pool: Vec<&'static Offer> = OFFER_POOL.iter().collect();
    let mut selected = Vec::with_capacity(count);
    while selected.len() < count && !pool.is_empty() {
        let total: u32 = pool.iter().map(|o| o.weight).sum();
        let mut roll = rng.random::<f64>() * f64::from(total);
        let chosen = pool.iter().position(|o| {
            roll -= f64::from(o.weight);
            roll <= 0.0
        });
        // A roll of exactly the total can slip past the last offer
        let index = chosen.unwrap_or(pool.len() - 1);
        selected.push(pool.remove(index));
    }
    selected
}

/// Offers still on sale
pub fn current_offers(profile: &ProfileData) -> Vec<&'static Offer> {
    profile
        .rotating_offers
        .current_offers
        .iter()
        .filter_map(|id| offer(id))
        .collect()
}

fn require_deals(profile: &ProfileData) -> StoreResult<()> {
    if rank::rotating_deals_unlocked(profile.store_rank) {
        Ok(())
    } else {
        Err(StoreError::RankRequired(ROTATING_DEALS_RANK))
    }
}

fn replace_offers<R: Rng + ?Sized>(profile: &mut ProfileData, now_ms: u64, rng: &mut R) -> Vec<&'static Offer> {
    let offers = select_weighted_offers(OFFERS_PER_REFRESH, rng);
    profile.rotating_offers.current_offers = offers.iter().map(|o| o.id.to_string()).collect();
    profile.rotating_offers.last_refresh = now_ms;
    offers
}

/// Fill an empty deal list for free, e.g. when the store is opened
pub fn ensure_offers<R: Rng + ?Sized>(profile: &mut ProfileData, now_ms: u64, rng: &mut R) -> StoreResult<Vec<&'static Offer>> {
    require_deals(profile)?;
    if profile.rotating_offers.current_offers.is_empty() {
        return Ok(replace_offers(profile, now_ms, rng));
    }
    Ok(current_offers(profile))
}

/// Currency used for a paid refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPayment {
    Gold,
    Tokens,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOutcome {
    pub offers: Vec<&'static Offer>,
    /// `None` when the free refresh was used
    pub paid: Option<OfferCost>,
}

/// Draw a new set of deals. The first refresh is free; later ones cost
/// 50 gold or 20 tokens, whichever `payment` names.
pub fn refresh_offers<R: Rng + ?Sized>(
    profile: &mut ProfileData,
    payment: RefreshPayment,
    now_ms: u64,
    rng: &mut R,
) -> StoreResult<RefreshOutcome> {
    require_deals(profile)?;
    let paid = if !profile.rotating_offers.free_refresh_used {
        profile.rotating_offers.free_refresh_used = true;
        None
    } else {
        if profile.gold < REFRESH_GOLD && profile.shop_tokens < REFRESH_TOKENS {
            return Err(StoreError::RefreshUnaffordable {
                gold: REFRESH_GOLD,
                tokens: REFRESH_TOKENS,
            });
        }
        match payment {
            RefreshPayment::Gold => {
                profile.spend_gold(REFRESH_GOLD)?;
                Some(OfferCost::Gold(REFRESH_GOLD))
            }
            RefreshPayment::Tokens => {
                profile.spend_tokens(REFRESH_TOKENS)?;
                Some(OfferCost::Tokens(REFRESH_TOKENS))
            }
        }
    };
    Ok(RefreshOutcome {
        offers: replace_offers(profile, now_ms, rng),
        paid,
    })
}

/// Give the free refresh back, e.g. on a new session
pub fn reset_free_refresh(profile: &mut ProfileData) {
    profile.rotating_offers.free_refresh_used = false;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Granted {
    Item(ItemInstance),
    Crate(CrateOpening),
    Tokens(u64),
    StoreXp(u64),
}

fn grant_item<R: Rng + ?Sized>(
    profile: &mut ProfileData,
    pool: &[&'static super::items::ItemDef],
    rng: &mut R,
) -> Option<Granted> {
    let def = pool.choose(rng)?;
    let stability = StoreBonuses::from_profile(profile).stat_stability;
    let item = generate_instance(def, stability, rng);
    add_to_inventory(profile, item.clone());
    Some(Granted::Item(item))
}

fn grant<R: Rng + ?Sized>(profile: &mut ProfileData, reward: OfferReward, rng: &mut R) -> Vec<Granted> {
    match reward {
        OfferReward::RandomItem { categories, rarity } => {
            let pool: Vec<_> = ITEMS
                .iter()
                .filter(|d| categories.contains(&d.category))
                .filter(|d| rarity.is_none_or(|r| d.rarity == r))
                .collect();
            grant_item(profile, &pool, rng).into_iter().collect()
        }
        OfferReward::FilteredItems { category, stat, count } => {
            let pool: Vec<_> = ITEMS
                .iter()
                .filter(|d| d.category == category && d.has_stat(stat))
                .collect();
            (0..count).filter_map(|_| grant_item(profile, &pool, rng)).collect()
        }
        OfferReward::Bundle(parts) => parts
            .iter()
            .map(|part| match *part {
                BundlePart::Crate(kind) => Granted::Crate(open_crate(profile, kind, rng)),
                BundlePart::Tokens(amount) => Granted::Tokens(profile.add_shop_tokens(amount)),
            })
            .collect(),
        OfferReward::StoreXp(amount) => {
            profile.add_store_xp(amount);
            vec![Granted::StoreXp(amount)]
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OfferPurchase {
    pub offer: &'static Offer,
    pub granted: Vec<Granted>,
}

/// Buy one of the current deals. The deal is removed once bought.
pub fn purchase_offer<R: Rng + ?Sized>(
    profile: &mut ProfileData,
    offer_id: &str,
    rng: &mut R,
) -> StoreResult<OfferPurchase> {
    require_deals(profile)?;
    let index = profile
        .rotating_offers
        .current_offers
        .iter()
        .position(|id| id == offer_id)
        .ok_or(StoreError::OfferNotFound)?;
    let offer = offer(offer_id).ok_or(StoreError::OfferNotFound)?;
    match offer.cost {
        OfferCost::Gold(cost) => profile.spend_gold(cost)?,
        OfferCost::Tokens(cost) => profile.spend_tokens(cost)?,
    }
    profile.rotating_offers.current_offers.remove(index);
    let granted = grant(profile, offer.reward, rng);
    log::info!("Bought offer {} ({} rewards)", offer.name, granted.len());
    Ok(OfferPurchase { offer, granted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn dealer() -> ProfileData {
        let mut profile = ProfileData::default();
        profile.store_rank = ROTATING_DEALS_RANK;
        profile
    }

    #[test]
    fn test_selection_is_distinct() {
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..100 {
            let offers = select_weighted_offers(3, &mut rng);
            assert_eq!(offers.len(), 3);
            assert_ne!(offers[0].id, offers[1].id);
            assert_ne!(offers[0].id, offers[2].id);
            assert_ne!(offers[1].id, offers[2].id);
        }
        assert_eq!(select_weighted_offers(20, &mut rng).len(), OFFER_POOL.len());
    }

    #[test]
    fn test_deals_need_rank() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut profile = ProfileData::default();
        assert_eq!(
            refresh_offers(&mut profile, RefreshPayment::Gold, 0, &mut rng),
            Err(StoreError::RankRequired(3))
        );
    }

    #[test]
    fn test_first_refresh_free_then_paid() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut profile = dealer();
        let first = refresh_offers(&mut profile, RefreshPayment::Gold, 10, &mut rng).expect("free");
        assert_eq!(first.paid, None);
        assert_eq!(profile.rotating_offers.current_offers.len(), 3);
        assert_eq!(profile.rotating_offers.last_refresh, 10);

        assert_eq!(
            refresh_offers(&mut profile, RefreshPayment::Gold, 20, &mut rng),
            Err(StoreError::RefreshUnaffordable { gold: 50, tokens: 20 })
        );

        profile.shop_tokens = 25;
        assert_eq!(
            refresh_offers(&mut profile, RefreshPayment::Gold, 20, &mut rng),
            Err(StoreError::NotEnoughGold(50))
        );
        let paid = refresh_offers(&mut profile, RefreshPayment::Tokens, 20, &mut rng).expect("tokens");
        assert_eq!(paid.paid, Some(OfferCost::Tokens(20)));
        assert_eq!(profile.shop_tokens, 5);
        assert_eq!(profile.store_xp, 0);
    }

    #[test]
    fn test_purchase_is_single_use() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut profile = dealer();
        profile.rotating_offers.current_offers = vec!["starter_pack".into()];
        profile.gold = 300;
        let bought = purchase_offer(&mut profile, "starter_pack", &mut rng).expect("buy");
        assert_eq!(bought.granted.len(), 3);
        assert_eq!(profile.gold, 150);
        assert_eq!(profile.shop_tokens, 50);
        assert!(profile.inventory.items.iter().map(|i| i.count).sum::<u32>() == 2);
        assert_eq!(
            purchase_offer(&mut profile, "starter_pack", &mut rng),
            Err(StoreError::OfferNotFound)
        );
    }

    #[test]
    fn test_filtered_gems_carry_stat() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut profile = dealer();
        profile.rotating_offers.current_offers = vec!["defense_focus_crate".into()];
        profile.gold = 350;
        let bought = purchase_offer(&mut profile, "defense_focus_crate", &mut rng).expect("buy");
        assert_eq!(bought.granted.len(), 3);
        for granted in &bought.granted {
            match granted {
                Granted::Item(item) => assert_eq!(item.id, "g_hp_s"),
                other => panic!("unexpected grant {other:?}"),
            }
        }
    }

    #[test]
    fn test_xp_boost_paid_in_tokens() {
        let mut rng = Pcg32::seed_from_u64(6);
        let mut profile = dealer();
        profile.store_xp = 300;
        profile.rotating_offers.current_offers = vec!["store_xp_boost".into()];
        assert_eq!(
            purchase_offer(&mut profile, "store_xp_boost", &mut rng),
            Err(StoreError::NotEnoughTokens(50))
        );
        profile.shop_tokens = 50;
        purchase_offer(&mut profile, "store_xp_boost", &mut rng).expect("buy");
        assert_eq!(profile.store_xp, 500);
        assert_eq!(profile.shop_tokens, 0);
    }
}
