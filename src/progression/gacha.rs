//! Crate rolls, inventory stacking, and selling

use rand::Rng;
use rand::seq::IndexedRandom;

use super::items::{CrateKind, ITEMS, ItemDef, ItemInstance, Rarity, generate_instance};
use super::rank::{self, RANKS, Unlock};
use super::upgrade_tree::StoreBonuses;
use super::{StoreError, StoreResult};
use crate::persistence::ProfileData;

/// Cumulative roll over percent weights in [`Rarity::ALL`] order.
/// Falls back to Common if the roll lands past the table.
pub fn roll_rarity<R: Rng + ?Sized>(weights: &[f64; 5], rng: &mut R) -> Rarity {
    let roll = rng.random::<f64>() * 100.0;
    let mut cumulative = 0.0;
    for (rarity, weight) in Rarity::ALL.iter().zip(weights) {
        cumulative += weight;
        if roll < cumulative {
            return *rarity;
        }
    }
    Rarity::Common
}

/// Uniform pick among catalog items of `rarity`, or the first catalog item
pub fn roll_item<R: Rng + ?Sized>(rarity: Rarity, rng: &mut R) -> &'static ItemDef {
    let pool: Vec<&'static ItemDef> = ITEMS.iter().filter(|d| d.rarity == rarity).collect();
    pool.choose(rng).copied().unwrap_or(&ITEMS[0])
}

/// Move `boost` percent points onto Mythic, taken from the lowest tier that
/// has weight to spare
pub fn boosted_weights(mut weights: [f64; 5], boost: f64) -> [f64; 5] {
    if boost <= 0.0 {
        return weights;
    }
    let mythic = Rarity::Mythic.index();
    if let Some(donor) = weights[..mythic].iter().position(|w| *w >= boost) {
        weights[donor] -= boost;
        weights[mythic] += boost;
    }
    weights
}

/// Where an added item ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stacked {
    pub index: usize,
    pub duplicate: bool,
}

/// Stack onto an existing instance with the same id and stats, or append
pub fn add_to_inventory(profile: &mut ProfileData, item: ItemInstance) -> Stacked {
    let items = &mut profile.inventory.items;
    match items.iter().position(|i| i.stacks_with(&item)) {
        Some(index) => {
            items[index].count += item.count.max(1);
            Stacked {
                index,
                duplicate: true,
            }
        }
        None => {
            items.push(item);
            Stacked {
                index: items.len() - 1,
                duplicate: false,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrateReward {
    /// The rolled item as drawn, before stacking
    pub item: ItemInstance,
    pub duplicate: bool,
    /// Size of the stack after this reward
    pub stack_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrateOpening {
    pub kind: CrateKind,
    pub rewards: Vec<CrateReward>,
    /// Tokens granted by duplicate insurance
    pub insurance_tokens: u64,
}

/// Roll the rarities for one crate, applying the rarity floor and mythic boost
pub fn roll_crate_rarities<R: Rng + ?Sized>(
    kind: CrateKind,
    bonuses: &StoreBonuses,
    rng: &mut R,
) -> Vec<Rarity> {
    let def = kind.def();
    let weights = boosted_weights(def.weights, bonuses.mythic_boost(kind));
    let mut rarities: Vec<Rarity> = (0..def.items).map(|_| roll_rarity(&weights, rng)).collect();
    if let Some(floor) = bonuses.rarity_floor(kind) {
        if !rarities.iter().any(|r| *r >= floor) {
            if let Some(last) = rarities.last_mut() {
                log::debug!("{kind}: rarity floor lifts {last} to {floor}");
                *last = floor;
            }
        }
    }
    rarities
}

/// Open a crate the player already owns. Items go straight to the inventory.
pub fn open_crate<R: Rng + ?Sized>(profile: &mut ProfileData, kind: CrateKind, rng: &mut R) -> CrateOpening {
    let bonuses = StoreBonuses::from_profile(profile);
    let mut opening = CrateOpening {
        kind,
        rewards: Vec::new(),
        insurance_tokens: 0,
    };

    for rarity in roll_crate_rarities(kind, &bonuses, rng) {
        let def = roll_item(rarity, rng);
        let item = generate_instance(def, bonuses.stat_stability, rng);
        let stacked = add_to_inventory(profile, item.clone());
        let stack = &mut profile.inventory.items[stacked.index];

        let mut refund = 0;
        if let Some(insurance) = bonuses.duplicate_insurance {
            if stack.count > insurance.threshold {
                let excess = u64::from(stack.count - insurance.threshold);
                stack.count = insurance.threshold;
                refund = excess * insurance.tokens_per_dupe;
            }
        }
        let stack_count = stack.count;
        if refund > 0 {
            opening.insurance_tokens += profile.add_shop_tokens(refund);
        }

        log::debug!("{kind}: {} ({})", def.name, rarity);
        opening.rewards.push(CrateReward {
            item,
            duplicate: stacked.duplicate,
            stack_count,
        });
    }
    opening
}

/// Rank that first unlocks a crate
pub fn crate_unlock_rank(kind: CrateKind) -> u32 {
    RANKS
        .iter()
        .find(|r| r.unlocks.contains(&Unlock::Crate(kind)))
        .map_or(1, |r| r.rank)
}

/// Price after the crate discount, floored
pub fn crate_price(kind: CrateKind, bonuses: &StoreBonuses) -> u64 {
    (kind.def().cost as f64 * (1.0 - bonuses.crate_discount)).floor() as u64
}

/// Pay for and open a crate
pub fn buy_crate<R: Rng + ?Sized>(
    profile: &mut ProfileData,
    kind: CrateKind,
    rng: &mut R,
) -> StoreResult<CrateOpening> {
    if !rank::is_crate_unlocked(kind, profile.store_rank) {
        return Err(StoreError::RankRequired(crate_unlock_rank(kind)));
    }
    let price = crate_price(kind, &StoreBonuses::from_profile(profile));
    profile.spend_gold(price)?;
    log::info!("Bought {kind} for {price} gold");
    Ok(open_crate(profile, kind, rng))
}

/// Sell one unit of a stack. Returns the gold received.
pub fn sell_item(profile: &mut ProfileData, uid: &str) -> StoreResult<u64> {
    let bonus = StoreBonuses::from_profile(profile).sell_price_bonus;
    let item = profile.consume_one(uid)?;
    let base = if item.sell_price > 0 { item.sell_price } else { 50 };
    let price = (base as f64 * (1.0 + bonus)).floor() as u64;
    profile.add_gold(price);
    log::info!("Sold {} for {} gold", item.name, price);
    Ok(price)
}
