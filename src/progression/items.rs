//! Item catalog, rarity tiers, crates, and item instances

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl Rarity {
    /// Lowest to highest
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
        Rarity::Mythic,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Rarity> {
        Self::ALL.get(index).copied()
    }

    /// One tier up, `None` at Mythic
    pub fn next(self) -> Option<Rarity> {
        Self::from_index(self.index() + 1)
    }

    pub fn color(self) -> &'static str {
        match self {
            Rarity::Common => "#95a5a6",
            Rarity::Rare => "#3498db",
            Rarity::Epic => "#9b59b6",
            Rarity::Legendary => "#f1c40f",
            Rarity::Mythic => "#e74c3c",
        }
    }

    /// Nominal drop chance in percent
    pub fn chance(self) -> f64 {
        match self {
            Rarity::Common => 50.0,
            Rarity::Rare => 30.0,
            Rarity::Epic => 15.0,
            Rarity::Legendary => 4.5,
            Rarity::Mythic => 0.5,
        }
    }

    /// Tier value, used as the sell price after a promotion
    pub fn gold_value(self) -> u64 {
        match self {
            Rarity::Common => 50,
            Rarity::Rare => 150,
            Rarity::Epic => 500,
            Rarity::Legendary => 2000,
            Rarity::Mythic => 10000,
        }
    }

    /// Sell price of catalog items of this tier
    pub fn sell_value(self) -> u64 {
        match self {
            Rarity::Common => 20,
            Rarity::Rare => 100,
            Rarity::Epic => 400,
            Rarity::Legendary => 1500,
            Rarity::Mythic => 5000,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Rarity::Common => "COMMON",
            Rarity::Rare => "RARE",
            Rarity::Epic => "EPIC",
            Rarity::Legendary => "LEGENDARY",
            Rarity::Mythic => "MYTHIC",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemCategory {
    WeaponSkin,
    CharacterSkin,
    KillEffect,
    AuraEffect,
    StatGem,
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemCategory::WeaponSkin => "WEAPON_SKIN",
            ItemCategory::CharacterSkin => "CHARACTER_SKIN",
            ItemCategory::KillEffect => "KILL_EFFECT",
            ItemCategory::AuraEffect => "AURA_EFFECT",
            ItemCategory::StatGem => "STAT_GEM",
        })
    }
}

/// Stats a gem can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatKind {
    /// Percent damage
    Damage,
    /// Percent move speed
    Speed,
    /// Flat max HP
    MaxHp,
    /// Flat crit chance, in percent
    CritChance,
}

impl StatKind {
    fn unit(self) -> &'static str {
        match self {
            StatKind::Damage | StatKind::Speed | StatKind::CritChance => "%",
            StatKind::MaxHp => " HP",
        }
    }

    fn label(self) -> &'static str {
        match self {
            StatKind::Damage => "DAMAGE",
            StatKind::Speed => "SPEED",
            StatKind::MaxHp => "MAXHP",
            StatKind::CritChance => "CRITCHANCE",
        }
    }
}

pub type ItemStats = BTreeMap<StatKind, f64>;

/// Static catalog entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemDef {
    pub id: &'static str,
    pub name: &'static str,
    pub category: ItemCategory,
    pub rarity: Rarity,
    pub desc: &'static str,
    /// Base stats before the variance roll
    pub stats: &'static [(StatKind, f64)],
    /// Roll spread, 0.2 means +/-20%
    pub variance: f64,
}

impl ItemDef {
    pub fn sell_price(&self) -> u64 {
        self.rarity.sell_value()
    }

    pub fn has_stat(&self, kind: StatKind) -> bool {
        self.stats.iter().any(|(k, v)| *k == kind && *v != 0.0)
    }
}

macro_rules! cosmetic {
    ($id:literal, $name:literal, $cat:ident, $rarity:ident, $desc:literal) => {
        ItemDef {
            id: $id,
            name: $name,
            category: ItemCategory::$cat,
            rarity: Rarity::$rarity,
            desc: $desc,
            stats: &[],
            variance: 0.0,
        }
    };
}

macro_rules! gem {
    ($id:literal, $name:literal, $rarity:ident, $stat:ident = $val:literal, $variance:literal, $desc:literal) => {
        ItemDef {
            id: $id,
            name: $name,
            category: ItemCategory::StatGem,
            rarity: Rarity::$rarity,
            desc: $desc,
            stats: &[(StatKind::$stat, $val)],
            variance: $variance,
        }
    };
}

pub static ITEMS: &[ItemDef] = &[
    cosmetic!("w_plasma", "Plasma Blaster", WeaponSkin, Common, "A standard plasma finish."),
    cosmetic!("w_golden", "Golden Gun", WeaponSkin, Legendary, "Pure gold plating."),
    cosmetic!("w_neon", "Neon Tracer", WeaponSkin, Rare, "Leaves a bright trail."),
    cosmetic!("w_pixel", "Pixel Destroyer", WeaponSkin, Epic, "Glitchy visual effects."),
    cosmetic!("w_void", "Void Beam", WeaponSkin, Mythic, "Shoots pure darkness."),
    cosmetic!("c_marine", "Space Marine", CharacterSkin, Common, "Standard issue armor."),
    cosmetic!("c_ninja", "Cyber Ninja", CharacterSkin, Rare, "Stealthy and sleek."),
    cosmetic!("c_robot", "Retro Robot", CharacterSkin, Epic, "Beep boop."),
    cosmetic!("c_knight", "Golden Knight", CharacterSkin, Legendary, "Shining armor."),
    cosmetic!("c_voidwalker", "Void Walker", CharacterSkin, Mythic, "One with the abyss."),
    cosmetic!("k_pixel", "Pixel Explosion", KillEffect, Common, "Standard pop."),
    cosmetic!("k_confetti", "Confetti Pop", KillEffect, Rare, "Party time!"),
    cosmetic!("k_gold", "Gold Coins", KillEffect, Legendary, "Rains money."),
    cosmetic!("k_blackhole", "Black Hole", KillEffect, Mythic, "Sucks them into nothingness."),
    cosmetic!("a_sparkles", "Rainbow Sparkles", AuraEffect, Rare, "Fabulous."),
    cosmetic!("a_fire", "Fire Ring", AuraEffect, Epic, "Burning intensity."),
    cosmetic!("a_void", "Void Particles", AuraEffect, Mythic, "Dark matter floats around you."),
    gem!("g_dmg_s", "Ruby Shard", Common, Damage = 2.0, 0.2, "+~2% Damage"),
    gem!("g_spd_s", "Sapphire Shard", Common, Speed = 5.0, 0.2, "+~5% Speed"),
    gem!("g_hp_s", "Emerald Shard", Common, MaxHp = 10.0, 0.2, "+~10 HP"),
    gem!("g_dmg_m", "Ruby Gem", Rare, Damage = 5.0, 0.15, "+~5% Damage"),
    gem!("g_spd_m", "Sapphire Gem", Rare, Speed = 10.0, 0.15, "+~10% Speed"),
    gem!("g_dmg_l", "Perfect Ruby", Epic, Damage = 10.0, 0.1, "+~10% Damage"),
    gem!("g_crit_l", "Diamond", Legendary, CritChance = 5.0, 0.1, "+~5% Crit Chance"),
];

pub fn item_def(id: &str) -> Option<&'static ItemDef> {
    ITEMS.iter().find(|d| d.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrateKind {
    BasicCrate,
    SilverCrate,
    GoldCrate,
    LegendaryCrate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrateDef {
    pub name: &'static str,
    pub cost: u64,
    /// Advertised tier, informational only
    pub guaranteed_rarity: Rarity,
    pub items: u32,
    pub mythic_chance: f64,
    /// Percent weights in [`Rarity::ALL`] order
    pub weights: [f64; 5],
}

impl CrateKind {
    pub const ALL: [CrateKind; 4] = [
        CrateKind::BasicCrate,
        CrateKind::SilverCrate,
        CrateKind::GoldCrate,
        CrateKind::LegendaryCrate,
    ];

    pub fn def(self) -> CrateDef {
        match self {
            CrateKind::BasicCrate => CrateDef {
                name: "Basic Crate",
                cost: 100,
                guaranteed_rarity: Rarity::Common,
                items: 1,
                mythic_chance: 0.1,
                weights: [70.0, 25.0, 4.9, 0.0, 0.1],
            },
            CrateKind::SilverCrate => CrateDef {
                name: "Silver Crate",
                cost: 500,
                guaranteed_rarity: Rarity::Rare,
                items: 3,
                mythic_chance: 0.5,
                weights: [40.0, 40.0, 15.0, 4.5, 0.5],
            },
            CrateKind::GoldCrate => CrateDef {
                name: "Gold Crate",
                cost: 2000,
                guaranteed_rarity: Rarity::Epic,
                items: 5,
                mythic_chance: 2.0,
                weights: [10.0, 30.0, 40.0, 18.0, 2.0],
            },
            CrateKind::LegendaryCrate => CrateDef {
                name: "Legendary Crate",
                cost: 10000,
                guaranteed_rarity: Rarity::Legendary,
                items: 5,
                mythic_chance: 10.0,
                weights: [0.0, 0.0, 30.0, 60.0, 10.0],
            },
        }
    }
}

impl fmt::Display for CrateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.def().name)
    }
}

/// Chance of a free crate when a run ends on exactly `wave`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveCrateReward {
    pub wave: u32,
    pub crate_kind: CrateKind,
    pub chance: f64,
}

pub const WAVE_CRATE_REWARDS: [WaveCrateReward; 5] = [
    WaveCrateReward { wave: 5, crate_kind: CrateKind::BasicCrate, chance: 0.3 },
    WaveCrateReward { wave: 10, crate_kind: CrateKind::BasicCrate, chance: 0.5 },
    WaveCrateReward { wave: 15, crate_kind: CrateKind::SilverCrate, chance: 0.3 },
    WaveCrateReward { wave: 20, crate_kind: CrateKind::SilverCrate, chance: 0.5 },
    WaveCrateReward { wave: 30, crate_kind: CrateKind::GoldCrate, chance: 1.0 },
];

/// Roll for the end-of-run crate
pub fn roll_wave_crate<R: Rng + ?Sized>(wave: u32, rng: &mut R) -> Option<CrateKind> {
    let reward = WAVE_CRATE_REWARDS.iter().find(|r| r.wave == wave)?;
    (rng.random::<f64>() < reward.chance).then_some(reward.crate_kind)
}

fn default_count() -> u32 {
    1
}

/// An owned item. Identical drops share one instance with a count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInstance {
    /// Catalog id
    pub id: String,
    /// Unique per instance
    pub uid: String,
    pub name: String,
    pub category: ItemCategory,
    pub rarity: Rarity,
    pub desc: String,
    pub sell_price: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ItemStats>,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default = "default_count")]
    pub count: u32,
}

impl ItemInstance {
    /// Same catalog id and exactly the same rolled stats
    pub fn stacks_with(&self, other: &ItemInstance) -> bool {
        self.id == other.id && self.stats == other.stats
    }

    pub fn stat(&self, kind: StatKind) -> f64 {
        self.stats
            .as_ref()
            .and_then(|s| s.get(&kind).copied())
            .unwrap_or(0.0)
    }

    pub fn stat_total(&self) -> f64 {
        self.stats.as_ref().map(|s| s.values().sum()).unwrap_or(0.0)
    }
}

/// Random v4-style instance id drawn from `rng`
pub fn new_uid<R: Rng + ?Sized>(rng: &mut R) -> String {
    let bits: u128 = rng.random();
    let bits = (bits & !(0xf << 76)) | (0x4 << 76);
    let hex = format!("{bits:032x}");
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Apply a variance roll to one base value.
///
/// `r` in [0, 1) is first squeezed into `[stability, 1)`. Results above 10
/// round to an integer, smaller ones to one decimal.
pub fn roll_stat_value(base: f64, variance: f64, stability: f64, r: f64) -> f64 {
    let r = if stability > 0.0 {
        stability + r * (1.0 - stability)
    } else {
        r
    };
    let value = base * (1.0 + (r * variance * 2.0 - variance));
    if value > 10.0 {
        value.round()
    } else {
        (value * 10.0).round() / 10.0
    }
}

/// Fresh stats for a catalog entry. Entries without variance keep their base stats.
pub fn roll_stats<R: Rng + ?Sized>(def: &ItemDef, stability: f64, rng: &mut R) -> Option<ItemStats> {
    if def.stats.is_empty() {
        return None;
    }
    let stats = def
        .stats
        .iter()
        .map(|&(kind, base)| {
            let value = if def.variance > 0.0 {
                roll_stat_value(base, def.variance, stability, rng.random())
            } else {
                base
            };
            (kind, value)
        })
        .collect();
    Some(stats)
}

/// Display line for rolled stats, e.g. `+5% DAMAGE, +12 HP MAXHP`
pub fn describe_stats(stats: &ItemStats) -> String {
    stats
        .iter()
        .map(|(kind, value)| format!("+{}{} {}", value, kind.unit(), kind.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// New instance of `def` with rolled stats
pub fn generate_instance<R: Rng + ?Sized>(def: &ItemDef, stability: f64, rng: &mut R) -> ItemInstance {
    let stats = roll_stats(def, stability, rng);
    let desc = match &stats {
        Some(s) if def.variance > 0.0 => describe_stats(s),
        _ => def.desc.to_string(),
    };
    ItemInstance {
        id: def.id.to_string(),
        uid: new_uid(rng),
        name: def.name.to_string(),
        category: def.category,
        rarity: def.rarity,
        desc,
        sell_price: def.sell_price(),
        stats,
        is_new: true,
        count: 1,
    }
}
