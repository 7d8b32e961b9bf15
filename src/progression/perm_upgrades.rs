//! Permanent upgrades bought with gold, and the loadout stats a run starts with

use super::items::{Rarity, StatKind};
use super::{StoreError, StoreResult};
use crate::consts::{BASE_FIRE_RATE, PLAYER_DAMAGE, PLAYER_MAX_HP, PLAYER_SPEED};
use crate::persistence::ProfileData;
use crate::sim::Player;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeCategory {
    Offense,
    Defense,
    Utility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeStat {
    Damage,
    /// Additive fire-rate bonus
    FireRate,
    MaxHp,
    Regen,
    Speed,
    /// Additive gold multiplier
    Gold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PermUpgrade {
    pub id: &'static str,
    pub name: &'static str,
    pub category: UpgradeCategory,
    pub rarity: Rarity,
    pub base_cost: u64,
    pub scale: f64,
    pub stat: UpgradeStat,
    /// Bonus per level
    pub val: f64,
}

impl PermUpgrade {
    /// Gold price of the next level
    pub fn cost_at(&self, level: u32) -> u64 {
        (self.base_cost as f64 * self.scale.powi(level as i32)).floor() as u64
    }
}

macro_rules! perm {
    ($id:literal, $name:literal, $cat:ident, $rarity:ident, $base:literal, $scale:literal, $stat:ident, $val:literal) => {
        PermUpgrade {
            id: $id,
            name: $name,
            category: UpgradeCategory::$cat,
            rarity: Rarity::$rarity,
            base_cost: $base,
            scale: $scale,
            stat: UpgradeStat::$stat,
            val: $val,
        }
    };
}

pub static PERM_UPGRADES: [PermUpgrade; 24] = [
    perm!("dmg_c", "Iron Bullets", Offense, Common, 100, 1.5, Damage, 2.0),
    perm!("dmg_r", "Steel Slugs", Offense, Rare, 500, 1.6, Damage, 5.0),
    perm!("dmg_e", "Plasma Cores", Offense, Epic, 2500, 1.7, Damage, 15.0),
    perm!("dmg_l", "God Killers", Offense, Legendary, 10000, 2.0, Damage, 40.0),
    perm!("spd_c", "Greased Trigger", Offense, Common, 150, 1.5, FireRate, 0.02),
    perm!("spd_r", "Recoil Dampener", Offense, Rare, 600, 1.6, FireRate, 0.05),
    perm!("spd_e", "Auto-Loader", Offense, Epic, 3000, 1.7, FireRate, 0.12),
    perm!("spd_l", "Minigun Motor", Offense, Legendary, 15000, 2.0, FireRate, 0.30),
    perm!("hp_c", "Thick Skin", Defense, Common, 100, 1.5, MaxHp, 10.0),
    perm!("hp_r", "Mesh Armor", Defense, Rare, 500, 1.6, MaxHp, 30.0),
    perm!("hp_e", "Forcefield", Defense, Epic, 2000, 1.7, MaxHp, 80.0),
    perm!("hp_l", "Titan Soul", Defense, Legendary, 10000, 2.0, MaxHp, 250.0),
    perm!("reg_c", "Bandages", Defense, Common, 300, 1.5, Regen, 0.2),
    perm!("reg_r", "Bio-Gel", Defense, Rare, 1200, 1.6, Regen, 0.5),
    perm!("reg_e", "Nanobots", Defense, Epic, 5000, 1.7, Regen, 1.5),
    perm!("reg_l", "Phoenix Blood", Defense, Legendary, 25000, 2.0, Regen, 5.0),
    perm!("mov_c", "Light Shoes", Utility, Common, 150, 1.5, Speed, 5.0),
    perm!("mov_r", "Jet Boots", Utility, Rare, 800, 1.6, Speed, 15.0),
    perm!("mov_e", "Teleport Module", Utility, Epic, 3500, 1.7, Speed, 40.0),
    perm!("mov_l", "Time Warp", Utility, Legendary, 15000, 2.0, Speed, 100.0),
    perm!("gold_c", "Pocket Change", Utility, Common, 200, 1.5, Gold, 0.05),
    perm!("gold_r", "Investment", Utility, Rare, 1000, 1.6, Gold, 0.15),
    perm!("gold_e", "Midas Touch", Utility, Epic, 4000, 1.7, Gold, 0.35),
    perm!("gold_l", "Banker", Utility, Legendary, 20000, 2.0, Gold, 1.0),
];

pub fn perm_upgrade(id: &str) -> Option<&'static PermUpgrade> {
    PERM_UPGRADES.iter().find(|u| u.id == id)
}

/// Next-level price for the profile
pub fn next_cost(profile: &ProfileData, id: &str) -> Option<u64> {
    perm_upgrade(id).map(|u| u.cost_at(profile.upgrade_level(id)))
}

/// Buy the next level. Returns the new level.
pub fn purchase(profile: &mut ProfileData, id: &str) -> StoreResult<u32> {
    let upgrade = perm_upgrade(id).ok_or_else(|| StoreError::UnknownUpgrade(id.to_string()))?;
    let cost = upgrade.cost_at(profile.upgrade_level(id));
    if !profile.buy_upgrade(id, cost) {
        return Err(StoreError::NotEnoughGold(cost));
    }
    let level = profile.upgrade_level(id);
    log::info!("Bought {} level {} for {} gold", upgrade.name, level, cost);
    Ok(level)
}

/// Player stats implied by permanent upgrades and equipped gems
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadoutStats {
    pub damage: f64,
    pub max_hp: f64,
    pub speed: f64,
    pub base_fire_rate: f64,
    pub fire_rate_bonus: f64,
    pub regen: f64,
    pub crit_chance: f64,
    pub gold_multiplier: f64,
}

impl Default for LoadoutStats {
    fn default() -> Self {
        Self {
            damage: f64::from(PLAYER_DAMAGE),
            max_hp: f64::from(PLAYER_MAX_HP),
            speed: f64::from(PLAYER_SPEED),
            base_fire_rate: f64::from(BASE_FIRE_RATE),
            fire_rate_bonus: 0.0,
            regen: 0.0,
            crit_chance: 0.0,
            gold_multiplier: 1.0,
        }
    }
}

impl LoadoutStats {
    /// Upgrades add per level first, then gems: damage and speed scale by
    /// `1 + v/100`, max HP and crit add flat.
    pub fn compute(profile: &ProfileData) -> Self {
        let mut stats = Self::default();
        for upgrade in &PERM_UPGRADES {
            let level = profile.upgrade_level(upgrade.id);
            if level == 0 {
                continue;
            }
            let bonus = f64::from(level) * upgrade.val;
            match upgrade.stat {
                UpgradeStat::Damage => stats.damage += bonus,
                UpgradeStat::FireRate => stats.fire_rate_bonus += bonus,
                UpgradeStat::MaxHp => stats.max_hp += bonus,
                UpgradeStat::Regen => stats.regen += bonus,
                UpgradeStat::Speed => stats.speed += bonus,
                UpgradeStat::Gold => stats.gold_multiplier += bonus,
            }
        }
        for gem in profile.equipped_gems() {
            for (kind, value) in gem.stats.iter().flatten() {
                match kind {
                    StatKind::Damage => stats.damage *= 1.0 + value / 100.0,
                    StatKind::Speed => stats.speed *= 1.0 + value / 100.0,
                    StatKind::MaxHp => stats.max_hp += value,
                    StatKind::CritChance => stats.crit_chance += value,
                }
            }
        }
        stats
    }

    /// Volleys per second
    pub fn shots_per_second(&self) -> f64 {
        (1.0 + self.fire_rate_bonus) / self.base_fire_rate
    }

    /// Overwrite a fresh player's base stats and fill its HP
    pub fn apply(&self, player: &mut Player) {
        player.damage = self.damage as f32;
        player.max_hp = self.max_hp as f32;
        player.speed = self.speed as f32;
        player.base_fire_rate = self.base_fire_rate as f32;
        player.fire_rate_bonus = self.fire_rate_bonus as f32;
        player.regen_rate = self.regen as f32;
        player.crit_chance = self.crit_chance as f32;
        player.gold_multiplier = self.gold_multiplier as f32;
        player.update_fire_rate();
        player.hp = player.max_hp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::items::{generate_instance, item_def};
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_cost_curve() {
        let iron = perm_upgrade("dmg_c").expect("iron bullets");
        assert_eq!(iron.cost_at(0), 100);
        assert_eq!(iron.cost_at(1), 150);
        assert_eq!(iron.cost_at(2), 225);
        assert_eq!(iron.cost_at(3), 337);
        assert_eq!(perm_upgrade("gold_l").map(|u| u.cost_at(2)), Some(80000));
    }

    #[test]
    fn test_purchase_walks_the_curve() {
        let mut profile = ProfileData::default();
        profile.gold = 300;
        assert_eq!(purchase(&mut profile, "dmg_c"), Ok(1));
        assert_eq!(next_cost(&profile, "dmg_c"), Some(150));
        assert_eq!(purchase(&mut profile, "dmg_c"), Ok(2));
        assert_eq!(purchase(&mut profile, "dmg_c"), Err(StoreError::NotEnoughGold(225)));
        assert_eq!(profile.gold, 50);
        assert!(matches!(purchase(&mut profile, "nope"), Err(StoreError::UnknownUpgrade(_))));
    }

    #[test]
    fn test_defaults_match_fresh_player() {
        let stats = LoadoutStats::compute(&ProfileData::default());
        assert_eq!(stats, LoadoutStats::default());
        assert!((stats.shots_per_second() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_upgrades_then_gems() {
        let mut profile = ProfileData::default();
        profile.upgrades.insert("dmg_c".into(), 5);
        profile.upgrades.insert("hp_r".into(), 1);
        profile.upgrades.insert("spd_r".into(), 2);
        profile.upgrades.insert("gold_c".into(), 2);

        let mut rng = Pcg32::seed_from_u64(1);
        let mut ruby = generate_instance(item_def("g_dmg_m").expect("ruby"), 0.0, &mut rng);
        ruby.stats = Some([(StatKind::Damage, 10.0)].into_iter().collect());
        let mut emerald = generate_instance(item_def("g_hp_s").expect("emerald"), 0.0, &mut rng);
        emerald.stats = Some([(StatKind::MaxHp, 12.0)].into_iter().collect());
        let (ruby_uid, emerald_uid) = (ruby.uid.clone(), emerald.uid.clone());
        profile.inventory.items.extend([ruby, emerald]);
        profile.equip(&ruby_uid).expect("equip ruby");
        profile.equip(&emerald_uid).expect("equip emerald");

        let stats = LoadoutStats::compute(&profile);
        // (10 + 5*2) * 1.10
        assert!((stats.damage - 22.0).abs() < 1e-9);
        assert!((stats.max_hp - 142.0).abs() < 1e-9);
        assert!((stats.fire_rate_bonus - 0.10).abs() < 1e-9);
        assert!((stats.gold_multiplier - 1.10).abs() < 1e-9);

        let mut player = Player::new(Vec2::ZERO);
        player.hp = 1.0;
        stats.apply(&mut player);
        assert_eq!(player.hp, player.max_hp);
        assert!((player.damage - 22.0).abs() < 1e-4);
        assert!((player.fire_rate - 0.5 / 1.1).abs() < 1e-5);
    }
}
