//! In-run upgrade catalog offered between waves

use rand::Rng;
use rand::seq::IndexedRandom;

use super::player::Player;
use crate::progression::items::Rarity;

/// Options shown per shop visit
pub const SHOP_OPTION_COUNT: usize = 3;

/// What an in-run upgrade does to the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShopEffect {
    Damage(f32),
    FireRate(f32),
    /// Raise max HP and heal by the same amount
    Vitality(f32),
    /// Raise max HP and heal to full
    FullVitality(f32),
    SpeedMult(f32),
    Range(f32),
    Crit(f32),
    Greed(f32),
    Ricochet(u32),
    Multishot(u32),
    Regen(f32),
    Thorns(f32),
    Lifesteal(f32),
    FireAura(f32),
    FrostShot,
    ExplosiveShots,
    Orbitals { count: u32, damage: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShopUpgrade {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: Rarity,
    pub effect: ShopEffect,
}

impl ShopUpgrade {
    pub fn apply(&self, player: &mut Player) {
        match self.effect {
            ShopEffect::Damage(v) => player.damage += v,
            ShopEffect::FireRate(v) => {
                player.fire_rate_bonus += v;
                player.update_fire_rate();
            }
            ShopEffect::Vitality(v) => {
                player.max_hp += v;
                player.hp += v;
            }
            ShopEffect::FullVitality(v) => {
                player.max_hp += v;
                player.hp = player.max_hp;
            }
            ShopEffect::SpeedMult(m) => player.speed *= m,
            ShopEffect::Range(v) => player.range += v,
            ShopEffect::Crit(v) => player.crit_chance += v,
            ShopEffect::Greed(v) => player.gold_multiplier += v,
            ShopEffect::Ricochet(n) => player.ricochet_count += n,
            ShopEffect::Multishot(n) => player.projectile_count += n,
            ShopEffect::Regen(v) => player.regen_rate += v,
            ShopEffect::Thorns(v) => player.thorns_damage += v,
            ShopEffect::Lifesteal(v) => player.lifesteal_chance += v,
            ShopEffect::FireAura(v) => {
                player.has_fire_aura = true;
                player.fire_aura_damage += v;
            }
            ShopEffect::FrostShot => player.has_frost_shot = true,
            ShopEffect::ExplosiveShots => player.has_explosive_shots = true,
            ShopEffect::Orbitals { count, damage } => {
                player.orbital_count += count;
                player.orbital_damage = damage;
            }
        }
    }
}

macro_rules! upgrade {
    ($id:literal, $name:literal, $desc:literal, $rarity:ident, $effect:expr) => {
        ShopUpgrade {
            id: $id,
            name: $name,
            description: $desc,
            rarity: Rarity::$rarity,
            effect: $effect,
        }
    };
}

pub static SHOP_UPGRADES: &[ShopUpgrade] = &[
    upgrade!("dmg_common", "Damage Boost", "Increases damage by 5.", Common, ShopEffect::Damage(5.0)),
    upgrade!("dmg_rare", "Heavy Rounds", "Increases damage by 12.", Rare, ShopEffect::Damage(12.0)),
    upgrade!("dmg_epic", "High Caliber", "Increases damage by 25.", Epic, ShopEffect::Damage(25.0)),
    upgrade!("dmg_legendary", "God Slayer", "Increases damage by 60.", Legendary, ShopEffect::Damage(60.0)),
    upgrade!("rate_common", "Gloves of Haste", "Shoot 10% faster.", Common, ShopEffect::FireRate(0.10)),
    upgrade!("rate_rare", "Rapid Fire", "Shoot 20% faster.", Rare, ShopEffect::FireRate(0.20)),
    upgrade!("rate_epic", "Machine Gun", "Shoot 35% faster.", Epic, ShopEffect::FireRate(0.35)),
    upgrade!("rate_legendary", "Bullet Storm", "Shoot 60% faster!", Legendary, ShopEffect::FireRate(0.60)),
    upgrade!("hp_common", "Healthy Snack", "+20 Max HP and Heal.", Common, ShopEffect::Vitality(20.0)),
    upgrade!("hp_rare", "Hearty Meal", "+50 Max HP and Heal.", Rare, ShopEffect::Vitality(50.0)),
    upgrade!("hp_epic", "Life Elixir", "+100 Max HP and Full Heal.", Epic, ShopEffect::FullVitality(100.0)),
    upgrade!("hp_legendary", "Titan's Blood", "+250 Max HP and Full Heal.", Legendary, ShopEffect::FullVitality(250.0)),
    upgrade!("speed_common", "Light Boots", "Move 5% faster.", Common, ShopEffect::SpeedMult(1.05)),
    upgrade!("speed_rare", "Running Shoes", "Move 12% faster.", Rare, ShopEffect::SpeedMult(1.12)),
    upgrade!("speed_epic", "Turbo Engine", "Move 25% faster.", Epic, ShopEffect::SpeedMult(1.25)),
    upgrade!("speed_legendary", "Teleport Step", "Move 50% faster.", Legendary, ShopEffect::SpeedMult(1.50)),
    upgrade!("range_common", "Lens", "Increases range by 50.", Common, ShopEffect::Range(50.0)),
    upgrade!("range_rare", "Scope", "Increases range by 125.", Rare, ShopEffect::Range(125.0)),
    upgrade!("range_epic", "Sniper Kit", "Increases range by 250.", Epic, ShopEffect::Range(250.0)),
    upgrade!("crit_common", "Sharp Lens", "+5% crit chance.", Common, ShopEffect::Crit(5.0)),
    upgrade!("crit_rare", "Targeting Sys", "+10% crit chance.", Rare, ShopEffect::Crit(10.0)),
    upgrade!("crit_epic", "Assassin", "+20% crit chance.", Epic, ShopEffect::Crit(20.0)),
    upgrade!("greed_rare", "Lucky Coin", "+20% gold from kills.", Rare, ShopEffect::Greed(0.2)),
    upgrade!("greed_epic", "Midas Touch", "+50% gold from kills.", Epic, ShopEffect::Greed(0.5)),
    upgrade!("ricochet_rare", "Bouncy Walls", "Bullets bounce off 1 wall.", Rare, ShopEffect::Ricochet(1)),
    upgrade!("ricochet_epic", "Rubber Room", "Bullets bounce off 3 walls.", Epic, ShopEffect::Ricochet(3)),
    upgrade!("multishot_epic", "Twin Shot", "+1 parallel bullet.", Epic, ShopEffect::Multishot(1)),
    upgrade!("multishot_legendary", "Barrage", "+2 parallel bullets.", Legendary, ShopEffect::Multishot(2)),
    upgrade!("regen_rare", "Troll Blood", "Regenerate 1 HP/s.", Rare, ShopEffect::Regen(1.0)),
    upgrade!("regen_epic", "Hydra Gene", "Regenerate 3 HP/s.", Epic, ShopEffect::Regen(3.0)),
    upgrade!("thorns_rare", "Spiked Armor", "Contact deals 15 DPS back.", Rare, ShopEffect::Thorns(15.0)),
    upgrade!("thorns_epic", "Blazing Armor", "Contact deals 40 DPS back.", Epic, ShopEffect::Thorns(40.0)),
    upgrade!("vamp_legendary", "Vampirism", "15% chance to heal on kill.", Legendary, ShopEffect::Lifesteal(0.15)),
    upgrade!("fireaura_epic", "Fire Aura", "Burn nearby enemies.", Epic, ShopEffect::FireAura(25.0)),
    upgrade!("frost_rare", "Frost Shot", "Bullets slow enemies.", Rare, ShopEffect::FrostShot),
    upgrade!("explosive_legendary", "Explosive Rounds", "Bullets explode on impact.", Legendary, ShopEffect::ExplosiveShots),
    upgrade!("orbitals_epic", "Orbitals", "+2 orbiting shields.", Epic, ShopEffect::Orbitals { count: 2, damage: 60.0 }),
];

/// Three distinct random upgrades
pub fn generate_options<R: Rng + ?Sized>(rng: &mut R) -> Vec<&'static ShopUpgrade> {
    SHOP_UPGRADES.choose_multiple(rng, SHOP_OPTION_COUNT).collect()
}

pub fn find_upgrade(id: &str) -> Option<&'static ShopUpgrade> {
    SHOP_UPGRADES.iter().find(|u| u.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_catalog_ids_unique() {
        let mut ids: Vec<&str> = SHOP_UPGRADES.iter().map(|u| u.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), SHOP_UPGRADES.len());
    }

    #[test]
    fn test_generate_three_distinct() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..50 {
            let options = generate_options(&mut rng);
            assert_eq!(options.len(), 3);
            assert_ne!(options[0].id, options[1].id);
            assert_ne!(options[1].id, options[2].id);
            assert_ne!(options[0].id, options[2].id);
        }
    }

    #[test]
    fn test_fire_rate_pick_recomputes_interval() {
        let mut player = Player::new(Vec2::ZERO);
        find_upgrade("rate_legendary").expect("in catalog").apply(&mut player);
        assert!((player.fire_rate - 0.5 / 1.6).abs() < 1e-6);
    }

    #[test]
    fn test_health_picks() {
        let mut player = Player::new(Vec2::ZERO);
        player.hp = 40.0;
        if let Some(u) = find_upgrade("hp_rare") {
            u.apply(&mut player);
        }
        assert_eq!((player.hp, player.max_hp), (90.0, 150.0));
        if let Some(u) = find_upgrade("hp_epic") {
            u.apply(&mut player);
        }
        assert_eq!((player.hp, player.max_hp), (250.0, 250.0));
    }

    #[test]
    fn test_orbitals_stack_count_and_set_damage() {
        let mut player = Player::new(Vec2::ZERO);
        let orbitals = find_upgrade("orbitals_epic").expect("orbitals in catalog");
        orbitals.apply(&mut player);
        orbitals.apply(&mut player);
        assert_eq!(player.orbital_count, 4);
        assert_eq!(player.orbital_damage, 60.0);
    }
}
