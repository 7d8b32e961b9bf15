//! Save envelope and schema migrations
//!
//! Saves are wrapped as `{"version": N, "data": {...}}`. A bare profile with no
//! envelope is a version 0 save from before item instances existed: its items
//! lack `uid`/`count` and its loadout holds catalog ids instead of uids.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Loadout, PersistenceError, ProfileData};
use crate::progression::items::{ItemInstance, generate_instance, item_def};

pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveEnvelope {
    pub version: u32,
    pub data: Value,
}

/// Serialize a profile inside a current-version envelope
pub fn encode(profile: &ProfileData) -> Result<String, PersistenceError> {
    let envelope = SaveEnvelope {
        version: CURRENT_VERSION,
        data: serde_json::to_value(profile)?,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Parse a save of any known version, migrating it to the current shape
pub fn decode<R: Rng + ?Sized>(text: &str, rng: &mut R) -> Result<ProfileData, PersistenceError> {
    let value: Value = serde_json::from_str(text)?;
    let (version, data) = split_envelope(value);
    match version {
        0 => migrate_v0(data, rng),
        CURRENT_VERSION => Ok(serde_json::from_value(data)?),
        v => Err(PersistenceError::UnsupportedVersion(v)),
    }
}

fn split_envelope(value: Value) -> (u32, Value) {
    let is_envelope = value.get("version").is_some_and(Value::is_u64) && value.get("data").is_some();
    if !is_envelope {
        return (0, value);
    }
    match serde_json::from_value::<SaveEnvelope>(value.clone()) {
        Ok(env) => (env.version, env.data),
        Err(_) => (0, value),
    }
}

/// Regenerate legacy items as instances, then point the loadout at uids
pub fn migrate_v0<R: Rng + ?Sized>(mut data: Value, rng: &mut R) -> Result<ProfileData, PersistenceError> {
    let legacy_items = data
        .pointer_mut("/inventory/items")
        .and_then(Value::as_array_mut)
        .filter(|items| items.iter().any(needs_instance))
        .map(std::mem::take);

    if let Some(items) = legacy_items {
        log::info!("Migrating {} legacy inventory entries", items.len());
        let regenerated: Vec<Value> = items
            .iter()
            .filter_map(|old| regenerate(old, rng))
            .map(serde_json::to_value)
            .collect::<Result<_, _>>()?;
        if let Some(slot) = data.pointer_mut("/inventory/items") {
            *slot = Value::Array(regenerated);
        }
    }

    let mut profile: ProfileData = serde_json::from_value(data)?;
    remap_loadout(&mut profile);
    Ok(profile)
}

fn needs_instance(item: &Value) -> bool {
    let has_uid = item.get("uid").and_then(Value::as_str).is_some_and(|s| !s.is_empty());
    !has_uid || item.get("count").is_none()
}

/// Items whose catalog entry no longer exists are dropped
fn regenerate<R: Rng + ?Sized>(old: &Value, rng: &mut R) -> Option<ItemInstance> {
    let def = item_def(old.get("id")?.as_str()?)?;
    let mut instance = generate_instance(def, 0.0, rng);
    instance.is_new = false;
    if let Some(count) = old.get("count").and_then(Value::as_u64).filter(|c| *c > 0) {
        instance.count = count as u32;
    }
    Some(instance)
}

/// Replace catalog ids in the loadout with the uid of the first matching
/// item. Slots that already hold a valid uid are left alone.
pub fn remap_loadout(profile: &mut ProfileData) {
    let items = &profile.inventory.items;
    let remap = |slot: &mut Option<String>| {
        let Some(current) = slot.as_deref() else {
            return;
        };
        if items.iter().any(|i| i.uid == current) {
            return;
        }
        *slot = items.iter().find(|i| i.id == current).map(|i| i.uid.clone());
    };
    let Loadout {
        weapon_skin,
        character_skin,
        kill_effect,
        aura_effect,
        stat_gems,
    } = &mut profile.loadout;
    [weapon_skin, character_skin, kill_effect, aura_effect]
        .into_iter()
        .chain(stat_gems.iter_mut())
        .for_each(remap);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const LEGACY: &str = r#"{
        "username": "old",
        "gold": 321,
        "highScores": [{"wave": 4, "score": 80, "date": 1, "name": "old"}],
        "inventory": {"items": [
            {"id": "k_gold", "name": "Gold Coins"},
            {"id": "g_dmg_s", "count": 3},
            {"id": "removed_item"}
        ]},
        "loadout": {"killEffect": "k_gold", "statGems": ["g_dmg_s", null, "missing"]},
        "unlockedWorlds": ["tech", "magma"]
    }"#;

    #[test]
    fn test_bare_profile_migrates() {
        let mut rng = Pcg32::seed_from_u64(1);
        let profile = decode(LEGACY, &mut rng).expect("legacy save decodes");
        assert_eq!(profile.gold, 321);
        assert_eq!(profile.inventory.items.len(), 2);
        let gem = &profile.inventory.items[1];
        assert_eq!(gem.id, "g_dmg_s");
        assert_eq!(gem.count, 3);
        assert!(gem.stats.is_some());

        let kill_uid = profile.loadout.kill_effect.as_deref().expect("kill effect kept");
        assert_eq!(profile.item_by_uid(kill_uid).map(|i| i.id.as_str()), Some("k_gold"));
        assert_eq!(profile.loadout.stat_gems[0].as_deref(), Some(gem.uid.as_str()));
        assert_eq!(profile.loadout.stat_gems[2], None);
        assert_eq!(profile.high_scores.best_wave(), Some(4));
        assert_eq!(profile.store_rank, 1);
    }

    #[test]
    fn test_round_trip_keeps_uids() {
        let mut rng = Pcg32::seed_from_u64(2);
        let profile = decode(LEGACY, &mut rng).expect("legacy save decodes");
        let text = encode(&profile).expect("encode");
        assert!(text.contains("\"version\": 1"));
        let again = decode(&text, &mut rng).expect("current save decodes");
        let uids = |p: &ProfileData| p.inventory.items.iter().map(|i| i.uid.clone()).collect::<Vec<_>>();
        assert_eq!(uids(&again), uids(&profile));
        assert_eq!(again.loadout, profile.loadout);
        assert_eq!(again.unlocked_worlds, profile.unlocked_worlds);
    }

    #[test]
    fn test_future_version_rejected() {
        let mut rng = Pcg32::seed_from_u64(3);
        let result = decode(r#"{"version": 7, "data": {}}"#, &mut rng);
        assert!(matches!(result, Err(PersistenceError::UnsupportedVersion(7))));
    }

    #[test]
    fn test_garbage_is_json_error() {
        let mut rng = Pcg32::seed_from_u64(4);
        assert!(matches!(decode("not json", &mut rng), Err(PersistenceError::Json(_))));
    }
}
