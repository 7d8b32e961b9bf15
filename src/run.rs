//! Run lifecycle
//!
//! Builds a [`GameState`] from a profile, drives the between-wave shop, and
//! settles a finished run back into the profile.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::consts::TOKENS_PER_WAVE;
use crate::persistence::{ProfileData, ProfileStore, save_fire_and_forget};
use crate::progression::gacha::{CrateOpening, open_crate};
use crate::progression::items::roll_wave_crate;
use crate::progression::{LoadoutStats, StoreBonuses, StoreError, StoreResult};
use crate::settings::Settings;
use crate::sim::shop::{ShopUpgrade, find_upgrade, generate_options};
use crate::sim::{Camera, GamePhase, GameState};
use crate::world::{next_world, world_by_id};

/// Start a run in `world_id` with the profile's permanent upgrades and gems.
///
/// Unknown ids resolve to the first world. Locked worlds are refused.
pub fn start_run(profile: &ProfileData, world_id: &str, seed: u64, settings: &Settings) -> StoreResult<GameState> {
    let world = world_by_id(world_id);
    if !profile.is_world_unlocked(world.id) {
        return Err(StoreError::Locked(world.name.to_string()));
    }

    let mut state = GameState::new(seed, world);
    let stats = LoadoutStats::compute(profile);
    stats.apply(&mut state.player);
    state.kill_effect = profile.kill_effect_id().map(str::to_string);
    state.max_frame_dt = settings.max_frame_dt;
    state.camera = Camera::new(settings.viewport.width, settings.viewport.height);
    state.camera.follow(state.player.pos);

    log::info!(
        "Run started in {} (seed {}): {:.0} dmg, {:.0} hp, {:.2} shots/s",
        world.name,
        seed,
        stats.damage,
        stats.max_hp,
        stats.shots_per_second()
    );
    state.start_wave();
    Ok(state)
}

/// Draw the options for a shop visit from the run's rng
pub fn shop_options(state: &mut GameState) -> Vec<&'static ShopUpgrade> {
    generate_options(&mut state.rng)
}

/// Apply a shop pick and start the next wave.
///
/// Returns `Ok(false)` without touching the run when it is not in the shop.
pub fn pick_upgrade(state: &mut GameState, id: &str) -> StoreResult<bool> {
    let upgrade = find_upgrade(id).ok_or_else(|| StoreError::UnknownUpgrade(id.to_string()))?;
    if state.phase != GamePhase::Shop {
        return Ok(false);
    }
    upgrade.apply(&mut state.player);
    log::info!("Picked {} before wave {}", upgrade.name, state.wave() + 1);
    state.next_wave();
    Ok(true)
}

/// Pick uniformly from a fresh set of options
pub fn auto_pick(state: &mut GameState) -> Option<&'static ShopUpgrade> {
    if state.phase != GamePhase::Shop {
        return None;
    }
    let options = shop_options(state);
    let choice = *options.choose(&mut state.rng)?;
    pick_upgrade(state, choice.id).ok()?;
    Some(choice)
}

/// What a finished run paid out
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub world_id: &'static str,
    pub wave: u32,
    pub score: u64,
    pub kills: u32,
    pub victory: bool,
    /// Gold earned during the run
    pub run_gold: u64,
    /// Extra gold from the run dividend node
    pub dividend: u64,
    pub tokens: u64,
    /// Leaderboard place counted from 1, when the run made the board
    pub high_score_rank: Option<usize>,
    pub crate_reward: Option<CrateOpening>,
    pub unlocked_world: Option<&'static str>,
}

impl RunSummary {
    pub fn total_gold(&self) -> u64 {
        self.run_gold + self.dividend
    }
}

/// Credit a finished run to the profile and save it.
///
/// Saving never fails the settlement; a failed save is logged and the
/// profile keeps the rewards in memory.
pub fn finish_run<S, R>(state: &GameState, profile: &mut ProfileData, store: &mut S, rng: &mut R) -> RunSummary
where
    S: ProfileStore + ?Sized,
    R: Rng + ?Sized,
{
    let wave = state.wave();
    let victory = state.phase == GamePhase::Victory;

    let bonuses = StoreBonuses::from_profile(profile);
    let dividend = (state.gold as f64 * bonuses.run_gold_bonus).floor() as u64;
    profile.add_gold(state.gold + dividend);

    let high_score_rank = profile.add_high_score(wave, state.score);
    let tokens = profile.add_shop_tokens((wave as f32 * TOKENS_PER_WAVE).floor() as u64);

    let crate_reward = roll_wave_crate(wave, rng).map(|kind| {
        log::info!("Wave {} reward: {}", wave, kind);
        open_crate(profile, kind, rng)
    });

    let unlocked_world = if victory {
        next_world(state.world.id)
            .filter(|next| profile.unlock_world(next.id))
            .map(|next| {
                log::info!("{} cleared, {} unlocked", state.world.name, next.name);
                next.id
            })
    } else {
        None
    };

    let summary = RunSummary {
        world_id: state.world.id,
        wave,
        score: state.score,
        kills: state.kills,
        victory,
        run_gold: state.gold,
        dividend,
        tokens,
        high_score_rank,
        crate_reward,
        unlocked_world,
    };
    log::info!(
        "Run settled: wave {}, score {}, +{} gold ({} dividend), +{} tokens",
        summary.wave,
        summary.score,
        summary.total_gold(),
        summary.dividend,
        summary.tokens
    );

    save_fire_and_forget(store, profile);
    summary
}
