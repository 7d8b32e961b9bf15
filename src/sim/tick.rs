//! Per-frame simulation step
//!
//! Advances one run by a variable `dt`. The pass order is fixed and every
//! random draw comes from the run's seeded RNG, so equal seeds and inputs
//! replay identically.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::collision::boxes_overlap;
use super::enemy::{Enemy, EnemyKind, EnemyOutput, apply_heal};
use super::map::GameMap;
use super::player::movement_axis;
use super::projectile::{Projectile, ShotFlags};
use super::state::{Explosion, GamePhase, GameState};
use super::wave::{PlayerVitals, WaveEvent};
use crate::consts::*;
use crate::unit_from_angle;

/// Children spawned when a splitter dies
pub const SPLITTER_CHILDREN: u32 = 2;
const SPLIT_HP_FRACTION: f32 = 0.3;
const SPLIT_DAMAGE_FRACTION: f32 = 0.5;
const SPLIT_XP_FRACTION: f32 = 0.2;
const KILL_EXPLOSION_SIZE: f32 = 50.0;

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Raw horizontal axis in [-1, 1]
    pub move_x: f32,
    /// Raw vertical axis in [-1, 1], +y is down
    pub move_y: f32,
    /// Pause toggle
    pub pause: bool,
    /// Abandon the run
    pub quit: bool,
}

/// Advance the run by one frame.
///
/// Returns the wave event raised this frame, if any. Frames that arrive
/// while the run is not in play only handle pause and quit.
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> Option<WaveEvent> {
    if input.quit && !state.phase.is_finished() {
        log::info!("Run abandoned at wave {}", state.wave());
        state.phase = GamePhase::GameOver;
        return None;
    }

    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                return None;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            _ => {}
        }
    }

    if state.phase != GamePhase::Playing {
        return None;
    }

    let dt = dt.clamp(0.0, state.max_frame_dt);
    state.time += dt;
    state.time_ticks += 1;

    if state.player.pos.is_nan() {
        log::warn!("Player position became NaN, resetting to origin");
        state.player.pos = Vec2::ZERO;
    }

    update_player(state, input, dt);
    update_enemies(state, dt);
    update_projectiles(state, dt);

    for explosion in &mut state.explosions {
        explosion.update(dt);
    }
    state.explosions.retain(|e| !e.marked_for_deletion);

    sweep_dead(state);
    state.projectiles.retain(|p| !p.marked_for_deletion);

    let event = update_waves(state, dt);

    if state.player.is_dead() {
        log::info!(
            "Player died on wave {} with {} kills, {} gold",
            state.wave(),
            state.kills,
            state.gold
        );
        state.phase = GamePhase::GameOver;
    }

    event
}

fn update_player(state: &mut GameState, input: &TickInput, dt: f32) {
    let axis = movement_axis(input.move_x, input.move_y);
    state.player.update(
        dt,
        axis,
        Some(&state.map),
        &mut state.enemies,
        &mut state.projectiles,
        &mut state.ids,
        &mut state.rng,
    );
    state.camera.follow(state.player.pos);
    state.map.update(state.player.pos, &mut state.rng);
}

/// AI, heal pulses, and contact damage, one enemy at a time
fn update_enemies(state: &mut GameState, dt: f32) {
    let wave = state.wave();
    let mut out = EnemyOutput::default();

    for i in 0..state.enemies.len() {
        let player_pos = state.player.pos;
        let heal = state.enemies[i].update(dt, player_pos, Some(&state.map), wave, &mut state.rng, &mut out);
        // Later enemies in the list see the heal this same frame
        if let Some(pulse) = heal {
            apply_heal(&mut state.enemies, &pulse);
        }

        let enemy = &mut state.enemies[i];
        if enemy.is_jumping || !boxes_overlap(state.player.pos, state.player.size, enemy.pos, enemy.size) {
            continue;
        }
        let reduction = if enemy.is_slowed() {
            SLOWED_CONTACT_FACTOR
        } else {
            1.0
        };
        state.player.take_damage(enemy.damage * reduction);
        if state.player.thorns_damage > 0.0 {
            enemy.hp -= state.player.thorns_damage * dt;
        }
    }

    if !out.minions.is_empty() {
        state.merge_spawns(&mut out.minions);
    }
    let flags = ShotFlags {
        enemy: true,
        ..Default::default()
    };
    for shot in out.shots {
        let id = state.ids.next();
        state
            .projectiles
            .push(Projectile::new(id, shot.from, shot.target, shot.damage, flags));
    }
}

/// Move projectiles and resolve hits against the player, enemies, and walls
fn update_projectiles(state: &mut GameState, dt: f32) {
    let GameState {
        projectiles,
        enemies,
        player,
        map,
        explosions,
        rng,
        ..
    } = state;

    for p in projectiles.iter_mut() {
        p.update(dt);

        if p.flags.enemy {
            if boxes_overlap(p.pos, p.size, player.pos, player.size) {
                player.take_damage(p.damage);
                p.marked_for_deletion = true;
            }
            if map.check_collision(p.pos, PROJECTILE_WALL_PROBE).is_some() {
                p.marked_for_deletion = true;
            }
            continue;
        }

        // A bullet damages every enemy it overlaps this frame, not just the first
        for i in 0..enemies.len() {
            let target = &mut enemies[i];
            if target.is_jumping || !boxes_overlap(p.pos, p.size, target.pos, target.size) {
                continue;
            }
            target.hp -= p.damage;
            if p.flags.frost {
                target.apply_slow(FROST_SLOW_TIME);
            }
            if p.flags.explosive {
                explosions.push(Explosion::impact(p.pos));
                let splash = p.damage * EXPLOSION_DAMAGE_FACTOR;
                for nearby in enemies.iter_mut() {
                    if nearby.pos.distance(p.pos) < EXPLOSION_RADIUS {
                        nearby.hp -= splash;
                    }
                }
            }
            p.marked_for_deletion = true;
            if enemies[i].is_dead() {
                player.on_kill(&mut *rng);
            }
        }

        if let Some(wall) = map.check_collision(p.pos, PROJECTILE_WALL_PROBE) {
            if !p.bounce(&wall) {
                p.marked_for_deletion = true;
            }
        }
    }
}

/// Remove dead enemies, pay out rewards, and split splitters
fn sweep_dead(state: &mut GameState) {
    let mut children = Vec::new();

    for i in (0..state.enemies.len()).rev() {
        if !state.enemies[i].is_dead() {
            continue;
        }
        let enemy = state.enemies.remove(i);
        // Zero-xp kills still pay one gold
        let gold = enemy.xp_value.max(1.0) * state.player.gold_multiplier;
        state.gold += gold.floor() as u64;
        state.score += enemy.xp_value.floor() as u64;
        state.kills += 1;

        if enemy.splits_on_death() {
            children.extend(split_children(&enemy, &state.map, &mut state.rng));
        }

        state.explosions.push(Explosion::new(
            enemy.pos,
            KILL_EXPLOSION_SIZE,
            "#fff",
            state.kill_effect.clone(),
        ));
    }

    if !children.is_empty() {
        state.merge_spawns(&mut children);
    }
}

/// Two weakened swarmers around a dead splitter. Blocked spots are skipped.
pub fn split_children<R: Rng + ?Sized>(parent: &Enemy, map: &GameMap, rng: &mut R) -> Vec<Enemy> {
    let mut children = Vec::new();
    let child_size = EnemyKind::Swarm.base_stats().size;
    for _ in 0..SPLITTER_CHILDREN {
        let angle = rng.random::<f32>() * TAU;
        let dist = 40.0 + rng.random::<f32>() * 20.0;
        let pos = parent.pos + unit_from_angle(angle) * dist;
        if map.check_collision(pos, child_size).is_some() {
            continue;
        }
        let mut child = Enemy::new(0, EnemyKind::Swarm, pos);
        child.hp = (parent.max_hp * SPLIT_HP_FRACTION).floor();
        child.max_hp = child.hp;
        child.damage = (parent.damage * SPLIT_DAMAGE_FRACTION).floor();
        child.xp_value = (parent.xp_value * SPLIT_XP_FRACTION).floor();
        children.push(child);
    }
    children
}

/// Run the wave director after the death sweep so a cleared field ends the wave this frame
fn update_waves(state: &mut GameState, dt: f32) -> Option<WaveEvent> {
    let vitals = PlayerVitals {
        pos: state.player.pos,
        hp: state.player.hp,
        max_hp: state.player.max_hp,
    };
    let event = state
        .waves
        .update(dt, Some(vitals), &state.map, &mut state.enemies, &mut state.rng);
    state.assign_missing_ids();

    let result = match event {
        Some(WaveEvent::WaveComplete(result)) => {
            state.phase = GamePhase::Shop;
            result
        }
        Some(WaveEvent::WorldClear(result)) => {
            state.phase = GamePhase::Victory;
            result
        }
        None => return None,
    };
    if result.success {
        state.gold += state.challenge_bonus_gold;
        log::info!("Challenge bonus: +{} gold", state.challenge_bonus_gold);
    }
    state.last_wave_result = Some(result);
    event
}
