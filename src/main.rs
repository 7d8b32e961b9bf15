//! Wave Survivor headless entry point
//!
//! Loads settings and the player's profile, plays one scripted run on a
//! fixed-step accumulator, settles it and saves.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::f32::consts::TAU;
    use std::path::PathBuf;

    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use wave_survivor::Settings;
    use wave_survivor::consts::*;
    use wave_survivor::highscores::now_ms;
    use wave_survivor::persistence::{FileStore, ProfileData, ProfileStore};
    use wave_survivor::run::{RunSummary, auto_pick, finish_run, pick_upgrade, shop_options, start_run};
    use wave_survivor::sim::{GamePhase, GameState, TickInput, WaveEvent, tick};

    /// Wall-clock frame the driver pretends to render at
    const FRAME_DT: f32 = 1.0 / 30.0;
    /// Seconds per lap of the scripted circle
    const CIRCLE_PERIOD: f32 = 6.0;

    /// One run driven without a window
    struct Game {
        state: GameState,
        accumulator: f32,
        input: TickInput,
        auto_select: bool,
    }

    impl Game {
        fn new(state: GameState, auto_select: bool) -> Self {
            Self {
                state,
                accumulator: 0.0,
                input: TickInput::default(),
                auto_select,
            }
        }

        /// Kite in a circle around the spawn point
        fn steer(&mut self) {
            let angle = self.state.time / CIRCLE_PERIOD * TAU;
            self.input.move_x = -angle.sin();
            self.input.move_y = angle.cos();
        }

        fn update(&mut self, dt: f32) {
            self.accumulator += dt.min(self.state.max_frame_dt);

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.steer();
                if let Some(event) = tick(&mut self.state, &self.input, SIM_DT) {
                    self.on_wave_event(event);
                }
                self.accumulator -= SIM_DT;
                substeps += 1;

                // One-shot inputs
                self.input.pause = false;
                self.input.quit = false;

                if self.state.phase != GamePhase::Playing {
                    self.accumulator = 0.0;
                    break;
                }
            }

            if self.state.phase == GamePhase::Shop {
                self.visit_shop();
            }
        }

        fn on_wave_event(&mut self, event: WaveEvent) {
            let result = match event {
                WaveEvent::WaveComplete(result) | WaveEvent::WorldClear(result) => result,
            };
            if let Some(challenge) = result.challenge {
                log::info!(
                    "Challenge {:?} {}",
                    challenge,
                    if result.success { "completed" } else { "failed" }
                );
            }
        }

        fn visit_shop(&mut self) {
            if self.auto_select {
                if let Some(choice) = auto_pick(&mut self.state) {
                    log::debug!("Auto-selected {}", choice.name);
                }
                return;
            }
            // No one to ask: take the first option offered
            let options = shop_options(&mut self.state);
            if let Some(first) = options.first() {
                if let Err(e) = pick_upgrade(&mut self.state, first.id) {
                    log::warn!("Shop pick failed: {}", e);
                }
            }
        }
    }

    fn print_summary(summary: &RunSummary, profile: &ProfileData) {
        println!(
            "{} - reached wave {} in {}",
            if summary.victory { "VICTORY" } else { "GAME OVER" },
            summary.wave,
            summary.world_id
        );
        println!("  score {}  kills {}", summary.score, summary.kills);
        println!(
            "  gold +{} (dividend {})  tokens +{}",
            summary.total_gold(),
            summary.dividend,
            summary.tokens
        );
        if let Some(rank) = summary.high_score_rank {
            println!("  new high score, #{}", rank);
        }
        if let Some(opening) = &summary.crate_reward {
            println!("  {} opened:", opening.kind);
            for reward in &opening.rewards {
                println!("    [{}] {}", reward.item.rarity, reward.item.name);
            }
        }
        if let Some(world) = summary.unlocked_world {
            println!("  unlocked world {}", world);
        }
        println!(
            "Profile '{}': {} gold, {} tokens, store rank {}",
            profile.username, profile.gold, profile.shop_tokens, profile.store_rank
        );
    }

    pub fn run() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        let settings_path = std::env::args()
            .nth(1)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("settings.json"));
        let settings = Settings::load(&settings_path);

        let mut store = FileStore::new(&settings.save_dir);
        let mut profile = store.load_or_default(&settings.username);

        let seed = settings.seed.unwrap_or_else(now_ms);
        let state = match start_run(&profile, &settings.world_id, seed, &settings) {
            Ok(state) => state,
            Err(e) => {
                log::error!("Cannot start run: {}", e);
                return;
            }
        };

        let mut game = Game::new(state, settings.auto_select_upgrade);
        while !game.state.phase.is_finished() {
            if game.state.time >= settings.max_run_seconds {
                log::info!("Time limit of {}s reached", settings.max_run_seconds);
                game.input.quit = true;
            }
            game.update(FRAME_DT);
        }

        let mut rng = Pcg32::seed_from_u64(seed ^ game.state.time_ticks);
        let summary = finish_run(&game.state, &mut profile, &mut store, &mut rng);
        print_summary(&summary, &profile);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No headless driver on wasm
}
