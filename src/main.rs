//! Deep Dig entry point
//!
//! Runs a headless autopilot session and prints a run summary.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::Cell;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    use clap::Parser;
    use deep_dig::Tuning;
    use deep_dig::consts::*;
    use deep_dig::sim::{EventBus, EventKind, GameEvent, GamePhase, GameState, TickInput, tick};

    /// Wall-clock frame the host pretends to render at
    const FRAME_DT: f32 = 1.0 / 30.0;
    /// Give up after this much simulated time
    const MAX_SIM_SECONDS: f32 = 600.0;

    /// Headless Deep Dig run driven by the autopilot.
    #[derive(Debug, Parser)]
    #[command(
        name = "deep-dig",
        version,
        about = "Dig-downward arcade sim. Plays one run on autopilot and prints a summary."
    )]
    pub struct Args {
        /// Run seed; the same seed and tuning always replay the same run
        #[arg(default_value_t = 1)]
        pub seed: u64,

        /// Balance overrides as JSON. Missing fields keep their defaults.
        #[arg(value_name = "FILE")]
        pub tuning: Option<PathBuf>,
    }

    fn load_tuning(path: Option<&Path>) -> Tuning {
        let Some(path) = path else {
            return Tuning::default();
        };
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()));
        match parsed {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(err) => {
                log::warn!("Ignoring tuning file {}: {}", path.display(), err);
                Tuning::default()
            }
        }
    }

    pub fn run(args: Args) {
        let seed = args.seed;
        let tuning = load_tuning(args.tuning.as_deref());

        let mut state = GameState::with_tuning(seed, tuning);
        let mut bus = EventBus::new();

        bus.subscribe_all(|event| log::debug!("event {}", event.name()));

        let rows_cleared = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&rows_cleared);
        bus.subscribe(EventKind::RowCleared, move |_| counter.set(counter.get() + 1));

        let kills = Rc::new(Cell::new(0u32));
        let kill_counter = Rc::clone(&kills);
        bus.subscribe(EventKind::EntityDestroyed, move |event| {
            if let GameEvent::EntityDestroyed { kind, .. } = event {
                log::debug!("{} destroyed", kind.as_str());
            }
            kill_counter.set(kill_counter.get() + 1);
        });

        bus.subscribe(EventKind::ShopOpened, |event| {
            if let GameEvent::ShopOpened { depth, offers } = event {
                let names: Vec<&str> = offers.iter().map(|o| o.id()).collect();
                log::info!("Shop at depth {}: {}", depth, names.join(", "));
            }
        });

        log::debug!("{} event subscribers", bus.subscriber_count());

        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        let mut accumulator = 0.0;
        let mut elapsed = 0.0;

        while state.phase != GamePhase::GameOver && elapsed < MAX_SIM_SECONDS {
            accumulator += FRAME_DT;
            elapsed += FRAME_DT;

            let mut substeps = 0;
            while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                tick(&mut state, &input, SIM_DT);
                accumulator -= SIM_DT;
                substeps += 1;
            }

            let events = state.drain_events();
            bus.publish_all(events);
        }

        println!("Deep Dig run (seed {})", seed);
        println!("  outcome:      {:?}", state.phase);
        println!("  ticks:        {}", state.time_ticks);
        println!("  max depth:    {}", state.stats.max_depth);
        println!("  lives left:   {}", state.stats.lives);
        println!("  coins earned: {}", state.stats.total_coins);
        println!("  rows cleared: {}", rows_cleared.get());
        println!("  destroyed:    {}", kills.get());
        let relics: Vec<&str> = state.stats.relics.iter().map(|r| r.id()).collect();
        println!("  relics:       [{}]", relics.join(", "));
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_args_defaults() {
            let args = Args::try_parse_from(["deep-dig"]).unwrap();
            assert_eq!(args.seed, 1);
            assert!(args.tuning.is_none());

            let args = Args::try_parse_from(["deep-dig", "42", "balance.json"]).unwrap();
            assert_eq!(args.seed, 42);
            assert_eq!(args.tuning, Some(PathBuf::from("balance.json")));
        }

        #[test]
        fn test_args_reject_bad_seed() {
            assert!(Args::try_parse_from(["deep-dig", "deep"]).is_err());
            let help = Args::try_parse_from(["deep-dig", "--help"]).unwrap_err();
            assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    let args = headless::Args::parse();
    env_logger::init();
    log::info!("Deep Dig (headless) starting...");
    headless::run(args);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web host drives `sim::tick` directly; nothing to do here
}
