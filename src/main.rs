//! Kick Clock entry point
//!
//! Native builds run a headless demo match on a simulated clock. The browser
//! build is driven through `platform::web::WebGame` instead.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use kick_clock::consts::TICK_MS;
    use kick_clock::platform::ManualTime;
    use kick_clock::sim::{GameEvent, GameMode, GamePhase, GameSession};
    use kick_clock::{LocalScoreboard, Settings, Tuning};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mode = std::env::args()
        .nth(1)
        .and_then(|m| GameMode::from_str(&m))
        .unwrap_or(GameMode::Bot);
    if mode == GameMode::Online {
        log::error!("Online play needs a room; pick another mode");
        std::process::exit(2);
    }
    log::info!("Kick Clock (native) demo: {}", mode.as_str());

    let time = ManualTime::with_epoch(1_700_000_000_000.0);
    let settings = Settings {
        mode,
        player_name: "demo".to_string(),
        ..Settings::default()
    };
    let mut session = GameSession::new(settings, Tuning::default(), Box::new(time.clone()), 7)
        .with_scoreboard(Box::new(LocalScoreboard::in_memory(Box::new(time.clone()))));

    // Stand-in for a human: press somewhere in the next second and a half
    let mut hands = Pcg32::seed_from_u64(42);
    let mut press_at: Option<f64> = None;

    session.start();
    while session.phase() != GamePhase::Finished {
        time.advance(TICK_MS);
        let elapsed = session.tick();
        for event in session.drain_events() {
            match &event {
                GameEvent::ShotResolved { .. } | GameEvent::Finished { .. } | GameEvent::SuddenDeath { .. } => {
                    log::info!("{}", serde_json::to_string(&event).unwrap_or_default());
                }
                GameEvent::TurnStarted { .. } => press_at = None,
                _ => {}
            }
        }
        if session.phase() != GamePhase::Playing {
            continue;
        }
        let due = *press_at.get_or_insert_with(|| elapsed + hands.random_range(200.0..1500.0));
        if elapsed >= due {
            press_at = None;
            session.handle_action();
        }
    }

    let snapshot = session.snapshot();
    println!(
        "{} finished after {:.1}s: {:?}, scores {:?}",
        mode.as_str(),
        snapshot.elapsed_ms / 1000.0,
        snapshot.result,
        snapshot.scores
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::wasm_start, this is just to satisfy the compiler
}
