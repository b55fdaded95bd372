//! ArkaBlock entry point
//!
//! Runs the game core against the headless presentation backend with a seeded
//! autopilot on the keyboard. A windowed backend plugs in through the same
//! `Presentation`/`ResourceLoader` traits.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;

use arka_block::platform::{Clock, HeadlessPlatform, SimulatedClock, SystemClock};
use arka_block::state::{InGameState, MenuState};
use arka_block::{GameDriver, HighScores, Settings};

#[derive(Parser, Debug)]
#[command(name = "arka-block")]
#[command(about = "Paddle-and-ball block breaker (headless runner)")]
struct Cli {
    /// Settings JSON; defaults are used for anything it leaves out
    #[arg(long)]
    config: Option<PathBuf>,
    /// Stop after this many frames
    #[arg(long, default_value_t = 3_600)]
    frames: u64,
    /// Override the level layout / autopilot seed
    #[arg(long)]
    seed: Option<u64>,
    /// Pace frames against the wall clock instead of simulated time
    #[arg(long)]
    realtime: bool,
}

fn play<C: Clock>(settings: &Settings, clock: C, frames: u64) -> Result<u64> {
    let highscores = match &settings.highscores_path {
        Some(path) => HighScores::load_from(path)
            .with_context(|| format!("reading high scores from {}", path.display()))?,
        None => HighScores::new(),
    };
    let highscores = Rc::new(RefCell::new(highscores));

    let platform = HeadlessPlatform::new()
        .with_autopilot(settings.seed)
        .close_after(frames);
    let mut driver = GameDriver::new(platform, clock, settings.display.clone());
    driver.add_state(Box::new(MenuState::new(
        &settings.display,
        Rc::clone(&highscores),
    )));
    driver.add_state(Box::new(InGameState::new(settings, Rc::clone(&highscores))));

    driver
        .init()
        .inspect_err(|e| log::error!("Startup failed: {}", e))
        .context("startup failed")?;
    let presented = driver.run()?;

    if let Some(best) = highscores.borrow().top_score() {
        log::info!("Top high score: {}", best);
    }
    Ok(presented)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref());
    if let Some(seed) = cli.seed {
        settings.seed = seed;
    }
    log::info!("ArkaBlock starting (seed {:#x})", settings.seed);

    let presented = if cli.realtime {
        play(&settings, SystemClock::new(), cli.frames)?
    } else {
        play(&settings, SimulatedClock::new(), cli.frames)?
    };

    log::info!("Presented {} frames", presented);
    Ok(())
}
