//! ArkaBlock - a paddle-and-ball block breaker
//!
//! Core modules:
//! - `sim`: Entities, the entity registry, collision resolution, level layout
//! - `state`: Game states (menu, in-game) and their lifecycle
//! - `driver`: State machine and the fixed-timestep game loop
//! - `platform`: Presentation/input/resource/clock seams plus a headless backend
//! - `settings`: Data-driven configuration

pub mod driver;
pub mod error;
pub mod highscores;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod state;

pub use driver::{FrameSteps, GameDriver, StateMachine, split_frame};
pub use error::GameError;
pub use highscores::HighScores;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation step in milliseconds
    pub const FIXED_STEP_MS: u32 = 10;
    /// Target frames per second for the throttle
    pub const TARGET_FPS: u32 = 60;
    /// Wall-clock window over which FPS is counted
    pub const FPS_WINDOW_MS: u32 = 1000;

    /// Play area / window dimensions
    pub const WIDTH: u32 = 800;
    pub const HEIGHT: u32 = 600;
    pub const WINDOW_TITLE: &str = "Arkanoid";

    /// Session defaults
    pub const INITIAL_LIVES: u32 = 3;
    pub const GAME_OVER_TIMEOUT_MS: i64 = 3000;

    /// Paddle ("vaus") defaults
    pub const PADDLE_KEY: &str = "vaus";
    pub const PADDLE_START: (f32, f32) = (400.0, 550.0);
    pub const PADDLE_WIDTH: f32 = 96.0;
    pub const PADDLE_HEIGHT: f32 = 16.0;
    pub const PADDLE_MAX_SPEED: f32 = 900.0;
    /// Key-held acceleration is `delta / PADDLE_ACCEL_DIVISOR` px/s per update
    pub const PADDLE_ACCEL_DIVISOR: f32 = 0.2;
    /// Visual scale applied to the paddle model
    pub const PADDLE_MODEL_SCALE: f32 = 15.0;

    /// Ball defaults
    pub const BALL_KEY: &str = "ball";
    pub const BALL_RADIUS: f32 = 7.0;
    /// Resting just above the paddle so the two never overlap at rest
    pub const BALL_START: (f32, f32) = (
        PADDLE_START.0,
        PADDLE_START.1 - PADDLE_HEIGHT / 2.0 - BALL_RADIUS - 1.0,
    );
    pub const BALL_LAUNCH_SPEED: f32 = 200.0;
    pub const BALL_MAX_SPEED: f32 = 1500.0;

    /// Block wall layout
    pub const BLOCK_WIDTH: f32 = 64.0;
    pub const BLOCK_HEIGHT: f32 = 24.0;
    pub const BLOCK_COLUMNS: u32 = 10;
    pub const BLOCK_GAP: f32 = 8.0;
    pub const BLOCK_TOP: f32 = 80.0;
    pub const BLOCK_MAX_ROWS: u32 = 8;
    pub const BLOCK_POINTS: u32 = 10;

    /// Asset paths requested from the resource loader
    pub const TEX_BACKGROUND: &str = "img/bg_mig.jpg";
    pub const TEX_PADDLE: &str = "img/ship.jpg";
    pub const TEX_BALL: &str = "img/fire.jpg";
    pub const TEX_BLOCK: &str = "img/block.jpg";
    pub const MODEL_PADDLE: &str = "obj/vaus.obj";
}

/// Frame budget in whole milliseconds for a target frame rate
#[inline]
pub fn frame_budget_ms(target_fps: u32) -> u64 {
    1000 / u64::from(target_fps.max(1))
}
