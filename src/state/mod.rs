//! Game states
//!
//! A state is one mode of play. Lifecycle:
//! `init` once at startup, then any number of `enter` → update/render → `leave`
//! rounds. States never switch themselves; they ask the driver through the
//! tick context and the driver switches after the update call returns.

pub mod in_game;
pub mod menu;

pub use in_game::InGameState;
pub use menu::MenuState;

use crate::error::GameError;
use crate::platform::{Input, Key, Presentation, ResourceLoader};

/// Name of the core play state
pub const IN_GAME: &str = "inGame";
/// Name of the title / high-score state
pub const MENU: &str = "menu";

/// Per-update view of the outside world
pub struct TickContext<'a> {
    input: &'a dyn Input,
    requested: Option<String>,
}

impl<'a> TickContext<'a> {
    pub fn new(input: &'a dyn Input) -> Self {
        Self {
            input,
            requested: None,
        }
    }

    pub fn input(&self) -> &'a dyn Input {
        self.input
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.input.is_key_down(key)
    }

    /// Ask the driver to switch states after this update. The last request wins.
    pub fn request_state(&mut self, name: &str) {
        self.requested = Some(name.to_string());
    }

    pub fn take_request(&mut self) -> Option<String> {
        self.requested.take()
    }
}

/// One mode of play
pub trait GameState {
    /// Unique registration name
    fn name(&self) -> &str;

    /// Load shared resources. Called once, before the first `enter`.
    fn init(&mut self, loader: &mut dyn ResourceLoader) -> Result<(), GameError>;

    /// Start a fresh session
    fn enter(&mut self) -> Result<(), GameError>;

    /// Release session resources
    fn leave(&mut self);

    /// Advance by `delta_ms`
    fn update(&mut self, ctx: &mut TickContext<'_>, delta_ms: u32);

    /// Draw the current frame. `frame_delta_ms` is the full frame time.
    fn render(&self, out: &mut dyn Presentation, frame_delta_ms: u32);
}
