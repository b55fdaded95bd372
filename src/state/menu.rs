//! Title screen
//!
//! Shows the high-score table and starts a game on Space or Enter.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use super::{GameState, IN_GAME, MENU, TickContext};
use crate::consts::TEX_BACKGROUND;
use crate::error::GameError;
use crate::highscores::HighScores;
use crate::platform::{Key, Presentation, ResourceLoader, TextureHandle};
use crate::settings::DisplaySettings;

pub struct MenuState {
    display: DisplaySettings,
    highscores: Rc<RefCell<HighScores>>,
    background: Option<TextureHandle>,
    /// Set once a start key is seen; cleared on `enter`
    starting: bool,
}

impl MenuState {
    pub fn new(display: &DisplaySettings, highscores: Rc<RefCell<HighScores>>) -> Self {
        Self {
            display: display.clone(),
            highscores,
            background: None,
            starting: false,
        }
    }
}

impl GameState for MenuState {
    fn name(&self) -> &str {
        MENU
    }

    fn init(&mut self, loader: &mut dyn ResourceLoader) -> Result<(), GameError> {
        self.background = Some(loader.load_texture(TEX_BACKGROUND)?);
        Ok(())
    }

    fn enter(&mut self) -> Result<(), GameError> {
        self.starting = false;
        log::debug!("Menu: {} high scores", self.highscores.borrow().entries.len());
        Ok(())
    }

    fn leave(&mut self) {}

    fn update(&mut self, ctx: &mut TickContext<'_>, _delta_ms: u32) {
        if self.starting {
            return;
        }
        if ctx.is_key_down(Key::Space) || ctx.is_key_down(Key::Enter) {
            self.starting = true;
            ctx.request_state(IN_GAME);
        }
    }

    fn render(&self, out: &mut dyn Presentation, _frame_delta_ms: u32) {
        let center_x = self.display.width as f32 / 2.0;
        out.clear();
        if let Some(background) = self.background {
            out.draw_background(background, self.display.width, self.display.height);
        }

        out.draw_text(&self.display.title, Vec2::new(center_x - 60.0, 120.0));

        let scores = self.highscores.borrow();
        if scores.is_empty() {
            out.draw_text("No high scores yet", Vec2::new(center_x - 80.0, 200.0));
        }
        for (i, entry) in scores.entries.iter().enumerate() {
            out.draw_text(
                &format!("{:>2}. {:>6}  L{}", i + 1, entry.score, entry.level),
                Vec2::new(center_x - 80.0, 200.0 + i as f32 * 24.0),
            );
        }

        out.draw_text(
            "Press SPACE to start",
            Vec2::new(center_x - 90.0, self.display.height as f32 - 80.0),
        );
    }
}
