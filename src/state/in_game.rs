//! The core play state
//!
//! Owns the session registry (paddle, ball, block wall) and the play
//! variables. One `update` call walks the registry in insertion order:
//! each entity moves, resolves collisions with the entities after it, then the
//! ball-missed check runs. Collision events are applied after the pass.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use super::{GameState, IN_GAME, MENU, TickContext};
use crate::consts::*;
use crate::error::GameError;
use crate::highscores::{HighScores, unix_millis};
use crate::platform::{Presentation, ResourceLoader, TextureHandle};
use crate::settings::Settings;
use crate::sim::{
    Entity, EntityKind, EntityRegistry, GameEvent, Look, PlayArea, UpdateContext, level,
};

/// Handles loaded once in `init`
#[derive(Debug, Clone, Copy, Default)]
struct Assets {
    background: Option<TextureHandle>,
    paddle: Look,
    ball: Look,
    block: Look,
}

pub struct InGameState {
    settings: Settings,
    highscores: Rc<RefCell<HighScores>>,
    assets: Assets,
    registry: EntityRegistry,
    /// Collision events collected during a pass
    events: Vec<GameEvent>,

    score: u64,
    lives: u32,
    level: u32,
    game_over: bool,
    /// Milliseconds left on the game-over banner (goes negative)
    countdown_ms: i64,
    /// The menu transition has been requested for this game over
    exit_requested: bool,
}

impl InGameState {
    pub fn new(settings: &Settings, highscores: Rc<RefCell<HighScores>>) -> Self {
        Self {
            settings: settings.clone(),
            highscores,
            assets: Assets::default(),
            registry: EntityRegistry::new(),
            events: Vec::new(),
            score: 0,
            lives: settings.gameplay.initial_lives,
            level: 1,
            game_over: false,
            countdown_ms: 0,
            exit_requested: false,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn countdown_ms(&self) -> i64 {
        self.countdown_ms
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Blocks still standing
    pub fn blocks_left(&self) -> usize {
        self.registry
            .iter()
            .filter(|e| e.kind() == EntityKind::Block)
            .count()
    }

    fn area(&self) -> PlayArea {
        PlayArea::new(self.settings.display.width, self.settings.display.height)
    }

    fn spawn_wall(&mut self) -> Result<usize, GameError> {
        level::spawn_wall(
            &mut self.registry,
            self.settings.seed,
            self.level,
            self.settings.display.width,
            self.assets.block,
        )
    }

    /// Ball and paddle back to their spawn points
    fn reset_players(&mut self) {
        for key in [PADDLE_KEY, BALL_KEY] {
            if let Some(entity) = self.registry.get_mut(key) {
                entity.reset();
            }
        }
    }

    /// Ball centre below the paddle's bottom edge
    fn ball_missed(&self) -> bool {
        match (self.registry.get(BALL_KEY), self.registry.get(PADDLE_KEY)) {
            (Some(ball), Some(paddle)) => ball.pos.y > paddle.pos.y + paddle.size_y(),
            _ => false,
        }
    }

    fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.reset_players();
        log::info!("Ball lost, {} lives left", self.lives);

        if self.lives == 0 {
            self.game_over = true;
            self.countdown_ms = self.settings.gameplay.game_over_timeout_ms;
            self.exit_requested = false;
            log::info!("Game over: score {} at level {}", self.score, self.level);
            self.record_high_score();
        }
    }

    fn record_high_score(&mut self) {
        let rank = self
            .highscores
            .borrow_mut()
            .add_score(self.score, self.level, unix_millis());
        let Some(rank) = rank else {
            return;
        };
        log::info!("New high score #{}: {}", rank, self.score);

        if let Some(path) = &self.settings.highscores_path {
            if let Err(e) = self.highscores.borrow().save_to(path) {
                log::warn!("Failed to save high scores: {}", e);
            }
        }
    }

    fn apply_events(&mut self) {
        for event in self.events.drain(..) {
            match event {
                GameEvent::BlockDestroyed { key, points } => {
                    self.score += u64::from(points);
                    log::debug!("{} destroyed (+{})", key, points);
                }
                GameEvent::BlockDamaged { key, hits_left } => {
                    log::debug!("{} hit, {} left", key, hits_left);
                }
            }
        }
        self.registry.remove_destroyed();
    }

    fn next_level(&mut self) {
        self.level += 1;
        self.reset_players();
        match self.spawn_wall() {
            Ok(blocks) => log::info!("Level {} ({} blocks)", self.level, blocks),
            Err(e) => log::error!("Failed to build level {}: {}", self.level, e),
        }
    }

    fn update_countdown(&mut self, ctx: &mut TickContext<'_>, delta_ms: u32) {
        self.countdown_ms -= i64::from(delta_ms);
        if self.countdown_ms < 0 && !self.exit_requested {
            self.exit_requested = true;
            ctx.request_state(MENU);
        }
    }
}

impl GameState for InGameState {
    fn name(&self) -> &str {
        IN_GAME
    }

    fn init(&mut self, loader: &mut dyn ResourceLoader) -> Result<(), GameError> {
        self.assets = Assets {
            background: Some(loader.load_texture(TEX_BACKGROUND)?),
            paddle: Look {
                model: Some(loader.load_model(MODEL_PADDLE)?),
                texture: Some(loader.load_texture(TEX_PADDLE)?),
                scale: PADDLE_MODEL_SCALE,
            },
            ball: Look {
                texture: Some(loader.load_texture(TEX_BALL)?),
                ..Look::default()
            },
            block: Look {
                texture: Some(loader.load_texture(TEX_BLOCK)?),
                ..Look::default()
            },
        };
        log::info!("{} resources loaded", IN_GAME);
        Ok(())
    }

    fn enter(&mut self) -> Result<(), GameError> {
        self.registry.clear();
        self.events.clear();
        self.score = 0;
        self.lives = self.settings.gameplay.initial_lives;
        self.level = 1;
        self.game_over = false;
        self.countdown_ms = 0;
        self.exit_requested = false;

        self.registry.add(Entity::paddle(self.assets.paddle))?;
        self.registry.add(Entity::ball(self.assets.ball))?;
        let blocks = self.spawn_wall()?;
        log::info!("New game: {} lives, {} blocks", self.lives, blocks);
        Ok(())
    }

    fn leave(&mut self) {
        self.registry.clear();
        self.events.clear();
    }

    fn update(&mut self, ctx: &mut TickContext<'_>, delta_ms: u32) {
        if self.game_over {
            self.update_countdown(ctx, delta_ms);
            return;
        }

        let area = self.area();
        let input = ctx.input();
        let mut life_lost = false;

        for i in 0..self.registry.len() {
            let tuning = &self.settings.gameplay;
            self.registry.update_at(i, |entity, siblings| {
                let uctx = UpdateContext {
                    siblings,
                    input,
                    area,
                    tuning,
                };
                entity.update(&uctx, delta_ms);
            });
            self.registry.resolve_pairs_from(i, &mut self.events);

            if !life_lost && self.ball_missed() {
                life_lost = true;
                self.lose_life();
            }
        }

        self.apply_events();

        if !self.game_over && self.blocks_left() == 0 {
            self.next_level();
        }
    }

    fn render(&self, out: &mut dyn Presentation, _frame_delta_ms: u32) {
        let (width, height) = (self.settings.display.width, self.settings.display.height);
        out.clear();
        if let Some(background) = self.assets.background {
            out.draw_background(background, width, height);
        }
        for entity in self.registry.iter() {
            entity.render(out);
        }

        out.draw_text(&format!("Score: {}", self.score), Vec2::new(10.0, 10.0));
        out.draw_text(&format!("Lives: {}", self.lives), Vec2::new(10.0, 30.0));
        out.draw_text(&format!("Level: {}", self.level), Vec2::new(10.0, 50.0));
        if self.game_over {
            out.draw_text(
                "GAME OVER",
                Vec2::new(width as f32 / 2.0 - 40.0, height as f32 / 2.0),
            );
        }
    }
}
