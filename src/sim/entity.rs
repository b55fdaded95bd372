//! Entities: paddle, ball and blocks
//!
//! Behavior is selected by variant. Collision tests and reactions go through
//! two small tables keyed by `(self, other)` variants instead of inspecting the
//! other entity's concrete type.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::collision::{Collider, aabb_overlap};
use super::registry::Siblings;
use crate::consts::*;
use crate::platform::{DrawCommand, Input, Key, ModelHandle, Presentation, TextureHandle};
use crate::settings::Gameplay;

/// Closed set of entity variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Paddle,
    Ball,
    Block,
}

/// Which overlap test a pair uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTest {
    /// Half-extent bounding box overlap
    Bounds,
    /// Bounding box overlap while the ball is moving into the block
    Approach,
    /// Pair never collides
    Never,
}

/// What `this` does when it touches `other`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Paddle sends the ball back up, possibly reversing it horizontally
    DeflectBall,
    /// Ball reflects off a block face
    BounceOffBlock,
    /// Block loses durability
    TakeHit,
    Ignore,
}

/// Overlap test table
pub fn hit_test(this: EntityKind, other: EntityKind) -> HitTest {
    use EntityKind::*;
    match (this, other) {
        // The paddle is long and flat: it only ever tests against the ball
        (Paddle, Ball) | (Ball, Paddle) => HitTest::Bounds,
        (Paddle, _) | (_, Paddle) => HitTest::Never,
        (Block, Block) => HitTest::Never,
        (Ball, Block) | (Block, Ball) => HitTest::Approach,
        (Ball, Ball) => HitTest::Bounds,
    }
}

/// Reaction table
pub fn reaction(this: EntityKind, other: EntityKind) -> Reaction {
    use EntityKind::*;
    match (this, other) {
        (Paddle, Ball) => Reaction::DeflectBall,
        (Ball, Block) => Reaction::BounceOffBlock,
        (Block, Ball) => Reaction::TakeHit,
        _ => Reaction::Ignore,
    }
}

/// Side effects collisions hand back to the owning state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Block survived a hit
    BlockDamaged { key: String, hits_left: u8 },
    /// Block broke and should be removed
    BlockDestroyed { key: String, points: u32 },
}

/// Rectangle entities are kept inside
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayArea {
    pub min: Vec2,
    pub max: Vec2,
}

impl PlayArea {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::new(width as f32, height as f32),
        }
    }
}

/// Handles the presentation layer needs to draw an entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Look {
    pub model: Option<ModelHandle>,
    pub texture: Option<TextureHandle>,
    pub scale: f32,
}

impl Default for Look {
    fn default() -> Self {
        Self {
            model: None,
            texture: None,
            scale: 1.0,
        }
    }
}

/// Everything an entity may read while updating
pub struct UpdateContext<'a> {
    /// Every other entity in the registry
    pub siblings: Siblings<'a>,
    pub input: &'a dyn Input,
    pub area: PlayArea,
    pub tuning: &'a Gameplay,
}

/// A simulated object
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    key: String,
    kind: EntityKind,
    /// Centre position; z is carried for the presentation layer only
    pub pos: Vec3,
    /// Pixels per second
    pub vel: Vec2,
    size: f32,
    extents: Vec2,
    spawn: Vec2,
    /// Hits left before a block breaks (unused for paddle/ball)
    durability: u8,
    points: u32,
    destroyed: bool,
    look: Look,
}

impl Entity {
    fn new(key: &str, kind: EntityKind, spawn: Vec2, extents: Vec2, look: Look) -> Self {
        Self {
            key: key.to_string(),
            kind,
            pos: spawn.extend(0.0),
            vel: Vec2::ZERO,
            size: extents.max_element().max(0.0),
            extents: extents.max(Vec2::ZERO),
            spawn,
            durability: 0,
            points: 0,
            destroyed: false,
            look,
        }
    }

    /// The player's paddle, keyed `"vaus"`
    pub fn paddle(look: Look) -> Self {
        Self::new(
            PADDLE_KEY,
            EntityKind::Paddle,
            Vec2::from(PADDLE_START),
            Vec2::new(PADDLE_WIDTH, PADDLE_HEIGHT),
            look,
        )
    }

    /// The ball, resting on the paddle
    pub fn ball(look: Look) -> Self {
        let diameter = BALL_RADIUS * 2.0;
        Self::new(
            BALL_KEY,
            EntityKind::Ball,
            Vec2::from(BALL_START),
            Vec2::splat(diameter),
            look,
        )
    }

    /// A breakable block centred at `center`
    pub fn block(key: &str, center: Vec2, durability: u8, points: u32, look: Look) -> Self {
        let mut block = Self::new(
            key,
            EntityKind::Block,
            center,
            Vec2::new(BLOCK_WIDTH, BLOCK_HEIGHT),
            look,
        );
        block.durability = durability.max(1);
        block.points = points;
        block
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Base size (largest extent)
    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn size_x(&self) -> f32 {
        self.extents.x
    }

    pub fn size_y(&self) -> f32 {
        self.extents.y
    }

    pub fn durability(&self) -> u8 {
        self.durability
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Ball sitting on the paddle, not yet launched
    pub fn is_resting(&self) -> bool {
        self.vel.y == 0.0
    }

    /// Back to the spawn point, stopped
    pub fn reset(&mut self) {
        self.pos = self.spawn.extend(self.pos.z);
        self.vel = Vec2::ZERO;
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.pos.x = x;
        self.pos.y = y;
        self
    }

    pub fn with_velocity(mut self, x: f32, y: f32) -> Self {
        self.vel = Vec2::new(x, y);
        self
    }

    //--- Update -----------------------------------------------------------

    /// Advance by `delta_ms` milliseconds
    pub fn update(&mut self, ctx: &UpdateContext<'_>, delta_ms: u32) {
        match self.kind {
            EntityKind::Paddle => self.update_paddle(ctx, delta_ms),
            EntityKind::Ball => self.update_ball(ctx, delta_ms),
            EntityKind::Block => {}
        }
    }

    fn update_paddle(&mut self, ctx: &UpdateContext<'_>, delta_ms: u32) {
        let accel = delta_ms as f32 / ctx.tuning.paddle_accel_divisor;
        if ctx.input.is_key_down(Key::Left) {
            self.vel.x -= accel;
        } else if ctx.input.is_key_down(Key::Right) {
            self.vel.x += accel;
        } else if self.vel.x.abs() > 1.0 {
            self.vel.x = 0.0;
        } else {
            self.vel.x /= 2.0;
        }

        let max = ctx.tuning.paddle_max_speed;
        self.vel.x = self.vel.x.clamp(-max, max);

        self.integrate(ctx.area, delta_ms);
    }

    fn update_ball(&mut self, ctx: &UpdateContext<'_>, delta_ms: u32) {
        // Resting ball rides along with the paddle
        if self.is_resting() {
            if let Some(paddle) = ctx.siblings.get(PADDLE_KEY) {
                self.vel.x = paddle.vel.x;
            }
        }

        if ctx.input.is_key_down(Key::Space) && self.is_resting() && self.vel.x == 0.0 {
            self.vel.x += ctx.tuning.ball_launch_speed;
            self.vel.y -= ctx.tuning.ball_launch_speed;
        }

        let max = ctx.tuning.ball_max_speed;
        self.vel.x = self.vel.x.clamp(-max, max);

        let before = self.vel;
        self.integrate(ctx.area, delta_ms);

        // A wall clamp zeroed the component: bounce it back
        if self.vel.x == 0.0 {
            self.vel.x = -before.x;
        }
        if self.vel.y == 0.0 {
            self.vel.y = -before.y;
        }
    }

    /// Move by velocity, then clamp into the play area. A clamped axis loses
    /// its velocity component.
    fn integrate(&mut self, area: PlayArea, delta_ms: u32) {
        let dt = delta_ms as f32 / 1000.0;
        self.pos.x += self.vel.x * dt;
        self.pos.y += self.vel.y * dt;

        let half = self.extents / 2.0;
        let min = area.min + half;
        let max = area.max - half;

        if self.pos.x < min.x {
            self.pos.x = min.x;
            self.vel.x = 0.0;
        } else if self.pos.x > max.x {
            self.pos.x = max.x;
            self.vel.x = 0.0;
        }

        if self.pos.y < min.y {
            self.pos.y = min.y;
            self.vel.y = 0.0;
        } else if self.pos.y > max.y {
            self.pos.y = max.y;
            self.vel.y = 0.0;
        }
    }

    //--- Rendering --------------------------------------------------------

    pub fn draw_command(&self) -> DrawCommand {
        DrawCommand {
            position: self.pos,
            extents: self.extents,
            scale: self.look.scale,
            model: self.look.model,
            texture: self.look.texture,
        }
    }

    pub fn render(&self, out: &mut dyn Presentation) {
        out.draw(&self.draw_command());
    }

    //--- Collision reactions ----------------------------------------------

    fn deflect_ball(&self, ball: &mut Entity) {
        // Already on its way up: nothing to do
        if ball.vel.y <= 0.0 {
            return;
        }
        ball.vel.y = -ball.vel.y;

        let hit_right_moving_left = self.pos.x < ball.pos.x && ball.vel.x < 0.0;
        let hit_left_moving_right = self.pos.x > ball.pos.x && ball.vel.x > 0.0;
        if hit_right_moving_left || hit_left_moving_right {
            ball.vel.x = -ball.vel.x;
        }
    }

    /// Ball velocity points into `other` on the axis of least penetration
    fn approaches(&self, other: &Entity) -> bool {
        let d = self.pos.truncate() - other.pos.truncate();
        let overlap = (self.extents + other.extents) / 2.0 - d.abs();
        if overlap.x < overlap.y {
            d.x * self.vel.x < 0.0
        } else {
            d.y * self.vel.y < 0.0
        }
    }

    fn bounce_off_block(&mut self, block: &Entity) {
        let d = self.pos.truncate() - block.pos.truncate();
        let overlap = (self.extents + block.extents) / 2.0 - d.abs();

        // Reflect on the shallower axis, always pointing away from the block
        if overlap.x < overlap.y {
            let away = if d.x < 0.0 { -1.0 } else { 1.0 };
            self.vel.x = self.vel.x.abs() * away;
        } else {
            let away = if d.y < 0.0 { -1.0 } else { 1.0 };
            self.vel.y = self.vel.y.abs() * away;
        }
    }

    fn take_hit(&mut self, events: &mut Vec<GameEvent>) {
        if self.destroyed {
            return;
        }
        self.durability = self.durability.saturating_sub(1);
        if self.durability == 0 {
            self.destroyed = true;
            events.push(GameEvent::BlockDestroyed {
                key: self.key.clone(),
                points: self.points,
            });
        } else {
            events.push(GameEvent::BlockDamaged {
                key: self.key.clone(),
                hits_left: self.durability,
            });
        }
    }
}

impl Collider for Entity {
    fn collides(&self, other: &Self) -> bool {
        let overlap = || {
            aabb_overlap(
                self.pos.truncate(),
                self.extents,
                other.pos.truncate(),
                other.extents,
            )
        };
        match hit_test(self.kind, other.kind) {
            HitTest::Never => false,
            HitTest::Bounds => overlap(),
            // A ball already bounced away from a block is not a fresh hit
            HitTest::Approach if self.kind == EntityKind::Ball => {
                overlap() && self.approaches(other)
            }
            HitTest::Approach => overlap() && other.approaches(self),
        }
    }

    fn collide(&mut self, other: &mut Self, events: &mut Vec<GameEvent>) {
        match reaction(self.kind, other.kind) {
            Reaction::DeflectBall => self.deflect_ball(other),
            Reaction::BounceOffBlock => self.bounce_off_block(other),
            Reaction::TakeHit => self.take_hit(events),
            Reaction::Ignore => {}
        }
    }

    fn is_active(&self) -> bool {
        !self.destroyed
    }
}
