//! Platform abstraction layer
//!
//! The core never talks to a window, GPU or asset decoder directly. It goes
//! through these seams:
//! - `Presentation`: window, frame presentation and drawing primitives
//! - `Input`: keyboard "key down" queries
//! - `ResourceLoader`: textures/models as opaque handles
//! - `Clock`: wall-clock milliseconds and the throttle sleep

pub mod clock;
pub mod headless;

pub use clock::{Clock, SimulatedClock, SystemClock};
pub use headless::{Autopilot, HeadlessPlatform};

use glam::{Vec2, Vec3};

use crate::error::GameError;

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Space,
    Enter,
}

/// Opaque texture handle issued by a `ResourceLoader`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Opaque model handle issued by a `ResourceLoader`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelHandle(pub u32);

/// One entity draw, already reduced to a transform and handles
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    /// Centre of the entity (z is passed through, unused by physics)
    pub position: Vec3,
    /// Bounding extents (width, height)
    pub extents: Vec2,
    /// Model scale factor (1.0 for primitives)
    pub scale: f32,
    pub model: Option<ModelHandle>,
    pub texture: Option<TextureHandle>,
}

/// Keyboard state queries
pub trait Input {
    fn is_key_down(&self, key: Key) -> bool;
}

/// Window and drawing surface
pub trait Presentation: Input {
    /// Open the game window. Failure is fatal to startup.
    fn create_window(&mut self, width: u32, height: u32, title: &str) -> Result<(), GameError>;
    fn set_title(&mut self, title: &str);
    /// Swap buffers; also pumps the platform's input/close events
    fn present_frame(&mut self);
    fn is_close_requested(&self) -> bool;

    fn clear(&mut self);
    fn draw_background(&mut self, texture: TextureHandle, width: u32, height: u32);
    fn draw(&mut self, command: &DrawCommand);
    fn draw_text(&mut self, text: &str, at: Vec2);
}

/// Asset loading collaborator
pub trait ResourceLoader {
    fn load_texture(&mut self, path: &str) -> Result<TextureHandle, GameError>;
    fn load_model(&mut self, path: &str) -> Result<ModelHandle, GameError>;
}
