//! Headless presentation backend
//!
//! Draws nothing, counts everything. Keyboard state is either driven by hand
//! (`press`/`release`) or by a seeded autopilot that mashes keys. Used by the
//! binary for soak runs and by tests for end-to-end loop checks.

use std::collections::{HashMap, HashSet};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{DrawCommand, Input, Key, ModelHandle, Presentation, ResourceLoader, TextureHandle};
use crate::error::GameError;

/// Largest window the headless backend pretends to support
const MAX_DIMENSION: u32 = 8192;

/// Seeded random key holder.
///
/// Every few frames it picks a new key (or none) and holds it for a random
/// number of frames.
#[derive(Debug, Clone)]
pub struct Autopilot {
    rng: Pcg32,
    held: Option<Key>,
    frames_left: u32,
}

impl Autopilot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            held: None,
            frames_left: 0,
        }
    }

    /// Advance one frame, returning the key to hold during it
    pub fn next_frame(&mut self) -> Option<Key> {
        if self.frames_left == 0 {
            self.held = match self.rng.random_range(0..10) {
                0..=3 => Some(Key::Left),
                4..=7 => Some(Key::Right),
                8 => Some(Key::Space),
                _ => None,
            };
            self.frames_left = self.rng.random_range(4..30);
        }
        self.frames_left -= 1;
        self.held
    }
}

/// Presentation layer that records instead of drawing
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    window: Option<(u32, u32)>,
    title: String,
    keys: HashSet<Key>,
    autopilot: Option<Autopilot>,
    close_after: Option<u64>,
    close_requested: bool,
    frames_presented: u64,
    draws_this_frame: usize,
    draws_last_frame: usize,
    text_this_frame: Vec<String>,
    text_last_frame: Vec<String>,
    // Resource bookkeeping
    next_handle: u32,
    loaded: HashMap<String, u32>,
    missing: HashSet<String>,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request close once this many frames have been presented
    pub fn close_after(mut self, frames: u64) -> Self {
        self.close_after = Some(frames);
        self
    }

    /// Drive the keyboard from a seeded autopilot
    pub fn with_autopilot(mut self, seed: u64) -> Self {
        self.autopilot = Some(Autopilot::new(seed));
        self
    }

    /// Make `load_*` fail for this path
    pub fn with_missing_resource(mut self, path: &str) -> Self {
        self.missing.insert(path.to_string());
        self
    }

    pub fn press(&mut self, key: Key) {
        self.keys.insert(key);
    }

    pub fn window(&self) -> Option<(u32, u32)> {
        self.window
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Entity/background draws in the last presented frame
    pub fn draws_last_frame(&self) -> usize {
        self.draws_last_frame
    }

    /// Text lines drawn in the last presented frame
    pub fn text_last_frame(&self) -> &[String] {
        &self.text_last_frame
    }

    pub fn loaded_resources(&self) -> usize {
        self.loaded.len()
    }

    fn load(&mut self, path: &str) -> Result<u32, GameError> {
        if self.missing.contains(path) {
            return Err(GameError::ResourceLoad {
                path: path.to_string(),
                reason: "not found".to_string(),
            });
        }
        if let Some(&handle) = self.loaded.get(path) {
            return Ok(handle);
        }
        self.next_handle += 1;
        self.loaded.insert(path.to_string(), self.next_handle);
        log::debug!("Loaded '{}' as handle {}", path, self.next_handle);
        Ok(self.next_handle)
    }
}

impl Input for HeadlessPlatform {
    fn is_key_down(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }
}

impl Presentation for HeadlessPlatform {
    fn create_window(&mut self, width: u32, height: u32, title: &str) -> Result<(), GameError> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(GameError::DisplayUnavailable {
                width,
                height,
                reason: format!("headless surface supports 1..={}", MAX_DIMENSION),
            });
        }
        self.window = Some((width, height));
        self.title = title.to_string();
        Ok(())
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn present_frame(&mut self) {
        self.frames_presented += 1;
        self.draws_last_frame = std::mem::take(&mut self.draws_this_frame);
        self.text_last_frame = std::mem::take(&mut self.text_this_frame);

        if let Some(limit) = self.close_after {
            if self.frames_presented >= limit {
                self.close_requested = true;
            }
        }

        // Autopilot owns the keyboard for the next frame
        if let Some(pilot) = self.autopilot.as_mut() {
            self.keys.clear();
            if let Some(key) = pilot.next_frame() {
                self.keys.insert(key);
            }
        }
    }

    fn is_close_requested(&self) -> bool {
        self.close_requested
    }

    fn clear(&mut self) {
        self.draws_this_frame = 0;
        self.text_this_frame.clear();
    }

    fn draw_background(&mut self, _texture: TextureHandle, _width: u32, _height: u32) {
        self.draws_this_frame += 1;
    }

    fn draw(&mut self, _command: &DrawCommand) {
        self.draws_this_frame += 1;
    }

    fn draw_text(&mut self, text: &str, _at: Vec2) {
        self.text_this_frame.push(text.to_string());
    }
}

impl ResourceLoader for HeadlessPlatform {
    fn load_texture(&mut self, path: &str) -> Result<TextureHandle, GameError> {
        self.load(path).map(TextureHandle)
    }

    fn load_model(&mut self, path: &str) -> Result<ModelHandle, GameError> {
        self.load(path).map(ModelHandle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autopilot_is_deterministic() {
        let mut a = Autopilot::new(42);
        let mut b = Autopilot::new(42);
        for _ in 0..200 {
            assert_eq!(a.next_frame(), b.next_frame());
        }
    }

    #[test]
    fn test_close_after_frames() {
        let mut platform = HeadlessPlatform::new().close_after(2);
        platform.present_frame();
        assert!(!platform.is_close_requested());
        platform.present_frame();
        assert!(platform.is_close_requested());
    }

    #[test]
    fn test_create_window_rejects_zero_size() {
        let mut platform = HeadlessPlatform::new();
        assert!(matches!(
            platform.create_window(0, 600, "x"),
            Err(GameError::DisplayUnavailable { .. })
        ));
        assert!(platform.create_window(800, 600, "x").is_ok());
        assert_eq!(platform.window(), Some((800, 600)));
    }

    #[test]
    fn test_missing_resource_fails() {
        let mut platform = HeadlessPlatform::new().with_missing_resource("img/a.jpg");
        assert!(platform.load_texture("img/a.jpg").is_err());
        let first = platform.load_texture("img/b.jpg").unwrap();
        let again = platform.load_texture("img/b.jpg").unwrap();
        assert_eq!(first, again);
        assert_eq!(platform.loaded_resources(), 1);
    }

    #[test]
    fn test_frame_draw_counts_roll_over() {
        let mut platform = HeadlessPlatform::new();
        platform.clear();
        platform.draw_background(TextureHandle(1), 800, 600);
        platform.draw_text("hi", Vec2::ZERO);
        platform.present_frame();
        assert_eq!(platform.draws_last_frame(), 1);
        assert_eq!(platform.text_last_frame(), ["hi".to_string()]);
    }
}
