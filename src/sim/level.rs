//! Block wall layout
//!
//! Each level gets its own deterministic wall: the RNG is seeded from the game
//! seed mixed with the level number, so the same `(seed, level)` always builds
//! the same wall.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::entity::{Entity, Look};
use super::registry::EntityRegistry;
use crate::consts::*;
use crate::error::GameError;

/// Rows in the wall for a level (1-based)
pub fn rows_for_level(level: u32) -> u32 {
    3u32.saturating_add(level).min(BLOCK_MAX_ROWS)
}

/// Percent chance a block needs two hits
pub fn tough_chance(level: u32) -> u32 {
    level.saturating_sub(1).saturating_mul(10).min(50)
}

/// One block slot in the wall
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSlot {
    pub key: String,
    pub center: Vec2,
    pub durability: u8,
    pub points: u32,
}

fn level_seed(seed: u64, level: u32) -> u64 {
    seed ^ u64::from(level).wrapping_mul(2_654_435_761)
}

/// Lay out the wall for `level`, centred horizontally in a `width`-wide area
pub fn layout(seed: u64, level: u32, width: u32) -> Vec<BlockSlot> {
    let mut rng = Pcg32::seed_from_u64(level_seed(seed, level));
    let rows = rows_for_level(level);
    let chance = tough_chance(level);

    let pitch = Vec2::new(BLOCK_WIDTH + BLOCK_GAP, BLOCK_HEIGHT + BLOCK_GAP);
    let wall_width = BLOCK_COLUMNS as f32 * pitch.x - BLOCK_GAP;
    let left = ((width as f32 - wall_width) / 2.0).max(0.0);

    let mut blocks = Vec::with_capacity((rows * BLOCK_COLUMNS) as usize);
    for row in 0..rows {
        for col in 0..BLOCK_COLUMNS {
            let durability = if rng.random_range(0..100) < chance { 2 } else { 1 };
            let center = Vec2::new(
                left + col as f32 * pitch.x + BLOCK_WIDTH / 2.0,
                BLOCK_TOP + row as f32 * pitch.y + BLOCK_HEIGHT / 2.0,
            );
            blocks.push(BlockSlot {
                key: format!("block-{}-{}", row, col),
                center,
                durability,
                points: BLOCK_POINTS * u32::from(durability),
            });
        }
    }

    log::debug!(
        "Level {} wall: {} rows, {} blocks, {}% tough",
        level,
        rows,
        blocks.len(),
        chance
    );
    blocks
}

/// Build the wall for `level` into the registry. Returns the number of blocks.
pub fn spawn_wall(
    registry: &mut EntityRegistry,
    seed: u64,
    level: u32,
    width: u32,
    look: Look,
) -> Result<usize, GameError> {
    let slots = layout(seed, level, width);
    let count = slots.len();
    for slot in slots {
        registry.add(Entity::block(
            &slot.key,
            slot.center,
            slot.durability,
            slot.points,
            look,
        ))?;
    }
    Ok(count)
}
