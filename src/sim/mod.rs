//! Simulation module
//!
//! Entities and the rules that move them:
//! - Variant-dispatched entity behavior
//! - Insertion-ordered registry (stable update and collision order)
//! - Pairwise collision resolution with an event sink
//! - Seeded level layout
//! - No rendering or platform dependencies beyond the trait seams

pub mod collision;
pub mod entity;
pub mod level;
pub mod registry;

pub use collision::{Collider, aabb_overlap, resolve_all, resolve_pairs_from};
pub use entity::{
    Entity, EntityKind, GameEvent, HitTest, Look, PlayArea, Reaction, UpdateContext, hit_test,
    reaction,
};
pub use level::{BlockSlot, layout, rows_for_level, spawn_wall};
pub use registry::{EntityRegistry, Siblings};
