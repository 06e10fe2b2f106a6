// Gameplay layer: fighters, combat and the arena that hosts a match

pub mod arena;
pub mod characters;
pub mod combat;
pub mod controller;

pub use arena::Arena;

/// Playable width of the standard stage, in world units
pub const WORLD_WIDTH: f32 = 10.0;

/// Height of the standard stage's side walls
pub const WORLD_HEIGHT: f32 = 6.0;
