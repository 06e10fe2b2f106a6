// Character module: profiles, state machine, animation timing and the
// fighter entity that ties them to a physics body.

pub mod animation;
pub mod character;
pub mod profile;
pub mod state;

pub use animation::{AnimKey, AnimationClip, AnimationFrame, AnimationSet, PlayMode};
pub use character::{Fighter, FighterRoster};
pub use profile::{profiles, CharacterProfile};
pub use state::{ActionEvent, ActionState, Effect, Facing};

use thiserror::Error;

/// Stable identifier for a fighter, also embedded in its fixture tags
pub type FighterId = u32;

#[derive(Debug, Error)]
pub enum CharacterError {
    /// The animation table is missing a required (slot, facing) clip
    #[error("missing animation clip for {key:?} facing {facing:?}")]
    MissingAnimation { key: AnimKey, facing: Facing },
}
