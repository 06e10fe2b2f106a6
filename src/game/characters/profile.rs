// Character profiles
//
// Every archetype is the same batch of constants as data: stats, body
// constants, attack tuning and the animation table. Adding a character
// means adding a profile, not a type.

use std::ops::RangeInclusive;

use super::animation::{AnimKey, AnimationClip, AnimationSet};

/// Data-driven description of one character archetype
#[derive(Debug, Clone)]
pub struct CharacterProfile {
    /// Display name of the archetype
    pub name: &'static str,

    // Stats
    /// Starting and maximum health (> 0)
    pub max_health: i32,
    /// Damage dealt per landed hit
    pub attack_power: i32,
    /// Horizontal movement speed (units/second)
    pub move_speed: f32,
    /// Vertical velocity applied on jump
    pub jump_force: f32,
    /// Jumps allowed before touching ground again
    pub max_jumps: u8,

    // Body
    /// Hull width in world units
    pub width: f32,
    /// Hull height in world units
    pub height: f32,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    /// Baseline drag on the body
    pub linear_damping: f32,
    /// Drag while staggered, bleeds off the knockback shove
    pub knockback_damping: f32,

    // Combat
    /// How far an attack reaches, measured from the body center
    pub attack_range: f32,
    /// Attack-clip frame indices during which the swing can connect
    pub hit_window: RangeInclusive<usize>,

    /// One clip per (slot, facing); validated at construction
    pub animations: AnimationSet,
}

/// Built-in character archetypes
pub mod profiles {
    use super::*;

    const FRAME_DURATION: f32 = 0.1;

    fn standard_animations(attack_frames: usize) -> AnimationSet {
        let mut set = AnimationSet::new();
        set.insert_mirrored(AnimKey::Stand, AnimationClip::looping(4, FRAME_DURATION));
        set.insert_mirrored(AnimKey::Walk, AnimationClip::looping(6, FRAME_DURATION));
        set.insert_mirrored(AnimKey::Jump, AnimationClip::looping(4, FRAME_DURATION));
        set.insert_mirrored(AnimKey::Fall, AnimationClip::looping(4, FRAME_DURATION));
        set.insert_mirrored(
            AnimKey::Attack,
            AnimationClip::once(attack_frames, FRAME_DURATION / 2.0),
        );
        set.insert_mirrored(AnimKey::Guard, AnimationClip::looping(2, FRAME_DURATION));
        set
    }

    /// Heavy hitter: slow swing with a wide hit window late in the clip
    pub fn knight() -> CharacterProfile {
        CharacterProfile {
            name: "knight",
            max_health: 120,
            attack_power: 15,
            move_speed: 2.0,
            jump_force: 7.0,
            max_jumps: 2,
            width: 0.7,
            height: 1.1,
            density: 0.11,
            friction: 0.0,
            restitution: 0.0,
            linear_damping: 2.0,
            knockback_damping: 8.0,
            attack_range: 0.85,
            hit_window: 6..=9,
            animations: standard_animations(12),
        }
    }

    /// Light fighter: weak, quick jab that connects on a single frame
    pub fn rookie() -> CharacterProfile {
        CharacterProfile {
            name: "rookie",
            max_health: 100,
            attack_power: 5,
            move_speed: 2.0,
            jump_force: 9.0,
            max_jumps: 2,
            width: 0.5,
            height: 1.0,
            density: 0.11,
            friction: 0.0,
            restitution: 0.0,
            linear_damping: 2.0,
            knockback_damping: 8.0,
            attack_range: 0.70,
            hit_window: 3..=3,
            animations: standard_animations(6),
        }
    }
}
