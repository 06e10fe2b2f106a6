// Character animation timing
//
// The renderer is an external collaborator; this module only decides which
// frame of which clip a character shows for a given state time. Frames are
// sampled from state time rather than accumulated, so animation and state
// machine can never drift apart.

use std::collections::HashMap;

use super::state::Facing;
use super::CharacterError;

/// Visual slot a clip belongs to. Resolved to actual atlas regions by the
/// excluded asset layer; the core only cares about timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimKey {
    Stand,
    Walk,
    Jump,
    Fall,
    Attack,
    Guard,
}

impl AnimKey {
    /// Every slot a character must provide a clip for
    pub const ALL: [AnimKey; 6] = [
        AnimKey::Stand,
        AnimKey::Walk,
        AnimKey::Jump,
        AnimKey::Fall,
        AnimKey::Attack,
        AnimKey::Guard,
    ];
}

/// Playback behavior when a clip runs out of frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    /// Wrap around forever
    Loop,
    /// Hold the last frame
    Once,
}

/// A single animation clip: an ordered run of frames at a fixed rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationClip {
    /// Number of frames in the clip
    pub frame_count: usize,
    /// Duration of each frame in seconds
    pub frame_duration: f32,
    /// Playback mode
    pub mode: PlayMode,
}

impl AnimationClip {
    /// Create a looping clip
    pub fn looping(frame_count: usize, frame_duration: f32) -> Self {
        Self {
            frame_count,
            frame_duration,
            mode: PlayMode::Loop,
        }
    }

    /// Create a one-shot clip (plays once, holds the last frame)
    pub fn once(frame_count: usize, frame_duration: f32) -> Self {
        Self {
            frame_count,
            frame_duration,
            mode: PlayMode::Once,
        }
    }

    /// Frame index shown at `state_time` seconds into the clip
    pub fn frame_at(&self, state_time: f32) -> usize {
        if self.frame_count == 0 {
            return 0;
        }
        let raw = (state_time / self.frame_duration) as usize;
        match self.mode {
            PlayMode::Loop => raw % self.frame_count,
            PlayMode::Once => raw.min(self.frame_count - 1),
        }
    }

    /// Whether a one-shot clip has played out at `state_time`. Looping
    /// clips never finish.
    pub fn finished(&self, state_time: f32) -> bool {
        self.mode == PlayMode::Once && state_time >= self.duration()
    }

    /// Total duration of one pass through the clip
    pub fn duration(&self) -> f32 {
        self.frame_count as f32 * self.frame_duration
    }
}

/// The full animation table for one character: one clip per
/// (slot, facing) combination.
#[derive(Debug, Clone, Default)]
pub struct AnimationSet {
    clips: HashMap<(AnimKey, Facing), AnimationClip>,
}

impl AnimationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip for one slot and facing
    pub fn insert(&mut self, key: AnimKey, facing: Facing, clip: AnimationClip) {
        self.clips.insert((key, facing), clip);
    }

    /// Register the same clip for both facings (mirrored sprite sheets)
    pub fn insert_mirrored(&mut self, key: AnimKey, clip: AnimationClip) {
        self.insert(key, Facing::Left, clip);
        self.insert(key, Facing::Right, clip);
    }

    pub fn get(&self, key: AnimKey, facing: Facing) -> Option<&AnimationClip> {
        self.clips.get(&(key, facing))
    }

    /// Verify every required (slot, facing) combination is present.
    /// A hole here is fatal at construction time, never recovered.
    pub fn validate(&self) -> Result<(), CharacterError> {
        for key in AnimKey::ALL {
            for facing in [Facing::Left, Facing::Right] {
                if !self.clips.contains_key(&(key, facing)) {
                    return Err(CharacterError::MissingAnimation { key, facing });
                }
            }
        }
        Ok(())
    }
}

/// Frame a character is currently showing, for the render layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFrame {
    pub key: AnimKey,
    pub facing: Facing,
    pub frame_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_wraps() {
        let clip = AnimationClip::looping(4, 0.1);
        assert_eq!(clip.frame_at(0.0), 0);
        assert_eq!(clip.frame_at(0.15), 1);
        assert_eq!(clip.frame_at(0.35), 3);
        assert_eq!(clip.frame_at(0.45), 0); // wrapped
        assert!(!clip.finished(10.0));
    }

    #[test]
    fn test_once_holds_last_frame() {
        let clip = AnimationClip::once(3, 0.1);
        assert_eq!(clip.frame_at(0.25), 2);
        assert_eq!(clip.frame_at(5.0), 2);
        assert!(!clip.finished(0.25));
        assert!(clip.finished(0.3));
    }

    #[test]
    fn test_duration() {
        let clip = AnimationClip::once(10, 0.05);
        assert!((clip.duration() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_reports_missing_slot() {
        let mut set = AnimationSet::new();
        for key in AnimKey::ALL {
            set.insert_mirrored(key, AnimationClip::looping(4, 0.1));
        }
        assert!(set.validate().is_ok());

        let mut incomplete = set.clone();
        incomplete.clips.remove(&(AnimKey::Guard, Facing::Left));
        let err = incomplete.validate().unwrap_err();
        assert!(matches!(
            err,
            CharacterError::MissingAnimation {
                key: AnimKey::Guard,
                facing: Facing::Left,
            }
        ));
    }

    #[test]
    fn test_mirrored_insert_fills_both_facings() {
        let mut set = AnimationSet::new();
        set.insert_mirrored(AnimKey::Walk, AnimationClip::looping(6, 0.1));
        assert!(set.get(AnimKey::Walk, Facing::Left).is_some());
        assert!(set.get(AnimKey::Walk, Facing::Right).is_some());
    }
}
