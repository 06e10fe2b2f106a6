use rapier2d::prelude::*;
use std::sync::{Arc, Mutex};

use crate::game::characters::FighterId;

/// Collision layers for filtering what can touch what.
///
/// Fighters never collide with each other (matches are decided by attacks,
/// not by body blocking), but everything stands on terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionLayer {
    /// Default layer - interacts with everything
    Default = 0b0000_0001,

    /// Fighter hulls
    Fighter = 0b0000_0010,

    /// Static terrain: ground and platforms
    Terrain = 0b0000_0100,

    /// Foot sensors and other trigger shapes
    Sensor = 0b0000_1000,
}

impl CollisionLayer {
    /// Convert to rapier2d's InteractionGroups
    pub fn to_interaction_groups(self) -> InteractionGroups {
        let memberships = Group::from_bits_truncate(self as u32);

        let filter = match self {
            // Hulls land on terrain but pass through other fighters
            CollisionLayer::Fighter => Group::from_bits_truncate(CollisionLayer::Terrain as u32),

            // Terrain carries fighters and their foot sensors
            CollisionLayer::Terrain => Group::from_bits_truncate(
                CollisionLayer::Fighter as u32
                    | CollisionLayer::Sensor as u32
                    | CollisionLayer::Default as u32,
            ),

            // Foot sensors report terrain contact; sensor-sensor contact is
            // possible when two fighters overlap feet (cross-stomp) and is
            // counted on both sides, see the contact handling in the roster
            CollisionLayer::Sensor => Group::from_bits_truncate(
                CollisionLayer::Terrain as u32 | CollisionLayer::Sensor as u32,
            ),

            CollisionLayer::Default => Group::ALL,
        };

        InteractionGroups::new(memberships, filter)
    }
}

/// Typed fixture metadata, encoded into rapier's `user_data` at creation.
///
/// Every collider carries one of these; contact and ray handlers pattern
/// match on the decoded tag instead of inspecting shapes or parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureTag {
    /// No gameplay meaning (untagged geometry)
    None,
    /// A fighter's solid collision hull
    Hull(FighterId),
    /// A fighter's non-colliding foot sensor
    FootSensor(FighterId),
    /// Static ground or platform
    Terrain,
}

const TAG_KIND_NONE: u128 = 0;
const TAG_KIND_HULL: u128 = 1;
const TAG_KIND_FOOT_SENSOR: u128 = 2;
const TAG_KIND_TERRAIN: u128 = 3;

impl FixtureTag {
    /// Pack into a collider's `user_data` field (kind in the high half,
    /// fighter id in the low half).
    pub fn encode(self) -> u128 {
        match self {
            FixtureTag::None => TAG_KIND_NONE << 64,
            FixtureTag::Hull(id) => (TAG_KIND_HULL << 64) | id as u128,
            FixtureTag::FootSensor(id) => (TAG_KIND_FOOT_SENSOR << 64) | id as u128,
            FixtureTag::Terrain => TAG_KIND_TERRAIN << 64,
        }
    }

    /// Decode from a collider's `user_data` field.
    pub fn decode(raw: u128) -> Self {
        let id = (raw & u64::MAX as u128) as u32;
        match raw >> 64 {
            TAG_KIND_HULL => FixtureTag::Hull(id),
            TAG_KIND_FOOT_SENSOR => FixtureTag::FootSensor(id),
            TAG_KIND_TERRAIN => FixtureTag::Terrain,
            _ => FixtureTag::None,
        }
    }

    /// The fighter this fixture belongs to, if any
    pub fn fighter(self) -> Option<FighterId> {
        match self {
            FixtureTag::Hull(id) | FixtureTag::FootSensor(id) => Some(id),
            _ => None,
        }
    }
}

/// Contact event surfaced to game logic after a physics step
#[derive(Debug, Clone, Copy)]
pub enum ContactEvent {
    /// Two colliders started touching
    Started {
        collider1: ColliderHandle,
        collider2: ColliderHandle,
    },

    /// Two colliders stopped touching
    Stopped {
        collider1: ColliderHandle,
        collider2: ColliderHandle,
    },
}

/// Queue for storing contact events during a physics step.
///
/// Rapier invokes the event handler from inside `step`; events are collected
/// here and drained by the simulation once the step has completed.
pub struct ContactEventQueue {
    events: Arc<Mutex<Vec<ContactEvent>>>,
}

impl ContactEventQueue {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::with_capacity(32))),
        }
    }

    /// Clear all events (call at start of physics step)
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    /// Get all contact events from this frame
    pub fn events(&self) -> Vec<ContactEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn push(&self, event: ContactEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Default for ContactEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for ContactEventQueue {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: rapier2d::prelude::CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        match event {
            rapier2d::prelude::CollisionEvent::Started(h1, h2, _flags) => {
                self.push(ContactEvent::Started {
                    collider1: h1,
                    collider2: h2,
                });
            }
            rapier2d::prelude::CollisionEvent::Stopped(h1, h2, _flags) => {
                self.push(ContactEvent::Stopped {
                    collider1: h1,
                    collider2: h2,
                });
            }
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
        // Contact forces are not used by the combat model
    }
}
