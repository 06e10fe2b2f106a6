// Physics system using rapier2d

pub mod body;
mod collision;
mod world;

pub use body::{BodyBuilder, FixtureBuilder, RigidBodyHandle};
pub use collision::{CollisionLayer, ContactEvent, FixtureTag};
pub use world::PhysicsWorld;

// Re-export commonly used rapier types for convenience
#[allow(unused_imports)]
pub use rapier2d::prelude::{nalgebra, QueryFilter, Real, Vector};

#[allow(unused_imports)]
pub use body::ColliderHandle;
