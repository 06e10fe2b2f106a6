use rapier2d::prelude::*;

use super::collision::{CollisionLayer, FixtureTag};

pub use rapier2d::prelude::{ColliderHandle, RigidBodyHandle};

/// Builder for creating rigid bodies with common configurations
pub struct BodyBuilder {
    body_type: RigidBodyType,
    position: Isometry<Real>,
    linear_damping: Real,
    gravity_scale: Real,
    can_sleep: bool,
    locked_axes: LockedAxes,
}

impl BodyBuilder {
    /// Create a new dynamic body (affected by forces and collisions)
    pub fn new_dynamic() -> Self {
        Self {
            body_type: RigidBodyType::Dynamic,
            position: Isometry::identity(),
            linear_damping: 0.0,
            gravity_scale: 1.0,
            can_sleep: true,
            locked_axes: LockedAxes::empty(),
        }
    }

    /// Create a new fixed (static) body (completely immovable)
    pub fn new_fixed() -> Self {
        Self {
            body_type: RigidBodyType::Fixed,
            position: Isometry::identity(),
            linear_damping: 0.0,
            gravity_scale: 0.0,
            can_sleep: false,
            locked_axes: LockedAxes::empty(),
        }
    }

    /// Set the initial position of the body
    pub fn position(mut self, x: Real, y: Real) -> Self {
        self.position = Isometry::translation(x, y);
        self
    }

    /// Set the linear damping (air/ground drag)
    pub fn linear_damping(mut self, damping: Real) -> Self {
        self.linear_damping = damping;
        self
    }

    /// Set the gravity scale (1.0 = normal gravity, 0.0 = no gravity)
    pub fn gravity_scale(mut self, scale: Real) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// Set whether the body can sleep when inactive
    pub fn can_sleep(mut self, can_sleep: bool) -> Self {
        self.can_sleep = can_sleep;
        self
    }

    /// Lock rotation (characters stay upright)
    pub fn lock_rotation(mut self) -> Self {
        self.locked_axes = LockedAxes::ROTATION_LOCKED;
        self
    }

    /// Build the rigid body
    pub fn build(self) -> RigidBody {
        RigidBodyBuilder::new(self.body_type)
            .position(self.position)
            .linear_damping(self.linear_damping)
            .gravity_scale(self.gravity_scale)
            .can_sleep(self.can_sleep)
            .locked_axes(self.locked_axes)
            .build()
    }
}

/// Builder for creating colliders with common configurations
pub struct FixtureBuilder {
    shape: SharedShape,
    offset: Vector<Real>,
    layer: CollisionLayer,
    tag: FixtureTag,
    is_sensor: bool,
    friction: Real,
    restitution: Real,
    density: Real,
}

impl FixtureBuilder {
    /// Create a box-shaped fixture
    pub fn box_shape(half_width: Real, half_height: Real) -> Self {
        Self {
            shape: SharedShape::cuboid(half_width, half_height),
            offset: Vector::zeros(),
            layer: CollisionLayer::Default,
            tag: FixtureTag::None,
            is_sensor: false,
            friction: 0.5,
            restitution: 0.0,
            density: 1.0,
        }
    }

    /// Offset the fixture from the body origin
    pub fn offset(mut self, x: Real, y: Real) -> Self {
        self.offset = vector![x, y];
        self
    }

    /// Set the collision layer for filtering
    pub fn layer(mut self, layer: CollisionLayer) -> Self {
        self.layer = layer;
        self
    }

    /// Attach gameplay metadata to the fixture
    pub fn tag(mut self, tag: FixtureTag) -> Self {
        self.tag = tag;
        self
    }

    /// Make this a sensor (detects contact but doesn't cause physical response)
    pub fn sensor(mut self, is_sensor: bool) -> Self {
        self.is_sensor = is_sensor;
        self
    }

    /// Set friction coefficient (0.0 = no friction, 1.0 = high friction)
    pub fn friction(mut self, friction: Real) -> Self {
        self.friction = friction;
        self
    }

    /// Set restitution/bounciness (0.0 = no bounce, 1.0 = perfect bounce)
    pub fn restitution(mut self, restitution: Real) -> Self {
        self.restitution = restitution;
        self
    }

    /// Set density (mass is calculated from shape area)
    pub fn density(mut self, density: Real) -> Self {
        self.density = density;
        self
    }

    /// Build the collider
    pub fn build(self) -> Collider {
        ColliderBuilder::new(self.shape)
            .translation(self.offset)
            .collision_groups(self.layer.to_interaction_groups())
            .sensor(self.is_sensor)
            .friction(self.friction)
            .restitution(self.restitution)
            .density(self.density)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .user_data(self.tag.encode())
            .build()
    }
}

/// Common body/fixture configurations for match objects
pub mod presets {
    use super::*;
    use crate::game::characters::{CharacterProfile, FighterId};

    /// Create a fighter body (dynamic, rotation locked, profile damping)
    pub fn fighter_body(profile: &CharacterProfile, x: Real, y: Real) -> RigidBody {
        BodyBuilder::new_dynamic()
            .position(x, y)
            .lock_rotation()
            .linear_damping(profile.linear_damping)
            .can_sleep(false) // fighters should never sleep
            .build()
    }

    /// Create a fighter's solid hull fixture (box, tagged with the owner id)
    pub fn fighter_hull(profile: &CharacterProfile, id: FighterId) -> Collider {
        FixtureBuilder::box_shape(profile.width / 2.0, profile.height / 2.0)
            .layer(CollisionLayer::Fighter)
            .tag(FixtureTag::Hull(id))
            .friction(profile.friction)
            .restitution(profile.restitution)
            .density(profile.density)
            .build()
    }

    /// Create a fighter's foot sensor: a thin non-colliding box under the
    /// hull whose contacts drive the grounded check
    pub fn foot_sensor(profile: &CharacterProfile, id: FighterId) -> Collider {
        FixtureBuilder::box_shape(profile.width / 2.1, 0.03)
            .offset(0.0, -profile.height / 2.0)
            .layer(CollisionLayer::Sensor)
            .tag(FixtureTag::FootSensor(id))
            .sensor(true)
            .density(1.0)
            .build()
    }

    /// Create a static terrain slab (ground or platform), centered at (x, y)
    pub fn terrain_collider(x: Real, y: Real, width: Real, height: Real) -> Collider {
        FixtureBuilder::box_shape(width / 2.0, height / 2.0)
            .offset(x, y)
            .layer(CollisionLayer::Terrain)
            .tag(FixtureTag::Terrain)
            .friction(0.3)
            .build()
    }
}
