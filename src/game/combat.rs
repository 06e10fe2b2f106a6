// Combat resolution
//
// Attacks are ray casts, not contact tests: during the hit window of a
// swing the attacker casts a short horizontal ray out of its facing edge
// and the first enemy hull it crosses takes the hit.

use log::{debug, info};
use rapier2d::prelude::{Collider, QueryFilter};

use crate::core::math::clamp;
use crate::engine::physics::{FixtureTag, PhysicsWorld, Real, Vector};
use crate::game::characters::{Facing, Fighter, FighterId, FighterRoster};

/// Seconds after a registered hit during which further hits are ignored
pub const INVULN_DURATION: f32 = 0.5;

/// Horizontal knockback impulse magnitude
pub const KNOCKBACK_IMPULSE_X: f32 = 0.15;
/// Vertical knockback impulse (always upward)
pub const KNOCKBACK_IMPULSE_Y: f32 = 0.25;

/// How far inside the hull edge attack rays start, so a target already
/// overlapping the attacker cannot be skipped over
pub const ATTACK_RAY_INSET: f32 = 0.1;

/// One attack ray requested by a fighter mid-swing
#[derive(Debug, Clone, Copy)]
pub struct AttackRay {
    pub attacker: FighterId,
    pub origin: Vector<Real>,
    pub dir: Vector<Real>,
    pub max_toi: Real,
    pub damage: i32,
    /// Direction the target gets shoved, away from the attacker
    pub knockback: Facing,
}

/// A hit that actually registered this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitEvent {
    pub attacker: FighterId,
    pub target: FighterId,
    /// Damage dealt after guard reduction
    pub damage: i32,
    pub blocked: bool,
}

/// Cast the pending attack rays and apply their hits.
///
/// A swing connects at most once: the first ray of a swing that finds a
/// hull latches the swing, even when the target then shrugs the hit off
/// through invulnerability.
pub fn resolve_attacks(
    rays: &[AttackRay],
    roster: &mut FighterRoster,
    physics: &mut PhysicsWorld,
) -> Vec<HitEvent> {
    let mut pending = Vec::new();

    for ray in rays {
        let Some(attacker) = roster.get(ray.attacker) else {
            continue;
        };
        let attacker_body = attacker.body_handle;

        // Only enemy hulls stop the ray; sensors, terrain and the
        // attacker's own fixtures are transparent to it
        let hulls_only = |_handle, collider: &Collider| {
            matches!(
                FixtureTag::decode(collider.user_data),
                FixtureTag::Hull(id) if id != ray.attacker
            )
        };
        let filter = QueryFilter::default()
            .exclude_rigid_body(attacker_body)
            .predicate(&hulls_only);

        if let Some((handle, toi)) = physics.cast_ray(ray.origin, ray.dir, ray.max_toi, true, filter)
        {
            if let FixtureTag::Hull(target) = physics.fixture_tag(handle) {
                debug!(
                    "attack ray from #{} reached #{} at distance {:.3}",
                    ray.attacker, target, toi
                );
                pending.push((ray.attacker, target, ray.damage, ray.knockback));
            }
        }
    }

    let mut hits = Vec::new();
    for (attacker, target, damage, knockback) in pending {
        // The swing is spent on contact, whether or not damage registers
        if let Some(fighter) = roster.get_mut(attacker) {
            fighter.mark_attack_hit();
        }
        if let Some(fighter) = roster.get_mut(target) {
            if let Some(hit) = apply_damage(fighter, physics, damage, knockback) {
                info!(
                    "#{} hit #{} for {}{}",
                    attacker,
                    target,
                    hit.damage,
                    if hit.blocked { " (blocked)" } else { "" }
                );
                hits.push(HitEvent {
                    attacker,
                    target,
                    damage: hit.damage,
                    blocked: hit.blocked,
                });
            }
        }
    }
    hits
}

/// Outcome of damage applied to one fighter
#[derive(Debug, Clone, Copy)]
pub struct DamageOutcome {
    pub damage: i32,
    pub blocked: bool,
}

/// Apply a hit to a fighter, honoring invulnerability and guard.
///
/// Returns `None` when the hit is ignored outright. A guarded hit deals
/// half damage (integer division) and causes no stagger; an unguarded hit
/// deals full damage and knocks the target back. Either way the
/// invulnerability window restarts.
pub fn apply_damage(
    fighter: &mut Fighter,
    physics: &mut PhysicsWorld,
    damage: i32,
    knockback: Facing,
) -> Option<DamageOutcome> {
    if fighter.is_defeated() {
        return None;
    }
    if fighter.time_since_last_hit() < INVULN_DURATION {
        return None;
    }

    let blocked = fighter.is_guarding();
    let dealt = if blocked { damage / 2 } else { damage };

    fighter.health = clamp(fighter.health - dealt, 0, fighter.profile.max_health);
    fighter.record_hit();
    if !blocked {
        fighter.strike(physics, knockback);
    }
    if fighter.is_defeated() {
        info!("#{} ({}) is defeated", fighter.id, fighter.profile.name);
    }

    Some(DamageOutcome {
        damage: dealt,
        blocked,
    })
}
