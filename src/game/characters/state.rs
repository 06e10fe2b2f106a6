// Character state machine
//
// States are a tagged union; transitions are pure functions that return the
// next state plus an explicit list of side effects (velocity writes,
// impulses, damping changes). Nothing in here touches the physics world
// directly, which keeps the whole table testable without a simulation.

use std::mem;

use crate::core::math::approx_equal;

use super::animation::AnimKey;

/// Horizontal speed below which a knocked-back fighter regains control
pub const KNOCKBACK_EXIT_EPSILON: f32 = 0.1;

/// Which way a fighter is looking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// Sign of the horizontal axis in this direction
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

/// Current node of the character state machine.
///
/// Exactly one state is active at a time; transitions are atomic from the
/// simulation's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    /// Standing still on ground
    Standing,
    /// Moving horizontally on ground
    Walking(Facing),
    /// In the air, moving upward
    Jumping,
    /// In the air, moving downward
    Falling,
    /// Swinging; `already_hit` latches after the swing connects so one
    /// attack never lands twice
    Attacking { already_hit: bool },
    /// Blocking; halves incoming damage, prevents stagger
    Guarding,
    /// Staggered by a hit; input is ignored until the impulse decays
    KnockedBack,
}

impl ActionState {
    /// Check if normal movement input is honored in this state
    pub fn can_move(&self) -> bool {
        !matches!(
            self,
            Self::Guarding | Self::KnockedBack | Self::Attacking { .. }
        )
    }

    pub fn is_attacking(&self) -> bool {
        matches!(self, Self::Attacking { .. })
    }

    pub fn is_guarding(&self) -> bool {
        matches!(self, Self::Guarding)
    }

    /// Animation to display for this state. Knockback has no dedicated
    /// clip and freezes on the stand pose.
    pub fn anim_key(&self) -> AnimKey {
        match self {
            Self::Standing | Self::KnockedBack => AnimKey::Stand,
            Self::Walking(_) => AnimKey::Walk,
            Self::Jumping => AnimKey::Jump,
            Self::Falling => AnimKey::Fall,
            Self::Attacking { .. } => AnimKey::Attack,
            Self::Guarding => AnimKey::Guard,
        }
    }
}

impl Default for ActionState {
    fn default() -> Self {
        Self::Standing
    }
}

/// A transition request or external stimulus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionEvent {
    Move(Facing),
    Jump,
    Attack,
    Guard,
    Stand,
    /// An unguarded hit landed on this character (always legal)
    Struck { knockback: Facing },
}

/// Side effect requested by a transition, applied to the body by the owner
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    SetHorizontalVelocity(f32),
    SetVerticalVelocity(f32),
    ZeroVelocity,
    /// Fixed-magnitude shove away from the attacker
    Knockback(Facing),
    SetLinearDamping(f32),
    ConsumeJump,
    ResetJumps,
    Face(Facing),
}

/// Snapshot of everything a transition is allowed to consult
#[derive(Debug, Clone, Copy)]
pub struct TransitionCtx {
    pub grounded: bool,
    pub jumps_used: u8,
    pub max_jumps: u8,
    pub move_speed: f32,
    pub jump_force: f32,
    pub linear_damping: f32,
    pub knockback_damping: f32,
}

/// Per-tick snapshot for the passive update rule
#[derive(Debug, Clone, Copy)]
pub struct TickCtx {
    pub grounded: bool,
    pub vx: f32,
    pub vy: f32,
    /// Move request received since the last tick, if any
    pub walk_input: Option<Facing>,
    /// Guard was re-asserted since the last tick
    pub guard_held: bool,
    /// The attack animation has played out
    pub attack_finished: bool,
    /// The attack animation is currently inside its hit window
    pub in_hit_window: bool,
    pub linear_damping: f32,
}

/// Result of a transition: the next state and its side effects.
///
/// Illegal requests return the unchanged state with no effects; they are
/// policy no-ops, not errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: ActionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(state: ActionState) -> Self {
        Self {
            next: state,
            effects: Vec::new(),
        }
    }

    fn to(next: ActionState, effects: Vec<Effect>) -> Self {
        Self { next, effects }
    }
}

/// The transition table. Pure: same inputs, same outputs.
pub fn transition(state: ActionState, event: ActionEvent, ctx: &TransitionCtx) -> Transition {
    use ActionState::*;

    match event {
        ActionEvent::Move(dir) => match state {
            Guarding | KnockedBack => Transition::stay(state),
            // Grounded attacks root the fighter; airborne ones allow drift
            Attacking { .. } if ctx.grounded => Transition::stay(state),
            Attacking { .. } => Transition::to(
                state,
                vec![Effect::SetHorizontalVelocity(dir.sign() * ctx.move_speed)],
            ),
            Jumping | Falling => Transition::to(
                state,
                vec![
                    Effect::Face(dir),
                    Effect::SetHorizontalVelocity(dir.sign() * ctx.move_speed),
                ],
            ),
            Standing | Walking(_) => Transition::to(
                Walking(dir),
                vec![
                    Effect::Face(dir),
                    Effect::SetHorizontalVelocity(dir.sign() * ctx.move_speed),
                ],
            ),
        },

        ActionEvent::Jump => match state {
            Guarding | KnockedBack | Attacking { .. } => Transition::stay(state),
            _ if ctx.grounded || ctx.jumps_used < ctx.max_jumps => Transition::to(
                Jumping,
                vec![
                    Effect::ConsumeJump,
                    Effect::SetVerticalVelocity(ctx.jump_force),
                ],
            ),
            // Airborne with jumps exhausted
            _ => Transition::stay(state),
        },

        ActionEvent::Attack => match state {
            Guarding | KnockedBack | Attacking { .. } => Transition::stay(state),
            _ => {
                let effects = if ctx.grounded {
                    vec![Effect::SetHorizontalVelocity(0.0)]
                } else {
                    Vec::new()
                };
                Transition::to(Attacking { already_hit: false }, effects)
            }
        },

        ActionEvent::Guard => match state {
            Standing | Walking(_) if ctx.grounded => {
                Transition::to(Guarding, vec![Effect::SetHorizontalVelocity(0.0)])
            }
            // Can't guard while airborne, attacking or staggered
            _ => Transition::stay(state),
        },

        ActionEvent::Stand => match state {
            Standing | Walking(_) | Guarding => {
                let effects = if ctx.grounded {
                    vec![Effect::SetHorizontalVelocity(0.0)]
                } else {
                    Vec::new()
                };
                Transition::to(Standing, effects)
            }
            _ => Transition::stay(state),
        },

        ActionEvent::Struck { knockback } => match state {
            // A guarded hit deals reduced damage but does not stagger
            Guarding => Transition::stay(state),
            // Already staggered: the shove stacks, velocity is not re-zeroed
            KnockedBack => Transition::to(KnockedBack, vec![Effect::Knockback(knockback)]),
            _ => Transition::to(
                KnockedBack,
                vec![
                    Effect::ZeroVelocity,
                    Effect::Knockback(knockback),
                    Effect::SetLinearDamping(ctx.knockback_damping),
                ],
            ),
        },
    }
}

/// Holds the active state and the time spent in it.
#[derive(Debug)]
pub struct StateMachine {
    state: ActionState,
    state_time: f32,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: ActionState::Standing,
            state_time: 0.0,
        }
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    /// Elapsed time since the current state was entered; drives animation
    /// frame lookup and timed transitions
    pub fn state_time(&self) -> f32 {
        self.state_time
    }

    /// Feed an event through the transition table and adopt the result.
    /// Returns the effects for the caller to apply.
    pub fn handle(&mut self, event: ActionEvent, ctx: &TransitionCtx) -> Vec<Effect> {
        let outcome = transition(self.state, event, ctx);
        self.adopt(outcome.next);
        outcome.effects
    }

    /// Latch the per-swing hit flag after an attack connects
    pub fn mark_attack_hit(&mut self) {
        if let ActionState::Attacking { ref mut already_hit } = self.state {
            *already_hit = true;
        }
    }

    /// Passive per-tick update: advances state time and runs the automatic
    /// transitions (airborne checks, landing, swing completion, knockback
    /// decay). Input-driven transitions have already been processed this
    /// tick, so a `Struck` arriving alongside a `jump()` has won by now.
    pub fn tick(&mut self, dt: f32, ctx: &TickCtx) -> Vec<Effect> {
        self.state_time += dt;

        let mut effects = Vec::new();

        match self.state {
            ActionState::Standing => {
                if !ctx.grounded {
                    self.adopt(ActionState::Falling);
                } else if ctx.walk_input.is_none() {
                    // Hold position unless a move request came in this tick
                    effects.push(Effect::SetHorizontalVelocity(0.0));
                }
            }

            ActionState::Walking(_) => {
                if !ctx.grounded {
                    // Walked off a ledge
                    self.adopt(ActionState::Falling);
                } else if ctx.walk_input.is_none() {
                    self.adopt(ActionState::Standing);
                    effects.push(Effect::SetHorizontalVelocity(0.0));
                }
            }

            ActionState::Jumping => {
                if ctx.grounded && ctx.vy <= 0.0 {
                    self.adopt(ActionState::Standing);
                    effects.push(Effect::ResetJumps);
                } else if ctx.vy <= 0.0 {
                    // Past the apex
                    self.adopt(ActionState::Falling);
                }
            }

            ActionState::Falling => {
                if ctx.grounded && ctx.vy <= 0.0 {
                    self.adopt(ActionState::Standing);
                    effects.push(Effect::ResetJumps);
                }
            }

            ActionState::Attacking { already_hit } => {
                if ctx.attack_finished {
                    self.adopt(ActionState::Standing);
                } else {
                    if ctx.grounded {
                        effects.push(Effect::SetHorizontalVelocity(0.0));
                    }
                    if already_hit && !ctx.in_hit_window {
                        // Window exited: arm the next swing without
                        // resetting state time
                        self.state = ActionState::Attacking { already_hit: false };
                    }
                }
            }

            ActionState::Guarding => {
                if !ctx.guard_held {
                    self.adopt(ActionState::Standing);
                }
            }

            ActionState::KnockedBack => {
                if ctx.grounded && approx_equal(ctx.vx, 0.0, KNOCKBACK_EXIT_EPSILON) {
                    self.adopt(ActionState::Standing);
                    effects.push(Effect::SetLinearDamping(ctx.linear_damping));
                    effects.push(Effect::ResetJumps);
                }
            }
        }

        effects
    }

    /// Change state, resetting state time only when the state actually
    /// changes. Re-entering the active state keeps the clock running so
    /// looping animations don't pop.
    fn adopt(&mut self, next: ActionState) {
        if mem::discriminant(&self.state) != mem::discriminant(&next) {
            self.state_time = 0.0;
        }
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TransitionCtx {
        TransitionCtx {
            grounded: true,
            jumps_used: 0,
            max_jumps: 2,
            move_speed: 2.0,
            jump_force: 7.0,
            linear_damping: 2.0,
            knockback_damping: 8.0,
        }
    }

    fn tick_ctx() -> TickCtx {
        TickCtx {
            grounded: true,
            vx: 0.0,
            vy: 0.0,
            walk_input: None,
            guard_held: false,
            attack_finished: false,
            in_hit_window: false,
            linear_damping: 2.0,
        }
    }

    #[test]
    fn test_move_from_standing() {
        let out = transition(ActionState::Standing, ActionEvent::Move(Facing::Right), &ctx());
        assert_eq!(out.next, ActionState::Walking(Facing::Right));
        assert!(out.effects.contains(&Effect::SetHorizontalVelocity(2.0)));
        assert!(out.effects.contains(&Effect::Face(Facing::Right)));
    }

    #[test]
    fn test_move_rejected_while_guarding_and_knocked_back() {
        for state in [ActionState::Guarding, ActionState::KnockedBack] {
            let out = transition(state, ActionEvent::Move(Facing::Left), &ctx());
            assert_eq!(out.next, state);
            assert!(out.effects.is_empty());
        }
    }

    #[test]
    fn test_move_rejected_during_grounded_attack() {
        let state = ActionState::Attacking { already_hit: false };
        let out = transition(state, ActionEvent::Move(Facing::Left), &ctx());
        assert_eq!(out.next, state);
        assert!(out.effects.is_empty());
    }

    #[test]
    fn test_move_allowed_during_air_attack() {
        let mut c = ctx();
        c.grounded = false;
        let state = ActionState::Attacking { already_hit: false };
        let out = transition(state, ActionEvent::Move(Facing::Left), &c);
        assert_eq!(out.next, state);
        assert!(out.effects.contains(&Effect::SetHorizontalVelocity(-2.0)));
        // Attacking locks facing
        assert!(!out.effects.contains(&Effect::Face(Facing::Left)));
    }

    #[test]
    fn test_jump_from_ground() {
        let out = transition(ActionState::Standing, ActionEvent::Jump, &ctx());
        assert_eq!(out.next, ActionState::Jumping);
        assert!(out.effects.contains(&Effect::ConsumeJump));
        assert!(out.effects.contains(&Effect::SetVerticalVelocity(7.0)));
    }

    #[test]
    fn test_air_jump_until_exhausted() {
        let mut c = ctx();
        c.grounded = false;
        c.jumps_used = 1;
        let out = transition(ActionState::Falling, ActionEvent::Jump, &c);
        assert_eq!(out.next, ActionState::Jumping);

        c.jumps_used = 2;
        let out = transition(ActionState::Falling, ActionEvent::Jump, &c);
        assert_eq!(out.next, ActionState::Falling);
        assert!(out.effects.is_empty());
    }

    #[test]
    fn test_attack_zeroes_velocity_on_ground_only() {
        let out = transition(ActionState::Standing, ActionEvent::Attack, &ctx());
        assert_eq!(out.next, ActionState::Attacking { already_hit: false });
        assert!(out.effects.contains(&Effect::SetHorizontalVelocity(0.0)));

        let mut c = ctx();
        c.grounded = false;
        let out = transition(ActionState::Falling, ActionEvent::Attack, &c);
        assert_eq!(out.next, ActionState::Attacking { already_hit: false });
        assert!(out.effects.is_empty());
    }

    #[test]
    fn test_attack_rejected_while_knocked_back() {
        let out = transition(ActionState::KnockedBack, ActionEvent::Attack, &ctx());
        assert_eq!(out.next, ActionState::KnockedBack);
    }

    #[test]
    fn test_guard_needs_ground() {
        let mut c = ctx();
        c.grounded = false;
        let out = transition(ActionState::Falling, ActionEvent::Guard, &c);
        assert_eq!(out.next, ActionState::Falling);

        let out = transition(ActionState::Standing, ActionEvent::Guard, &ctx());
        assert_eq!(out.next, ActionState::Guarding);
    }

    #[test]
    fn test_guard_rejected_while_attacking() {
        let state = ActionState::Attacking { already_hit: false };
        let out = transition(state, ActionEvent::Guard, &ctx());
        assert_eq!(out.next, state);
    }

    #[test]
    fn test_struck_always_wins_unless_guarding() {
        for state in [
            ActionState::Standing,
            ActionState::Walking(Facing::Left),
            ActionState::Jumping,
            ActionState::Attacking { already_hit: false },
        ] {
            let out = transition(
                state,
                ActionEvent::Struck {
                    knockback: Facing::Right,
                },
                &ctx(),
            );
            assert_eq!(out.next, ActionState::KnockedBack);
            assert!(out.effects.contains(&Effect::ZeroVelocity));
            assert!(out.effects.contains(&Effect::Knockback(Facing::Right)));
        }

        let out = transition(
            ActionState::Guarding,
            ActionEvent::Struck {
                knockback: Facing::Right,
            },
            &ctx(),
        );
        assert_eq!(out.next, ActionState::Guarding);
        assert!(out.effects.is_empty());
    }

    #[test]
    fn test_stand_is_idempotent_on_state_time() {
        let mut sm = StateMachine::new();
        sm.tick(0.5, &tick_ctx());
        assert!(sm.state_time() > 0.4);

        // Re-requesting Standing must not reset the clock
        sm.handle(ActionEvent::Stand, &ctx());
        assert!(sm.state_time() > 0.4);

        // A real transition does reset it
        sm.handle(ActionEvent::Move(Facing::Left), &ctx());
        assert_eq!(sm.state_time(), 0.0);
    }

    #[test]
    fn test_standing_falls_when_airborne() {
        let mut sm = StateMachine::new();
        let mut tc = tick_ctx();
        tc.grounded = false;
        sm.tick(0.016, &tc);
        assert_eq!(sm.state(), ActionState::Falling);
    }

    #[test]
    fn test_jump_apex_becomes_falling() {
        let mut sm = StateMachine::new();
        sm.handle(ActionEvent::Jump, &ctx());
        assert_eq!(sm.state(), ActionState::Jumping);

        let mut tc = tick_ctx();
        tc.grounded = false;
        tc.vy = -0.5;
        sm.tick(0.016, &tc);
        assert_eq!(sm.state(), ActionState::Falling);
    }

    #[test]
    fn test_landing_resets_jumps() {
        let mut sm = StateMachine::new();
        let mut tc = tick_ctx();
        tc.grounded = false;
        tc.vy = -1.0;
        sm.tick(0.016, &tc);
        assert_eq!(sm.state(), ActionState::Falling);

        tc.grounded = true;
        let effects = sm.tick(0.016, &tc);
        assert_eq!(sm.state(), ActionState::Standing);
        assert!(effects.contains(&Effect::ResetJumps));
    }

    #[test]
    fn test_walking_stops_without_input() {
        let mut sm = StateMachine::new();
        sm.handle(ActionEvent::Move(Facing::Right), &ctx());
        assert_eq!(sm.state(), ActionState::Walking(Facing::Right));

        let mut tc = tick_ctx();
        tc.walk_input = Some(Facing::Right);
        sm.tick(0.016, &tc);
        assert_eq!(sm.state(), ActionState::Walking(Facing::Right));

        tc.walk_input = None;
        let effects = sm.tick(0.016, &tc);
        assert_eq!(sm.state(), ActionState::Standing);
        assert!(effects.contains(&Effect::SetHorizontalVelocity(0.0)));
    }

    #[test]
    fn test_attack_finishes_to_standing() {
        let mut sm = StateMachine::new();
        sm.handle(ActionEvent::Attack, &ctx());

        let mut tc = tick_ctx();
        tc.attack_finished = true;
        sm.tick(0.016, &tc);
        assert_eq!(sm.state(), ActionState::Standing);
    }

    #[test]
    fn test_hit_flag_resets_outside_window() {
        let mut sm = StateMachine::new();
        sm.handle(ActionEvent::Attack, &ctx());
        sm.mark_attack_hit();
        assert_eq!(sm.state(), ActionState::Attacking { already_hit: true });

        let mut tc = tick_ctx();
        tc.in_hit_window = true;
        sm.tick(0.016, &tc);
        assert_eq!(sm.state(), ActionState::Attacking { already_hit: true });

        let before = sm.state_time();
        tc.in_hit_window = false;
        sm.tick(0.016, &tc);
        assert_eq!(sm.state(), ActionState::Attacking { already_hit: false });
        // Arming the next swing must not reset the clock
        assert!(sm.state_time() > before);
    }

    #[test]
    fn test_guard_released_returns_to_standing() {
        let mut sm = StateMachine::new();
        sm.handle(ActionEvent::Guard, &ctx());
        assert_eq!(sm.state(), ActionState::Guarding);

        let mut tc = tick_ctx();
        tc.guard_held = true;
        sm.tick(0.016, &tc);
        assert_eq!(sm.state(), ActionState::Guarding);

        tc.guard_held = false;
        sm.tick(0.016, &tc);
        assert_eq!(sm.state(), ActionState::Standing);
    }

    #[test]
    fn test_knockback_decays_to_standing() {
        let mut sm = StateMachine::new();
        sm.handle(
            ActionEvent::Struck {
                knockback: Facing::Right,
            },
            &ctx(),
        );
        assert_eq!(sm.state(), ActionState::KnockedBack);

        let mut tc = tick_ctx();
        tc.vx = 1.5;
        sm.tick(0.016, &tc);
        assert_eq!(sm.state(), ActionState::KnockedBack);

        tc.vx = 0.05;
        let effects = sm.tick(0.016, &tc);
        assert_eq!(sm.state(), ActionState::Standing);
        assert!(effects.contains(&Effect::SetLinearDamping(2.0)));
    }

    #[test]
    fn test_facing_helpers() {
        assert_eq!(Facing::Left.sign(), -1.0);
        assert_eq!(Facing::Right.sign(), 1.0);
        assert_eq!(Facing::Left.opposite(), Facing::Right);
    }
}
