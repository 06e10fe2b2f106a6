// Arena: one match worth of simulation
//
// Owns the physics world, the fighter roster and one controller per
// fighter, and drives the per-tick pipeline: commands, state machines,
// attack resolution, physics step, contact bookkeeping.

use std::collections::HashMap;

use glam::Vec2;

use crate::engine::game_loop::GameLoop;
use crate::engine::physics::{body::presets, PhysicsWorld};
use crate::game::characters::{CharacterError, CharacterProfile, FighterId, FighterRoster};
use crate::game::combat::{self, HitEvent};
use crate::game::controller::{Command, Controller};
use crate::game::{WORLD_HEIGHT, WORLD_WIDTH};

pub struct Arena {
    physics: PhysicsWorld,
    roster: FighterRoster,
    controllers: HashMap<FighterId, Box<dyn Controller>>,
    clock: GameLoop,
}

impl Arena {
    /// An empty arena with no geometry at all
    pub fn new() -> Self {
        Self {
            physics: PhysicsWorld::new(),
            roster: FighterRoster::new(),
            controllers: HashMap::new(),
            clock: GameLoop::new(),
        }
    }

    /// The standard stage: a floor whose top surface is at y = 0 and a
    /// wall just outside each side of the world
    pub fn with_standard_stage() -> Self {
        let mut arena = Self::new();
        arena.add_platform(0.0, -0.5, WORLD_WIDTH + 2.0, 1.0);
        arena.add_platform(-(WORLD_WIDTH / 2.0 + 0.5), WORLD_HEIGHT / 2.0, 1.0, WORLD_HEIGHT);
        arena.add_platform(WORLD_WIDTH / 2.0 + 0.5, WORLD_HEIGHT / 2.0, 1.0, WORLD_HEIGHT);
        arena
    }

    /// Add a static terrain slab centered at (x, y)
    pub fn add_platform(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.physics
            .add_free_collider(presets::terrain_collider(x, y, width, height));
    }

    /// Spawn a fighter under the given controller
    pub fn spawn_fighter(
        &mut self,
        profile: CharacterProfile,
        spawn: Vec2,
        controller: Box<dyn Controller>,
    ) -> Result<FighterId, CharacterError> {
        let id = self.roster.spawn(profile, &mut self.physics, spawn)?;
        self.controllers.insert(id, controller);
        Ok(id)
    }

    /// Advance the match by exactly one fixed timestep
    pub fn tick(&mut self) -> Vec<HitEvent> {
        let dt = self.physics.timestep();

        // Commands first, in spawn order
        let ids: Vec<FighterId> = self.roster.all().iter().map(|f| f.id).collect();
        for id in ids {
            let Some(controller) = self.controllers.get_mut(&id) else {
                continue;
            };
            let command = controller.next_command();
            let Some(fighter) = self.roster.get_mut(id) else {
                continue;
            };
            match command {
                Command::MoveLeft => fighter.move_left(&mut self.physics),
                Command::MoveRight => fighter.move_right(&mut self.physics),
                Command::Jump => fighter.jump(&mut self.physics),
                Command::Attack => fighter.attack(&mut self.physics),
                Command::Guard => fighter.guard(&mut self.physics),
                Command::Stand => fighter.stand(&mut self.physics),
            }
        }

        // State machines and swings
        let rays = self.roster.update(&mut self.physics, dt);
        let hits = combat::resolve_attacks(&rays, &mut self.roster, &mut self.physics);

        // Physics last, then fold its contact events back into the fighters
        self.physics.step();
        self.roster.process_contacts(&self.physics);

        hits
    }

    /// Run as many fixed ticks as wall-clock time calls for. Returns the
    /// hits of all ticks executed this frame.
    pub fn update(&mut self) -> Vec<HitEvent> {
        let steps = self.clock.begin_frame();
        let mut hits = Vec::new();
        for _ in 0..steps {
            hits.extend(self.tick());
        }
        hits
    }

    /// The sole surviving fighter, once every other fighter is defeated.
    /// Never reports a winner in a match of fewer than two fighters.
    pub fn victor(&self) -> Option<FighterId> {
        if self.roster.count() < 2 {
            return None;
        }
        let mut standing = self.roster.all().iter().filter(|f| !f.is_defeated());
        match (standing.next(), standing.next()) {
            (Some(winner), None) => Some(winner.id),
            _ => None,
        }
    }

    pub fn roster(&self) -> &FighterRoster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut FighterRoster {
        &mut self.roster
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn clock(&self) -> &GameLoop {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut GameLoop {
        &mut self.clock
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}
