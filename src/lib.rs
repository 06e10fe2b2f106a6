//! Iron Brawl: the headless core of a 2D side-view dueling game.
//!
//! The crate simulates complete matches without any window, renderer or
//! input device attached. It is split into three layers:
//!
//! - [`core`]: small shared helpers
//! - [`engine`]: fixed-timestep loop and the rapier-backed physics world
//! - [`game`]: fighters, their state machines, combat resolution and the
//!   arena that drives a match tick by tick
//!
//! A render or input layer plugs in from the outside: fighters expose the
//! animation frame they are showing, controllers accept pushed commands.

pub mod core;
pub mod engine;
pub mod game;
