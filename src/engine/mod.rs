// Engine modules: physics and loop timing

pub mod game_loop;
pub mod physics;
