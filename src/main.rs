use anyhow::Result;
use glam::Vec2;
use log::info;

use iron_brawl::game::characters::profiles;
use iron_brawl::game::controller::{Command, ScriptedController};
use iron_brawl::game::Arena;

/// One simulated minute at 60 ticks per second
const MAX_TICKS: u32 = 60 * 60;

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting Iron Brawl demo bout...");

    let mut arena = Arena::with_standard_stage();

    // Knight: advance on the rookie, swing, recover, repeat
    let mut knight_script = vec![Command::Stand; 90];
    for _ in 0..4 {
        knight_script.extend(vec![Command::MoveRight; 20]);
        knight_script.push(Command::Attack);
        knight_script.extend(vec![Command::Stand; 49]);
    }
    let knight = arena.spawn_fighter(
        profiles::knight(),
        Vec2::new(1.5, 1.0),
        Box::new(ScriptedController::new(knight_script)),
    )?;

    // Rookie: block for a while, jab back, hop away
    let mut rookie_script = vec![Command::Stand; 90];
    rookie_script.extend(vec![Command::Guard; 80]);
    rookie_script.push(Command::Attack);
    rookie_script.extend(vec![Command::Stand; 30]);
    rookie_script.push(Command::Jump);
    rookie_script.extend(vec![Command::Stand; 40]);
    let rookie = arena.spawn_fighter(
        profiles::rookie(),
        Vec2::new(3.0, 1.0),
        Box::new(ScriptedController::new(rookie_script)),
    )?;

    for tick in 0..MAX_TICKS {
        for hit in arena.tick() {
            if let Some(target) = arena.roster().get(hit.target) {
                info!(
                    "t={:.2}s: #{} has {} HP left",
                    tick as f32 / 60.0,
                    hit.target,
                    target.health
                );
            }
        }

        if let Some(winner) = arena.victor() {
            if let Some(fighter) = arena.roster().get(winner) {
                info!(
                    "{} #{} wins after {:.1}s",
                    fighter.profile.name,
                    winner,
                    tick as f32 / 60.0
                );
            }
            return Ok(());
        }
    }

    let knight_hp = arena.roster().get(knight).map(|f| f.health).unwrap_or(0);
    let rookie_hp = arena.roster().get(rookie).map(|f| f.health).unwrap_or(0);
    info!("Time! knight {knight_hp} HP, rookie {rookie_hp} HP");
    Ok(())
}
