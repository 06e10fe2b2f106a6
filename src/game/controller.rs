// Fighter controllers
//
// A controller issues one command per simulation tick. The arena feeds the
// command to the fighter's action methods; illegal commands die there as
// no-ops, so controllers never need to know the state machine's rules.

use std::collections::VecDeque;

/// One tick's worth of intent for a fighter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    Jump,
    Attack,
    Guard,
    /// Do nothing, release guard, stop walking
    Stand,
}

/// Source of per-tick commands for one fighter
pub trait Controller {
    fn next_command(&mut self) -> Command;
}

/// Replays a fixed command script, one entry per tick, looping when it
/// runs out. Useful for demo bouts and scenario tests.
pub struct ScriptedController {
    script: Vec<Command>,
    cursor: usize,
}

impl ScriptedController {
    pub fn new(script: Vec<Command>) -> Self {
        Self { script, cursor: 0 }
    }

    /// Repeat one command forever
    pub fn repeating(command: Command) -> Self {
        Self::new(vec![command])
    }
}

impl Controller for ScriptedController {
    fn next_command(&mut self) -> Command {
        if self.script.is_empty() {
            return Command::Stand;
        }
        let command = self.script[self.cursor];
        self.cursor = (self.cursor + 1) % self.script.len();
        command
    }
}

/// Drains externally pushed commands, standing when the queue is empty.
/// This is the seam a real input layer or an AI would push into.
#[derive(Default)]
pub struct QueuedController {
    queue: VecDeque<Command>,
}

impl QueuedController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    /// Push the same command for `ticks` consecutive ticks
    pub fn push_held(&mut self, command: Command, ticks: usize) {
        for _ in 0..ticks {
            self.queue.push_back(command);
        }
    }
}

impl Controller for QueuedController {
    fn next_command(&mut self) -> Command {
        self.queue.pop_front().unwrap_or(Command::Stand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_controller_loops() {
        let mut ctl = ScriptedController::new(vec![Command::MoveLeft, Command::Jump]);
        assert_eq!(ctl.next_command(), Command::MoveLeft);
        assert_eq!(ctl.next_command(), Command::Jump);
        assert_eq!(ctl.next_command(), Command::MoveLeft);
    }

    #[test]
    fn test_empty_script_stands() {
        let mut ctl = ScriptedController::new(Vec::new());
        assert_eq!(ctl.next_command(), Command::Stand);
    }

    #[test]
    fn test_queued_controller_drains_then_stands() {
        let mut ctl = QueuedController::new();
        ctl.push(Command::Attack);
        ctl.push_held(Command::Guard, 2);
        assert_eq!(ctl.next_command(), Command::Attack);
        assert_eq!(ctl.next_command(), Command::Guard);
        assert_eq!(ctl.next_command(), Command::Guard);
        assert_eq!(ctl.next_command(), Command::Stand);
        assert_eq!(ctl.next_command(), Command::Stand);
    }
}
