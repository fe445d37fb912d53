//! Abstracted input snapshot
//!
//! The host refreshes an `InputState` whenever keys change; the simulation
//! reads it once per tick and never writes to it.

use serde::{Deserialize, Serialize};

use super::state::GameState;

/// Logical actions the simulation understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Fire,
}

impl Action {
    /// Parse a logical action name (`up`, `down`, `left`, `right`, `fire`)
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "up" => Some(Action::Up),
            "down" => Some(Action::Down),
            "left" => Some(Action::Left),
            "right" => Some(Action::Right),
            "fire" => Some(Action::Fire),
            _ => None,
        }
    }

    /// Map a host key code (`KeyboardEvent.code` naming) to an action
    pub fn from_key_code(code: &str) -> Option<Self> {
        match code {
            "ArrowUp" | "KeyW" => Some(Action::Up),
            "ArrowDown" | "KeyS" => Some(Action::Down),
            "ArrowLeft" | "KeyA" => Some(Action::Left),
            "ArrowRight" | "KeyD" => Some(Action::Right),
            "Space" | "Enter" => Some(Action::Fire),
            _ => None,
        }
    }
}

/// Which actions are currently held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
}

impl InputState {
    pub fn held(&self, action: Action) -> bool {
        match action {
            Action::Up => self.up,
            Action::Down => self.down,
            Action::Left => self.left,
            Action::Right => self.right,
            Action::Fire => self.fire,
        }
    }

    pub fn set_action(&mut self, action: Action, held: bool) {
        match action {
            Action::Up => self.up = held,
            Action::Down => self.down = held,
            Action::Left => self.left = held,
            Action::Right => self.right = held,
            Action::Fire => self.fire = held,
        }
    }

    /// Set an action by name; unknown names are ignored
    pub fn set(&mut self, name: &str, held: bool) {
        if let Some(action) = Action::parse(name) {
            self.set_action(action, held);
        }
    }

    /// Apply a key event; keys without a binding are ignored
    pub fn apply_key(&mut self, code: &str, pressed: bool) {
        if let Some(action) = Action::from_key_code(code) {
            self.set_action(action, pressed);
        }
    }

    /// Horizontal intent: -1, 0 or +1
    pub fn horizontal(&self) -> f32 {
        (self.right as i8 - self.left as i8) as f32
    }

    /// Vertical intent (down is positive): -1, 0 or +1
    pub fn vertical(&self) -> f32 {
        (self.down as i8 - self.up as i8) as f32
    }

    /// Demo-mode input: chase the lowest millipede segment's column and keep firing
    pub fn autopilot(state: &GameState) -> Self {
        let player = state.entities.player.pos;
        let target = state
            .entities
            .millipedes
            .iter()
            .flat_map(|m| m.segments.iter())
            .max_by(|a, b| {
                a.pos
                    .y
                    .partial_cmp(&b.pos.y)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|s| s.pos);

        let mut input = InputState {
            fire: true,
            ..Default::default()
        };
        if let Some(target) = target {
            // Bullets leave from the middle of the player's cell
            let dx = target.x - player.x;
            if dx > 0.3 {
                input.right = true;
            } else if dx < -0.3 {
                input.left = true;
            }
            // Back off when the chain gets close
            if (target.y - player.y).abs() < 3.0 && (target.x - player.x).abs() < 3.0 {
                input.down = true;
            }
        }
        input
    }
}
