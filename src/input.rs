use std::collections::HashSet;

use winit::event::ElementState;
use winit::keyboard::KeyCode;

use crate::vehicle::Intents;

/// Held keys plus the cruise presses seen since the last sample.
#[derive(Debug, Default)]
pub struct KeyboardState {
    keys_down: HashSet<KeyCode>,
    cruise_presses: u32,
}

impl KeyboardState {
    pub fn handle_key(&mut self, code: KeyCode, state: ElementState, repeat: bool) {
        match state {
            ElementState::Pressed => {
                if code == KeyCode::Space && !repeat {
                    self.cruise_presses = self.cruise_presses.wrapping_add(1);
                }
                self.keys_down.insert(code);
            }
            ElementState::Released => {
                self.keys_down.remove(&code);
            }
        }
    }

    /// Focus loss: nothing stays held.
    pub fn release_all(&mut self) {
        self.keys_down.clear();
    }

    fn any(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.keys_down.contains(c))
    }

    /// Sample this frame's intents and consume the cruise presses. Each press
    /// flips cruise once, so an even count within one frame cancels out.
    pub fn sample(&mut self) -> Intents {
        let intents = Intents {
            accelerate: self.any(&[KeyCode::ArrowUp, KeyCode::KeyW]),
            brake: self.any(&[KeyCode::ArrowDown, KeyCode::KeyS]),
            steer_left: self.any(&[KeyCode::ArrowLeft, KeyCode::KeyA]),
            steer_right: self.any(&[KeyCode::ArrowRight, KeyCode::KeyD]),
            toggle_cruise: self.cruise_presses % 2 == 1,
        };
        self.cruise_presses = 0;
        intents
    }
}
