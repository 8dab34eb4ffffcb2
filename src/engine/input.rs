use std::collections::HashSet;

use glam::Vec3;

/// Discrete player intents. The host maps raw key events onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Forward,
    Backward,
    Left,
    Right,
    Run,
    Attack,
    Heal,
    Shield,
    Ultimate,
}

impl Action {
    /// Default key binding, keyed by the lower-cased DOM `key` value.
    pub fn for_key(key: &str) -> Option<Self> {
        let action = match key.to_ascii_lowercase().as_str() {
            "w" | "arrowup" => Action::Forward,
            "s" | "arrowdown" => Action::Backward,
            "a" | "arrowleft" => Action::Left,
            "d" | "arrowright" => Action::Right,
            "shift" => Action::Run,
            " " => Action::Attack,
            "e" => Action::Heal,
            "q" => Action::Shield,
            "r" => Action::Ultimate,
            _ => return None,
        };
        Some(action)
    }
}

/// Set of currently held actions, sampled by the simulation each tick.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    held: HashSet<Action>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, action: Action) {
        self.held.insert(action);
    }

    pub fn release(&mut self, action: Action) {
        self.held.remove(&action);
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }

    /// Route a raw key event through the default bindings. Unbound keys are
    /// ignored.
    pub fn key_event(&mut self, key: &str, pressed: bool) {
        if let Some(action) = Action::for_key(key) {
            if pressed {
                self.press(action);
            } else {
                self.release(action);
            }
        }
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    /// Desired movement direction on the ground plane. Forward is -Z and
    /// diagonals are scaled to unit-ish length.
    pub fn move_vector(&self) -> Vec3 {
        let mut dir = Vec3::ZERO;
        if self.is_held(Action::Forward) {
            dir.z -= 1.0;
        }
        if self.is_held(Action::Backward) {
            dir.z += 1.0;
        }
        if self.is_held(Action::Left) {
            dir.x -= 1.0;
        }
        if self.is_held(Action::Right) {
            dir.x += 1.0;
        }
        if dir.x != 0.0 && dir.z != 0.0 {
            dir *= 0.707;
        }
        dir
    }

    pub fn is_moving(&self) -> bool {
        self.move_vector() != Vec3::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_are_case_insensitive() {
        assert_eq!(Action::for_key("W"), Some(Action::Forward));
        assert_eq!(Action::for_key("ArrowLeft"), Some(Action::Left));
        assert_eq!(Action::for_key(" "), Some(Action::Attack));
        assert_eq!(Action::for_key("x"), None);
    }

    #[test]
    fn diagonal_is_scaled() {
        let mut input = InputState::new();
        input.press(Action::Forward);
        input.press(Action::Right);
        let v = input.move_vector();
        assert!((v.x - 0.707).abs() < 1e-6);
        assert!((v.z + 0.707).abs() < 1e-6);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut input = InputState::new();
        input.key_event("a", true);
        input.key_event("d", true);
        assert!(!input.is_moving());
        input.key_event("d", false);
        assert_eq!(input.move_vector(), Vec3::new(-1.0, 0.0, 0.0));
    }
}
