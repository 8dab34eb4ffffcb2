use std::fmt::Debug;

/// A tag type usable as the state of a [`StateMachine`].
///
/// `tag()` doubles as the animation clip name handed to the presentation
/// layer, and `looping()` tells it whether that clip repeats.
pub trait FsmState: Copy + PartialEq + Debug {
    fn tag(&self) -> &'static str;

    /// Terminal states can be entered but never left.
    fn is_terminal(&self) -> bool {
        false
    }

    fn looping(&self) -> bool {
        true
    }
}

/// Minimal finite-state-machine container.
///
/// `S` is the state type (usually an enum). The machine tracks the current
/// state, the previous state, and how long the machine has been in its current
/// state. Transition logic lives in rule tables next to the system that
/// drives it (see [`first_transition`]).
///
/// # Usage
/// ```
/// # use nightfall::components::PlayerState;
/// # use nightfall::fsm::StateMachine;
/// let mut fsm = StateMachine::new(PlayerState::Idle);
/// fsm.update(0.016);
/// assert!(fsm.change_state(PlayerState::Walking));
/// assert!(!fsm.change_state(PlayerState::Walking));
/// ```
#[derive(Debug, Clone)]
pub struct StateMachine<S: FsmState> {
    state: S,
    previous: Option<S>,
    /// Seconds spent in the current state. Reset to 0.0 on each transition.
    elapsed: f32,
    entered_this_frame: bool,
}

impl<S: FsmState> StateMachine<S> {
    /// Create a new machine starting in `initial`.
    /// `just_entered()` returns `true` until the first `update`.
    pub fn new(initial: S) -> Self {
        Self {
            state: initial,
            previous: None,
            elapsed: 0.0,
            entered_this_frame: true,
        }
    }

    /// Transition to `next`. Returns `false` and leaves the machine untouched
    /// when `next` is the current state or the current state is terminal.
    pub fn change_state(&mut self, next: S) -> bool {
        if next == self.state || self.state.is_terminal() {
            return false;
        }
        self.previous = Some(std::mem::replace(&mut self.state, next));
        self.elapsed = 0.0;
        self.entered_this_frame = true;
        true
    }

    /// Advance the elapsed-in-state timer by `dt` seconds and clear the
    /// `just_entered` flag. Call once per tick **before** evaluating transitions.
    pub fn update(&mut self, dt: f32) {
        self.elapsed += dt;
        self.entered_this_frame = false;
    }

    pub fn state(&self) -> S {
        self.state
    }

    pub fn previous(&self) -> Option<S> {
        self.previous
    }

    pub fn is_state(&self, state: S) -> bool {
        self.state == state
    }

    pub fn state_time(&self) -> f32 {
        self.elapsed
    }

    /// Returns `true` from a transition until the next `update`.
    pub fn just_entered(&self) -> bool {
        self.entered_this_frame
    }

    /// Like [`just_entered`](Self::just_entered) but clears the flag, so a
    /// consumer reacts to each entry exactly once even for machines that are
    /// no longer updated (dead actors).
    pub fn take_entered(&mut self) -> bool {
        std::mem::take(&mut self.entered_this_frame)
    }
}

/// One row of a transition table: inspects the current state and a context
/// snapshot and returns the state it wants, or `None` when it does not apply.
pub type Rule<S, C> = fn(&S, &C) -> Option<S>;

/// Evaluate `rules` in priority order and return the first match.
///
/// A matching rule may return the current state; that still stops evaluation
/// ("stay here"), and applying it through `change_state` is a no-op.
pub fn first_transition<S: FsmState, C>(rules: &[Rule<S, C>], state: &S, ctx: &C) -> Option<S> {
    rules.iter().find_map(|rule| rule(state, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Door {
        Closed,
        Open,
        Broken,
    }

    impl FsmState for Door {
        fn tag(&self) -> &'static str {
            match self {
                Door::Closed => "closed",
                Door::Open => "open",
                Door::Broken => "broken",
            }
        }

        fn is_terminal(&self) -> bool {
            matches!(self, Door::Broken)
        }
    }

    #[test]
    fn change_to_same_state_is_a_no_op() {
        let mut fsm = StateMachine::new(Door::Closed);
        assert!(fsm.change_state(Door::Open));
        fsm.update(0.75);

        assert!(!fsm.change_state(Door::Open));
        assert_eq!(fsm.state_time(), 0.75);
        assert_eq!(fsm.previous(), Some(Door::Closed));
        assert!(!fsm.just_entered());
    }

    #[test]
    fn transition_records_previous_and_resets_time() {
        let mut fsm = StateMachine::new(Door::Closed);
        fsm.update(2.0);
        assert!(fsm.change_state(Door::Open));
        assert_eq!(fsm.previous(), Some(Door::Closed));
        assert_eq!(fsm.state_time(), 0.0);
        assert!(fsm.just_entered());
        assert!(fsm.is_state(Door::Open));
    }

    #[test]
    fn terminal_state_is_never_left() {
        let mut fsm = StateMachine::new(Door::Open);
        assert!(fsm.change_state(Door::Broken));
        assert!(!fsm.change_state(Door::Closed));
        assert!(!fsm.change_state(Door::Open));
        assert_eq!(fsm.state(), Door::Broken);
    }

    #[test]
    fn take_entered_fires_once() {
        let mut fsm = StateMachine::new(Door::Closed);
        assert!(fsm.take_entered());
        assert!(!fsm.take_entered());
        fsm.change_state(Door::Open);
        assert!(fsm.take_entered());
    }

    #[test]
    fn first_matching_rule_wins() {
        fn always_open(_: &Door, _: &()) -> Option<Door> {
            Some(Door::Open)
        }
        fn never(_: &Door, _: &()) -> Option<Door> {
            None
        }
        fn always_broken(_: &Door, _: &()) -> Option<Door> {
            Some(Door::Broken)
        }

        let rules: [Rule<Door, ()>; 3] = [never, always_open, always_broken];
        assert_eq!(first_transition(&rules, &Door::Closed, &()), Some(Door::Open));
        assert_eq!(first_transition(&rules[..1], &Door::Closed, &()), None);
    }
}
