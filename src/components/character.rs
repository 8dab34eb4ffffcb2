use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::AbilityConfig;
use crate::fsm::{FsmState, StateMachine};

// ---------------------------------------------------------------------------
// Actor markers and health
// ---------------------------------------------------------------------------

/// Marker: this entity is the player.
pub struct Player;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Goblin,
    Orc,
    Vampire,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Goblin, EnemyKind::Orc, EnemyKind::Vampire];
}

/// Marks an entity as an enemy of the given kind.
#[derive(Debug, Clone, Copy)]
pub struct Enemy {
    pub kind: EnemyKind,
}

/// Hit points, always kept within `0..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Health {
    pub fn new(current: u32, max: u32) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }

    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Subtract `amount`, floored at zero. Returns the health actually lost.
    pub fn take(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.current);
        self.current -= lost;
        lost
    }

    /// Add `amount`, capped at `max`. Returns the health actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let restored = amount.min(self.max.saturating_sub(self.current));
        self.current += restored;
        restored
    }

    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }
}

// ---------------------------------------------------------------------------
// Player state machine
// ---------------------------------------------------------------------------

/// All discrete states the player can be in.
///
/// Transition rules live in `src/systems/player.rs` next to the input and
/// combat context they read; this file stays pure data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Walking,
    /// Sprint held while moving.
    Running,
    /// Melee swing. Damage lands once at the attack's cast point.
    Attacking,
    CastingHeal,
    CastingShield,
    CastingUltimate,
    /// Short stagger after a hit that got through.
    Hurt,
    Dead,
}

impl PlayerState {
    /// States that accept new commands (casts, attacks, locomotion changes).
    pub fn is_free(&self) -> bool {
        matches!(self, Self::Idle | Self::Walking | Self::Running)
    }

    pub fn is_casting(&self) -> bool {
        matches!(self, Self::CastingHeal | Self::CastingShield | Self::CastingUltimate)
    }

    /// Ability performed at this state's cast point, if any.
    pub fn ability(&self) -> Option<AbilityKind> {
        match self {
            Self::CastingHeal => Some(AbilityKind::Heal),
            Self::CastingShield => Some(AbilityKind::Shield),
            Self::CastingUltimate => Some(AbilityKind::Ultimate),
            _ => None,
        }
    }
}

impl FsmState for PlayerState {
    fn tag(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Walking => "walking",
            Self::Running => "running",
            Self::Attacking => "attacking",
            Self::CastingHeal => "casting_heal",
            Self::CastingShield => "casting_shield",
            Self::CastingUltimate => "casting_ultimate",
            Self::Hurt => "hurt",
            Self::Dead => "dead",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Dead)
    }

    fn looping(&self) -> bool {
        matches!(self, Self::Idle | Self::Walking | Self::Running)
    }
}

/// FSM component attached to the player entity.
pub type PlayerFsm = StateMachine<PlayerState>;

/// Melee cooldown and the per-episode "action already performed" flag.
#[derive(Debug, Clone, Default)]
pub struct PlayerCombat {
    /// Seconds until the next melee swing is allowed.
    pub attack_timer: f32,
    /// Set once the current attack or cast has reached its cast point.
    pub action_fired: bool,
    /// Cast keys held last tick, for logging ignored requests once per press.
    pub cast_keys: [bool; 3],
}

// ---------------------------------------------------------------------------
// Kill-gated abilities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbilityKind {
    Shield,
    Heal,
    Ultimate,
}

impl AbilityKind {
    pub const ALL: [AbilityKind; 3] = [AbilityKind::Shield, AbilityKind::Heal, AbilityKind::Ultimate];

    fn index(self) -> usize {
        match self {
            AbilityKind::Shield => 0,
            AbilityKind::Heal => 1,
            AbilityKind::Ultimate => 2,
        }
    }
}

/// Kill count, score and the per-ability baselines used for resource gating.
///
/// An ability is usable while `kills - baseline >= requirement`. Baselines
/// start at `-requirement` so every ability is available on the first frame.
#[derive(Debug, Clone)]
pub struct KillLedger {
    pub kills: u32,
    pub score: u64,
    requirements: [u32; 3],
    baselines: [i64; 3],
    /// Whether the current "ready" period has already been announced.
    announced: [bool; 3],
}

impl KillLedger {
    pub fn new(abilities: &AbilityConfig) -> Self {
        let requirements = [
            abilities.shield.kills_required,
            abilities.heal.kills_required,
            abilities.ultimate.kills_required,
        ];
        Self {
            kills: 0,
            score: 0,
            requirements,
            baselines: requirements.map(|r| -i64::from(r)),
            announced: [true; 3],
        }
    }

    pub fn requirement(&self, ability: AbilityKind) -> u32 {
        self.requirements[ability.index()]
    }

    pub fn kills_since_use(&self, ability: AbilityKind) -> i64 {
        i64::from(self.kills) - self.baselines[ability.index()]
    }

    pub fn can_use(&self, ability: AbilityKind) -> bool {
        self.kills_since_use(ability) >= i64::from(self.requirement(ability))
    }

    /// Reset the baseline to the current kill count.
    pub fn spend(&mut self, ability: AbilityKind) {
        let i = ability.index();
        self.baselines[i] = i64::from(self.kills);
        self.announced[i] = false;
    }

    /// Credit a kill and return the abilities that just became usable again.
    pub fn record_kill(&mut self, points: u64) -> Vec<AbilityKind> {
        self.kills += 1;
        self.score += points;
        let mut unlocked = Vec::new();
        for ability in AbilityKind::ALL {
            let i = ability.index();
            if !self.announced[i] && self.can_use(ability) {
                self.announced[i] = true;
                unlocked.push(ability);
            }
        }
        unlocked
    }
}

// ---------------------------------------------------------------------------
// Enemy state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyState {
    Idle,
    Wandering,
    Chasing,
    Attacking,
    Hurt,
    Dead,
}

impl FsmState for EnemyState {
    fn tag(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Wandering => "wandering",
            Self::Chasing => "chasing",
            Self::Attacking => "attacking",
            Self::Hurt => "hurt",
            Self::Dead => "dead",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Dead)
    }

    fn looping(&self) -> bool {
        matches!(self, Self::Idle | Self::Wandering | Self::Chasing)
    }
}

pub type EnemyFsm = StateMachine<EnemyState>;

/// Per-enemy AI scratch state.
#[derive(Debug, Clone, Default)]
pub struct EnemyBrain {
    /// How long the current idle period lasts (randomized on entry).
    pub idle_duration: f32,
    /// How long the current wander leg may last (randomized on entry).
    pub wander_duration: f32,
    pub wander_target: Option<Vec3>,
    /// Seconds until the next swing is allowed.
    pub attack_timer: f32,
    /// Set once the current swing has landed.
    pub has_dealt_damage: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn health_saturates_at_both_ends() {
        let mut hp = Health::new(80, 100);
        assert_eq!(hp.heal(30), 20);
        assert_eq!(hp.current, 100);
        assert_eq!(hp.take(250), 100);
        assert!(hp.is_depleted());
        assert_eq!(hp.take(5), 0);
    }

    #[test]
    fn new_health_is_capped() {
        assert_eq!(Health::new(150, 100).current, 100);
    }

    #[test]
    fn every_ability_is_ready_at_start() {
        let ledger = KillLedger::new(&GameConfig::default().abilities);
        for ability in AbilityKind::ALL {
            assert!(ledger.can_use(ability), "{ability:?}");
        }
    }

    #[test]
    fn spent_ability_needs_fresh_kills() {
        let mut ledger = KillLedger::new(&GameConfig::default().abilities);
        ledger.spend(AbilityKind::Shield);
        assert!(!ledger.can_use(AbilityKind::Shield));

        for _ in 0..4 {
            assert!(ledger.record_kill(100).is_empty());
            assert!(!ledger.can_use(AbilityKind::Shield));
        }
        assert_eq!(ledger.record_kill(100), vec![AbilityKind::Shield]);
        assert!(ledger.can_use(AbilityKind::Shield));
        assert!(ledger.record_kill(100).is_empty());
        assert_eq!(ledger.score, 600);
    }

    #[test]
    fn dead_is_terminal_and_one_shot() {
        assert!(PlayerState::Dead.is_terminal());
        assert!(!PlayerState::Dead.looping());
        assert!(EnemyState::Dead.is_terminal());
        assert!(EnemyState::Chasing.looping());
    }
}
