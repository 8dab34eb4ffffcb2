//! Tuning for the whole simulation.
//!
//! `GameConfig::default()` carries the shipped game balance. A JSON file may
//! override any subset of it; missing fields keep their defaults, down to a
//! single field of one enemy kind. Arrays are replaced whole.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::components::EnemyKind;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Inclusive range used for randomized timers and scales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    fn check(&self, field: &'static str) -> Result<(), ConfigError> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min > self.max {
            return Err(invalid(field, format!("expected min <= max, got {}..{}", self.min, self.max)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub world: WorldConfig,
    pub player: PlayerConfig,
    pub abilities: AbilityConfig,
    pub enemies: EnemyRoster,
    pub spawn: SpawnConfig,
    pub forest: ForestConfig,
}

impl GameConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let overrides: Value = serde_json::from_str(json)?;
        let mut merged = serde_json::to_value(Self::default())?;
        merge_json(&mut merged, overrides);
        let config: Self = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values that would make the simulation misbehave (inverted
    /// ranges, zero durations used as divisors, health above its cap).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.world;
        if !(w.size.is_finite() && w.size > 0.0) {
            return Err(invalid("world.size", "must be positive"));
        }
        for (field, bound) in [
            ("world.player_bound", w.player_bound),
            ("world.enemy_bound", w.enemy_bound),
            ("world.wander_bound", w.wander_bound),
        ] {
            if bound <= 0.0 || bound > w.size / 2.0 {
                return Err(invalid(field, "must lie within half the world size"));
            }
        }

        let p = &self.player;
        if p.max_health == 0 {
            return Err(invalid("player.max_health", "must be at least 1"));
        }
        if p.health > p.max_health {
            return Err(invalid("player.health", "must not exceed max_health"));
        }
        if p.collision_radius <= 0.0 {
            return Err(invalid("player.collision_radius", "must be positive"));
        }
        p.attack.check("player.attack")?;

        self.abilities.heal.cast.check("abilities.heal.cast")?;
        self.abilities.shield.cast.check("abilities.shield.cast")?;
        self.abilities.ultimate.cast.check("abilities.ultimate.cast")?;
        if self.abilities.ultimate.speed <= 0.0 {
            return Err(invalid("abilities.ultimate.speed", "must be positive"));
        }

        for kind in EnemyKind::ALL {
            let profile = self.enemies.profile(kind);
            if profile.health == 0 {
                return Err(invalid("enemies.health", format!("{kind:?} needs at least 1 health")));
            }
            if profile.attack_cooldown <= 0.0 {
                return Err(invalid("enemies.attack_cooldown", format!("{kind:?} cooldown must be positive")));
            }
            if profile.collision_radius <= 0.0 {
                return Err(invalid("enemies.collision_radius", format!("{kind:?} radius must be positive")));
            }
            if !(profile.wander_radius.is_finite() && profile.wander_radius >= 0.0) {
                return Err(invalid("enemies.wander_radius", format!("{kind:?} radius must be zero or more")));
            }
            profile.idle_time.check("enemies.idle_time")?;
            profile.wander_time.check("enemies.wander_time")?;
        }

        let s = &self.spawn;
        for (field, value) in [
            ("spawn.min_distance", s.min_distance),
            ("spawn.max_distance", s.max_distance),
            ("spawn.edge_margin", s.edge_margin),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(field, "must be zero or more"));
            }
        }
        if s.min_distance > s.max_distance {
            return Err(invalid("spawn.min_distance", "must not exceed max_distance"));
        }
        if s.kinds.is_empty() {
            return Err(invalid("spawn.kinds", "needs at least one enemy kind"));
        }

        let f = &self.forest;
        if !(f.min_from_edge.is_finite() && f.min_from_edge >= 0.0) {
            return Err(invalid("forest.min_from_edge", "must be zero or more"));
        }
        for species in &f.species {
            species.scale.check("forest.species.scale")?;
        }
        Ok(())
    }
}

/// Overlay `patch` onto `base`: objects merge key by key, anything else
/// replaces the base value.
fn merge_json(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, patch) => *base = patch,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Edge length of the square play field, centred on the origin.
    pub size: f32,
    /// Clamp applied to the player's X/Z every tick.
    pub player_bound: f32,
    /// Clamp applied to enemies' X/Z every tick.
    pub enemy_bound: f32,
    /// Clamp for freshly picked wander targets.
    pub wander_bound: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size: 200.0,
            player_bound: 98.0,
            enemy_bound: 95.0,
            wander_bound: 90.0,
        }
    }
}

/// Movement and timing of one committed action (melee swing or spell cast).
///
/// The action's effect fires once, when `state_time / duration` first reaches
/// `cast_point`. While it plays the actor keeps `move_fraction` of its walk
/// speed, steering at `accel_scale` × acceleration, or braking at
/// `decel_scale` × deceleration without input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionProfile {
    pub duration: f32,
    pub cast_point: f32,
    pub move_fraction: f32,
    pub accel_scale: f32,
    pub decel_scale: f32,
}

impl ActionProfile {
    fn check(&self, field: &'static str) -> Result<(), ConfigError> {
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(invalid(field, "duration must be positive"));
        }
        if !(0.0..=1.0).contains(&self.cast_point) {
            return Err(invalid(field, "cast_point must lie in 0..=1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub walk_speed: f32,
    pub run_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    pub rotation_speed: f32,
    pub health: u32,
    pub max_health: u32,
    pub collision_radius: f32,
    pub attack_damage: u32,
    pub attack_range: f32,
    /// Minimum dot product between facing and the direction to a target for a
    /// melee hit (≈ cos 101°).
    pub attack_cone_dot: f32,
    pub attack: ActionProfile,
    pub hurt_duration: f32,
    /// Velocity kept after bumping into an obstacle.
    pub obstacle_damping: f32,
    /// Velocity kept after bumping into an enemy.
    pub contact_damping: f32,
    /// Speed of the rebound away from an enemy the player walked into.
    pub contact_rebound: f32,
    /// Delay between the player's death and the game-over report.
    pub defeat_report_delay: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            walk_speed: 5.0,
            run_speed: 10.0,
            acceleration: 15.0,
            deceleration: 10.0,
            rotation_speed: 8.0,
            health: 80,
            max_health: 100,
            collision_radius: 1.0,
            attack_damage: 25,
            attack_range: 5.0,
            attack_cone_dot: -0.2,
            attack: ActionProfile {
                duration: 1.43,
                cast_point: 0.5,
                move_fraction: 0.3,
                accel_scale: 0.5,
                decel_scale: 2.0,
            },
            hurt_duration: 0.5,
            obstacle_damping: 0.7,
            contact_damping: 0.3,
            contact_rebound: 2.0,
            defeat_report_delay: 2.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityConfig {
    pub heal: HealConfig,
    pub shield: ShieldConfig,
    pub ultimate: FireWallConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealConfig {
    pub kills_required: u32,
    pub amount: u32,
    pub cast: ActionProfile,
    /// Lifetime of the heal pulse effect that tracks the player.
    pub pulse_duration: f32,
}

impl Default for HealConfig {
    fn default() -> Self {
        Self {
            kills_required: 7,
            amount: 30,
            cast: ActionProfile {
                duration: 1.2,
                cast_point: 0.5,
                move_fraction: 0.15,
                accel_scale: 0.3,
                decel_scale: 3.0,
            },
            pulse_duration: 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldConfig {
    pub kills_required: u32,
    pub radius: f32,
    pub cast: ActionProfile,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            kills_required: 5,
            radius: 3.0,
            cast: ActionProfile {
                duration: 1.2,
                cast_point: 0.5,
                move_fraction: 0.1,
                accel_scale: 0.2,
                decel_scale: 4.0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireWallConfig {
    pub kills_required: u32,
    pub damage: u32,
    /// Distance after which the wall burns out.
    pub range: f32,
    pub speed: f32,
    /// Lifetime cap in seconds, independent of range.
    pub duration: f32,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    /// Distance in front of the caster where the wall appears.
    pub spawn_distance: f32,
    pub cast: ActionProfile,
}

impl Default for FireWallConfig {
    fn default() -> Self {
        Self {
            kills_required: 10,
            damage: 100,
            range: 15.0,
            speed: 15.0,
            duration: 3.0,
            width: 8.0,
            height: 4.0,
            depth: 2.0,
            spawn_distance: 2.0,
            cast: ActionProfile {
                duration: 1.2,
                cast_point: 0.5,
                move_fraction: 0.15,
                accel_scale: 0.3,
                decel_scale: 3.0,
            },
        }
    }
}

/// Stats for one enemy kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyProfile {
    pub health: u32,
    pub speed: f32,
    pub attack_damage: u32,
    pub attack_range: f32,
    pub attack_cooldown: f32,
    pub detection_range: f32,
    pub wander_radius: f32,
    pub idle_time: Span,
    pub wander_time: Span,
    pub collision_radius: f32,
    /// Score credited to whoever lands the killing blow.
    pub points: u64,
}

/// Behaviour constants shared by every enemy kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub chase_multiplier: f32,
    /// Fraction of `attack_cooldown` at which the swing lands.
    pub damage_time: f32,
    /// The swing connects while the target is within `attack_range` × this.
    pub reach_factor: f32,
    pub hurt_duration: f32,
    pub knockback: f32,
    /// Time between death and removal from the world.
    pub sink_duration: f32,
    pub idle_decel: f32,
    pub wander_steer: f32,
    pub chase_steer: f32,
    pub attack_decel: f32,
    pub turn_rate: f32,
    /// Per-tick chance of an idle enemy glancing in a new direction.
    pub glance_chance: f32,
    pub obstacle_damping: f32,
    /// Lateral speed added when a chasing enemy is blocked by an obstacle.
    pub sidestep_speed: f32,
    /// Lateral speed exchanged by two chasing enemies in contact.
    pub crowd_slide: f32,
    /// Share of the overlap an enemy yields when touching the player.
    pub player_push_fraction: f32,
    /// Velocity kept by a non-chasing enemy pressed against the player.
    pub player_contact_damping: f32,
    /// Arrival radius for wander targets.
    pub arrive_distance: f32,
    /// Full size of the box used for effect overlap tests.
    pub hitbox: [f32; 3],
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            chase_multiplier: 1.3,
            damage_time: 0.5,
            reach_factor: 1.2,
            hurt_duration: 0.5,
            knockback: 8.0,
            sink_duration: 1.0,
            idle_decel: 10.0,
            wander_steer: 5.0,
            chase_steer: 8.0,
            attack_decel: 10.0,
            turn_rate: 5.0,
            glance_chance: 0.01,
            obstacle_damping: 0.8,
            sidestep_speed: 3.0,
            crowd_slide: 1.0,
            player_push_fraction: 0.1,
            player_contact_damping: 0.8,
            arrive_distance: 1.0,
            hitbox: [2.0, 3.0, 2.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyRoster {
    pub goblin: EnemyProfile,
    pub orc: EnemyProfile,
    pub vampire: EnemyProfile,
    pub tuning: EnemyTuning,
}

impl EnemyRoster {
    pub fn profile(&self, kind: EnemyKind) -> &EnemyProfile {
        match kind {
            EnemyKind::Goblin => &self.goblin,
            EnemyKind::Orc => &self.orc,
            EnemyKind::Vampire => &self.vampire,
        }
    }
}

impl Default for EnemyRoster {
    fn default() -> Self {
        Self {
            goblin: EnemyProfile {
                health: 50,
                speed: 2.0,
                attack_damage: 10,
                attack_range: 2.0,
                attack_cooldown: 1.5,
                detection_range: 15.0,
                wander_radius: 10.0,
                idle_time: Span::new(2.0, 5.0),
                wander_time: Span::new(3.0, 8.0),
                collision_radius: 0.7,
                points: 100,
            },
            orc: EnemyProfile {
                health: 100,
                speed: 1.2,
                attack_damage: 20,
                attack_range: 2.5,
                attack_cooldown: 2.0,
                detection_range: 12.0,
                wander_radius: 8.0,
                idle_time: Span::new(3.0, 6.0),
                wander_time: Span::new(4.0, 10.0),
                collision_radius: 1.2,
                points: 200,
            },
            vampire: EnemyProfile {
                health: 30,
                speed: 2.0,
                attack_damage: 15,
                attack_range: 2.0,
                attack_cooldown: 3.0,
                detection_range: 20.0,
                wander_radius: 15.0,
                idle_time: Span::new(1.0, 3.0),
                wander_time: Span::new(2.0, 5.0),
                collision_radius: 0.9,
                points: 100,
            },
            tuning: EnemyTuning::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub min_distance: f32,
    pub max_distance: f32,
    pub max_enemies: usize,
    pub initial_enemies: usize,
    pub edge_margin: f32,
    pub obstacle_clearance: f32,
    pub enemy_separation: f32,
    pub attempts: u32,
    /// Seconds between spawn checks.
    pub interval: f32,
    /// Kinds drawn uniformly for each spawn; repeat a kind to weight it.
    pub kinds: Vec<EnemyKind>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            min_distance: 25.0,
            max_distance: 45.0,
            max_enemies: 5,
            initial_enemies: 5,
            edge_margin: 5.0,
            obstacle_clearance: 2.0,
            enemy_separation: 5.0,
            attempts: 20,
            interval: 1.0,
            kinds: vec![EnemyKind::Vampire, EnemyKind::Orc, EnemyKind::Vampire],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSpecies {
    pub weight: u32,
    pub collision_radius: f32,
    pub scale: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub trees: usize,
    pub min_from_center: f32,
    pub min_from_edge: f32,
    pub min_between: f32,
    pub attempts: u32,
    pub species: Vec<TreeSpecies>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            trees: 60,
            min_from_center: 20.0,
            min_from_edge: 5.0,
            min_between: 4.0,
            attempts: 50,
            species: vec![
                TreeSpecies { weight: 40, collision_radius: 1.2, scale: Span::new(0.8, 1.2) },
                TreeSpecies { weight: 35, collision_radius: 0.8, scale: Span::new(0.7, 1.4) },
                TreeSpecies { weight: 25, collision_radius: 2.0, scale: Span::new(0.9, 1.1) },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GameConfig::from_json_str(r#"{ "player": { "attack_damage": 40 } }"#).unwrap();
        assert_eq!(config.player.attack_damage, 40);
        assert_eq!(config.player.max_health, 100);
        assert_eq!(config.enemies.orc.points, 200);
    }

    #[test]
    fn partial_enemy_and_action_overrides_keep_their_siblings() {
        let config = GameConfig::from_json_str(
            r#"{ "enemies": { "goblin": { "health": 60 } }, "player": { "attack": { "duration": 2.0 } } }"#,
        )
        .unwrap();
        assert_eq!(config.enemies.goblin.health, 60);
        assert_eq!(config.enemies.goblin.speed, 2.0);
        assert_eq!(config.enemies.goblin.idle_time, Span::new(2.0, 5.0));
        assert_eq!(config.enemies.orc, EnemyRoster::default().orc);
        assert_eq!(config.player.attack.duration, 2.0);
        assert_eq!(config.player.attack.cast_point, 0.5);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = GameConfig::from_json_str(r#"{ "soundtrack": "loud", "spawn": { "extra": 1 } }"#).unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn negative_wander_radius_is_rejected() {
        let err = GameConfig::from_json_str(r#"{ "enemies": { "orc": { "wander_radius": -5.0 } } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "enemies.wander_radius", .. }));
    }

    #[test]
    fn non_finite_distances_are_rejected() {
        let mut config = GameConfig::default();
        config.enemies.vampire.wander_radius = f32::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "enemies.wander_radius", .. })));

        let mut config = GameConfig::default();
        config.spawn.max_distance = f32::INFINITY;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "spawn.max_distance", .. })));

        let mut config = GameConfig::default();
        config.forest.min_from_edge = f32::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "forest.min_from_edge", .. })));

        let mut config = GameConfig::default();
        config.world.size = f32::INFINITY;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "world.size", .. })));
    }

    #[test]
    fn negative_spawn_distance_is_rejected() {
        let err = GameConfig::from_json_str(r#"{ "spawn": { "min_distance": -1.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "spawn.min_distance", .. }));
    }

    #[test]
    fn health_above_cap_is_rejected() {
        let err = GameConfig::from_json_str(r#"{ "player": { "health": 150 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "player.health", .. }));
    }

    #[test]
    fn inverted_span_is_rejected() {
        let mut config = GameConfig::default();
        config.enemies.goblin.idle_time = Span::new(5.0, 2.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = GameConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
