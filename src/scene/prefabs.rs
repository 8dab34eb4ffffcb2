use glam::Vec3;
use hecs::{Entity, World};

use crate::components::*;
use crate::config::GameConfig;

/// Spawn the player at the origin with the configured starting health and
/// every ability unlocked.
pub fn spawn_player(world: &mut World, config: &GameConfig) -> Entity {
    let player = &config.player;
    world.spawn((
        Player,
        Transform::at(Vec3::ZERO),
        Velocity::default(),
        Collider { radius: player.collision_radius },
        Health::new(player.health, player.max_health),
        PlayerFsm::new(PlayerState::Idle),
        PlayerCombat::default(),
        KillLedger::new(&config.abilities),
    ))
}

/// Spawn an enemy of `kind` at full health, idle, at `position` (height dropped).
pub fn spawn_enemy(world: &mut World, config: &GameConfig, kind: EnemyKind, position: Vec3) -> Entity {
    let profile = config.enemies.profile(kind);
    world.spawn((
        Enemy { kind },
        Transform::at(position),
        Velocity::default(),
        Collider { radius: profile.collision_radius },
        Health::full(profile.health),
        EnemyFsm::new(EnemyState::Idle),
        EnemyBrain {
            // First idle period; later ones are rolled on each entry into Idle.
            idle_duration: profile.idle_time.min,
            ..EnemyBrain::default()
        },
    ))
}
