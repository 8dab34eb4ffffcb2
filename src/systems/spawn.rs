use glam::Vec3;
use hecs::{Entity, World};
use rand::Rng;

use crate::components::{planar_distance, Enemy, EnemyFsm, EnemyState, Player, Transform};
use crate::config::GameConfig;
use crate::events::{EventQueue, GameEvent};
use crate::obstacles::ObstacleRegistry;
use crate::scene;

/// Pick a spawn point in the ring around `center` that is inside the world,
/// clear of trees and away from other live enemies.
fn find_spawn_point(
    world: &World,
    config: &GameConfig,
    obstacles: &ObstacleRegistry,
    center: Vec3,
    rng: &mut impl Rng,
) -> Option<Vec3> {
    let spawn = &config.spawn;
    let edge = config.world.size / 2.0 - spawn.edge_margin;
    let others: Vec<Vec3> = world
        .query::<(&Enemy, &Transform, &EnemyFsm)>()
        .iter()
        .filter(|(_, (_, _, fsm))| !fsm.is_state(EnemyState::Dead))
        .map(|(_, (_, transform, _))| transform.position)
        .collect();

    (0..spawn.attempts).find_map(|_| {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let distance = rng.gen_range(spawn.min_distance..=spawn.max_distance);
        let candidate = center + Vec3::new(angle.cos(), 0.0, angle.sin()) * distance;

        let inside = candidate.x.abs() <= edge && candidate.z.abs() <= edge;
        let clear = !obstacles.has_obstacle_near(candidate, spawn.obstacle_clearance);
        let spaced = others.iter().all(|&p| planar_distance(p, candidate) >= spawn.enemy_separation);
        (inside && clear && spaced).then_some(candidate)
    })
}

/// Spawn one enemy somewhere in the ring around the player. Returns `None`
/// when no attempt found a valid spot.
pub fn spawn_enemy_near(
    world: &mut World,
    config: &GameConfig,
    obstacles: &ObstacleRegistry,
    rng: &mut impl Rng,
    events: &mut EventQueue,
) -> Option<Entity> {
    let center = world
        .query::<(&Player, &Transform)>()
        .iter()
        .next()
        .map_or(Vec3::ZERO, |(_, (_, transform))| transform.position);

    let Some(position) = find_spawn_point(world, config, obstacles, center, rng) else {
        log::debug!("no free spawn point after {} attempts", config.spawn.attempts);
        return None;
    };
    let kinds = &config.spawn.kinds;
    if kinds.is_empty() {
        return None;
    }
    let kind = kinds[rng.gen_range(0..kinds.len())];

    let actor = scene::spawn_enemy(world, config, kind, position);
    events.push(GameEvent::EnemySpawned { actor, kind, position });
    Some(actor)
}
