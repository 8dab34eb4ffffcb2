use glam::Vec3;
use hecs::{Entity, World};

use crate::components::{
    planar_delta, planar_distance, Collider, Enemy, EnemyFsm, EnemyState, Player, PlayerFsm,
    PlayerState, Transform, Velocity,
};
use crate::obstacles::{random_planar_direction, resolve_push};
use crate::sim::TickCtx;

/// Obstacle pushes shorter than this move the actor but leave its velocity alone.
const MIN_PUSH_FOR_RESPONSE: f32 = 0.1;

/// Below this the two centres count as coincident.
const COINCIDENT_DISTANCE: f32 = 1e-6;

/// One player/enemy overlap found while resolving the player. `normal`
/// points from the enemy towards the player.
struct PlayerContact {
    enemy: Entity,
    normal: Vec3,
    overlap: f32,
}

struct ActorEntry {
    entity: Entity,
    position: Vec3,
    velocity: Vec3,
    radius: f32,
    chasing: bool,
}

/// Remove the part of `velocity` heading against `normal` (which points
/// away from whatever was hit). Returns the removed speed.
fn cancel_inward(velocity: &mut Vec3, normal: Vec3) -> f32 {
    let inward = velocity.dot(-normal);
    if inward > 0.0 {
        *velocity += normal * inward;
        inward
    } else {
        0.0
    }
}

fn clamp_to_bounds(position: &mut Vec3, bound: f32) {
    position.x = position.x.clamp(-bound, bound);
    position.z = position.z.clamp(-bound, bound);
    position.y = 0.0;
}

/// Separate two overlapping same-class actors, each taking half of the
/// overlap, and cancel their closing speed.
fn separate_pair(a: &mut ActorEntry, b: &mut ActorEntry, crowd_slide: f32, rng: &mut impl rand::Rng) {
    let min_distance = a.radius + b.radius;
    let distance = planar_distance(a.position, b.position);
    if distance >= min_distance {
        return;
    }
    let overlap = min_distance - distance;

    if distance <= COINCIDENT_DISTANCE {
        let dir = random_planar_direction(rng);
        a.position += dir * (overlap * 0.5);
        b.position -= dir * (overlap * 0.5);
        return;
    }

    // Normal points from b towards a.
    let n = planar_delta(b.position, a.position) / distance;
    a.position += n * (overlap * 0.5);
    b.position -= n * (overlap * 0.5);

    let closing = (a.velocity - b.velocity).dot(-n);
    if closing > 0.0 {
        a.velocity += n * (closing * 0.5);
        b.velocity -= n * (closing * 0.5);
    }

    if a.chasing && b.chasing {
        let lateral = Vec3::new(-n.z, 0.0, n.x) * crowd_slide;
        a.velocity += lateral;
        b.velocity -= lateral;
    }
}

/// Resolve every actor overlap for this tick, in order: player against
/// trees and enemies, enemies against the player and trees, enemies against
/// each other, then the world bounds.
pub fn collision_system(world: &mut World, ctx: &mut TickCtx) {
    let player_cfg = &ctx.config.player;
    let tuning = &ctx.config.enemies.tuning;

    let live_enemies: Vec<(Entity, Vec3, f32)> = world
        .query::<(&Enemy, &Transform, &Collider, &EnemyFsm)>()
        .iter()
        .filter(|(_, (_, _, _, fsm))| !fsm.is_state(EnemyState::Dead))
        .map(|(entity, (_, transform, collider, _))| (entity, transform.position, collider.radius))
        .collect();

    // --- Player ------------------------------------------------------------
    let mut player_contacts: Vec<PlayerContact> = Vec::new();
    let mut player_position: Option<Vec3> = None;
    for (_entity, (_player, transform, vel, collider, fsm)) in
        world.query_mut::<(&Player, &mut Transform, &mut Velocity, &Collider, &PlayerFsm)>()
    {
        if fsm.is_state(PlayerState::Dead) {
            clamp_to_bounds(&mut transform.position, ctx.config.world.player_bound);
            continue;
        }

        let contacts = ctx.obstacles.query(transform.position, collider.radius, ctx.rng);
        let push = resolve_push(&contacts);
        transform.position += push;
        if push.length() > MIN_PUSH_FOR_RESPONSE {
            cancel_inward(&mut vel.0, push.normalize());
            vel.0 *= player_cfg.obstacle_damping;
        }

        for &(enemy, enemy_pos, enemy_radius) in &live_enemies {
            let min_distance = collider.radius + enemy_radius;
            let distance = planar_distance(transform.position, enemy_pos);
            if distance >= min_distance {
                continue;
            }
            let n = if distance > COINCIDENT_DISTANCE {
                planar_delta(enemy_pos, transform.position) / distance
            } else {
                random_planar_direction(ctx.rng)
            };
            let overlap = min_distance - distance;
            transform.position += n * overlap;
            player_contacts.push(PlayerContact { enemy, normal: n, overlap });
            if cancel_inward(&mut vel.0, n) > 0.0 {
                vel.0 += n * player_cfg.contact_rebound;
            }
            vel.0 *= player_cfg.contact_damping;
        }

        clamp_to_bounds(&mut transform.position, ctx.config.world.player_bound);
        player_position = Some(transform.position);
    }

    // --- Enemies vs player and trees ----------------------------------------
    for (entity, (_enemy, transform, vel, collider, fsm)) in
        world.query_mut::<(&Enemy, &mut Transform, &mut Velocity, &Collider, &EnemyFsm)>()
    {
        if fsm.is_state(EnemyState::Dead) {
            continue;
        }
        let chasing = fsm.is_state(EnemyState::Chasing);

        // The enemy takes its share of the overlap measured before the
        // player moved, along the same axis.
        if let Some(contact) = player_contacts.iter().find(|c| c.enemy == entity) {
            transform.position -= contact.normal * (contact.overlap * tuning.player_push_fraction);
            if !chasing {
                vel.0 *= tuning.player_contact_damping;
            }
        }

        let contacts = ctx.obstacles.query(transform.position, collider.radius, ctx.rng);
        let push = resolve_push(&contacts);
        transform.position += push;
        if push.length() > MIN_PUSH_FOR_RESPONSE {
            let n = push.normalize();
            if chasing {
                // Slide around the trunk on the side facing the player.
                let mut lateral = Vec3::new(-n.z, 0.0, n.x);
                if let Some(player_pos) = player_position {
                    let to_player = planar_delta(transform.position, player_pos).normalize_or_zero();
                    if lateral.dot(to_player) < 0.0 {
                        lateral = -lateral;
                    }
                }
                vel.0 += lateral * tuning.sidestep_speed;
            }
            cancel_inward(&mut vel.0, n);
            vel.0 *= tuning.obstacle_damping;
        }
    }

    // --- Enemies vs enemies -------------------------------------------------
    let mut entries: Vec<ActorEntry> = world
        .query::<(&Enemy, &Transform, &Velocity, &Collider, &EnemyFsm)>()
        .iter()
        .filter(|(_, (_, _, _, _, fsm))| !fsm.is_state(EnemyState::Dead))
        .map(|(entity, (_, transform, vel, collider, fsm))| ActorEntry {
            entity,
            position: transform.position,
            velocity: vel.0,
            radius: collider.radius,
            chasing: fsm.is_state(EnemyState::Chasing),
        })
        .collect();

    // Broadphase: brute force O(n²)
    for i in 0..entries.len() {
        let (head, tail) = entries.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            separate_pair(a, b, tuning.crowd_slide, ctx.rng);
        }
    }

    for entry in &entries {
        if let Ok((transform, vel)) = world.query_one_mut::<(&mut Transform, &mut Velocity)>(entry.entity) {
            transform.position = entry.position;
            vel.0 = entry.velocity;
        }
    }

    for (_entity, (_enemy, transform)) in world.query_mut::<(&Enemy, &mut Transform)>() {
        clamp_to_bounds(&mut transform.position, ctx.config.world.enemy_bound);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::EnemyKind;
    use crate::config::GameConfig;
    use crate::effects::EffectStore;
    use crate::engine::input::InputState;
    use crate::events::EventQueue;
    use crate::obstacles::ObstacleRegistry;
    use crate::scene;
    use crate::schedule::Scheduler;
    use crate::systems::CombatQueue;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn entry(world: &mut World, x: f32, vx: f32, chasing: bool) -> ActorEntry {
        ActorEntry {
            entity: world.spawn(()),
            position: Vec3::new(x, 0.0, 0.0),
            velocity: Vec3::new(vx, 0.0, 0.0),
            radius: 1.0,
            chasing,
        }
    }

    #[test]
    fn pair_split_is_symmetric() {
        let mut world = World::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut a = entry(&mut world, 0.0, 2.0, false);
        let mut b = entry(&mut world, 1.5, -1.0, false);

        separate_pair(&mut a, &mut b, 1.0, &mut rng);

        assert_relative_eq!(a.position.x, -0.25);
        assert_relative_eq!(b.position.x, 1.75);
        assert_relative_eq!(planar_distance(a.position, b.position), 2.0);
        // Closing speed of 3 is removed, half from each.
        assert_relative_eq!(a.velocity.x, 0.5);
        assert_relative_eq!(b.velocity.x, 0.5);
    }

    #[test]
    fn separating_pair_keeps_its_velocity() {
        let mut world = World::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut a = entry(&mut world, 0.0, -1.0, false);
        let mut b = entry(&mut world, 1.0, 1.0, false);
        separate_pair(&mut a, &mut b, 1.0, &mut rng);
        assert_eq!(a.velocity.x, -1.0);
        assert_eq!(b.velocity.x, 1.0);
    }

    #[test]
    fn coincident_pair_gets_pushed_apart() {
        let mut world = World::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut a = entry(&mut world, 5.0, 0.0, false);
        let mut b = entry(&mut world, 5.0, 0.0, false);
        separate_pair(&mut a, &mut b, 1.0, &mut rng);
        assert_relative_eq!(planar_distance(a.position, b.position), 2.0, epsilon = 1e-5);
        assert!(a.position.is_finite() && b.position.is_finite());
    }

    #[test]
    fn chasing_pair_slides_sideways() {
        let mut world = World::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut a = entry(&mut world, 0.0, 0.0, true);
        let mut b = entry(&mut world, 1.0, 0.0, true);
        separate_pair(&mut a, &mut b, 1.0, &mut rng);
        assert_relative_eq!(a.velocity.z, -b.velocity.z);
        assert_relative_eq!(a.velocity.z.abs(), 1.0);
    }

    /// Run one collision pass over `world` with default tuning.
    fn resolve(world: &mut World, seed: u64) {
        let config = GameConfig::default();
        let input = InputState::new();
        let obstacles = ObstacleRegistry::new();
        let mut effects = EffectStore::new();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut events = EventQueue::new();
        let mut combat = CombatQueue::new();
        let mut scheduler = Scheduler::new();
        let mut ctx = TickCtx {
            dt: 1.0 / 60.0,
            now: 0.0,
            config: &config,
            input: &input,
            obstacles: &obstacles,
            effects: &mut effects,
            rng: &mut rng,
            events: &mut events,
            combat: &mut combat,
            scheduler: &mut scheduler,
        };
        collision_system(world, &mut ctx);
    }

    fn position(world: &World, actor: Entity) -> Vec3 {
        world.get::<&Transform>(actor).unwrap().position
    }

    #[test]
    fn enemy_takes_its_share_of_a_player_overlap() {
        let config = GameConfig::default();
        let mut world = World::new();
        let player = scene::spawn_player(&mut world, &config);
        let goblin = scene::spawn_enemy(&mut world, &config, EnemyKind::Goblin, Vec3::new(1.0, 0.0, 0.0));

        resolve(&mut world, 1);

        // Radii 1.0 + 0.7 overlap by 0.7 at distance 1.
        assert_relative_eq!(position(&world, player).x, -0.7, epsilon = 1e-4);
        assert_relative_eq!(position(&world, goblin).x, 1.07, epsilon = 1e-4);
    }

    #[test]
    fn coincident_player_and_enemy_are_pushed_apart() {
        let config = GameConfig::default();
        let mut world = World::new();
        let player = scene::spawn_player(&mut world, &config);
        let goblin = scene::spawn_enemy(&mut world, &config, EnemyKind::Goblin, Vec3::ZERO);

        resolve(&mut world, 5);

        let (p, g) = (position(&world, player), position(&world, goblin));
        assert!(p.is_finite() && g.is_finite());
        assert_relative_eq!(planar_distance(p, g), 1.7 * 1.1, epsilon = 1e-4);
    }

    #[test]
    fn inward_velocity_is_cancelled() {
        let mut v = Vec3::new(-3.0, 0.0, 2.0);
        assert_relative_eq!(cancel_inward(&mut v, Vec3::X), 3.0);
        assert_eq!(v, Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(cancel_inward(&mut v, Vec3::X), 0.0);
    }
}
