use std::f32::consts::{PI, TAU};

use hecs::World;

use crate::components::{Enemy, Player, Transform, Velocity};
use crate::sim::TickCtx;

use super::collision::collision_system;
use super::yaw_towards;

/// Below this speed the player keeps its current heading.
const TURN_SPEED_THRESHOLD: f32 = 0.1;

/// Signed shortest rotation from `from` to `to`, in `[-PI, PI)`.
pub fn shortest_arc(from: f32, to: f32) -> f32 {
    (to - from + PI).rem_euclid(TAU) - PI
}

fn ease_facing(transform: &mut Transform, rate: f32, dt: f32) {
    let diff = shortest_arc(transform.facing, transform.target_facing);
    transform.facing += diff * (rate * dt).min(1.0);
}

/// Integrate positions on the ground plane, resolve collisions and ease
/// every actor's facing towards its target.
pub fn physics_system(world: &mut World, ctx: &mut TickCtx) {
    for (_entity, (transform, vel)) in world.query_mut::<(&mut Transform, &Velocity)>() {
        transform.position.x += vel.0.x * ctx.dt;
        transform.position.z += vel.0.z * ctx.dt;
        transform.position.y = 0.0;
    }

    collision_system(world, ctx);

    let player = &ctx.config.player;
    for (_entity, (_player, transform, vel)) in
        world.query_mut::<(&Player, &mut Transform, &Velocity)>()
    {
        if vel.0.length() > TURN_SPEED_THRESHOLD {
            if let Some(yaw) = yaw_towards(vel.0) {
                transform.target_facing = yaw;
            }
            ease_facing(transform, player.rotation_speed, ctx.dt);
        }
    }

    let turn_rate = ctx.config.enemies.tuning.turn_rate;
    for (_entity, (_enemy, transform)) in world.query_mut::<(&Enemy, &mut Transform)>() {
        ease_facing(transform, turn_rate, ctx.dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn shortest_arc_wraps_through_pi() {
        assert_relative_eq!(shortest_arc(0.1, -0.1), -0.2, epsilon = 1e-6);
        assert_relative_eq!(shortest_arc(3.0, -3.0), TAU - 6.0, epsilon = 1e-5);
        assert_relative_eq!(shortest_arc(-3.0, 3.0), 6.0 - TAU, epsilon = 1e-5);
    }

    #[test]
    fn easing_never_overshoots() {
        let mut t = Transform::at(glam::Vec3::ZERO);
        t.target_facing = 1.0;
        ease_facing(&mut t, 8.0, 1.0);
        assert_relative_eq!(t.facing, 1.0);
    }
}
