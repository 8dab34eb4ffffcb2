use glam::Vec3;

mod animation;
mod collision;
mod combat;
mod effects;
mod enemy;
mod physics;
mod player;
mod spawn;

pub use animation::animation_system;
pub use collision::collision_system;
pub use combat::{combat_system, CombatAction, CombatQueue};
pub use effects::effect_system;
pub use enemy::{enemy_behavior_system, enemy_state_system, EnemyCtx, ENEMY_RULES};
pub use physics::{physics_system, shortest_arc};
pub use player::{action_profile, player_behavior_system, player_state_system, PlayerCtx, PLAYER_RULES};
pub use spawn::spawn_enemy_near;

/// Move `velocity` towards `target` by `rate * dt` of the remaining gap.
pub(crate) fn steer(velocity: &mut Vec3, target: Vec3, rate: f32, dt: f32) {
    *velocity = velocity.lerp(target, (rate * dt).min(1.0));
}

/// Heading that looks along `dir` on the ground plane, or `None` for a
/// zero-length direction.
pub(crate) fn yaw_towards(dir: Vec3) -> Option<f32> {
    if dir.x.abs() < f32::EPSILON && dir.z.abs() < f32::EPSILON {
        return None;
    }
    Some(dir.x.atan2(dir.z))
}
