use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec3;
use hecs::{Entity, World};
use rand::Rng;

use crate::components::{
    planar_delta, planar_distance, Enemy, EnemyBrain, EnemyFsm, EnemyState, Player, PlayerFsm,
    PlayerState, Transform, Velocity,
};
use crate::config::Span;
use crate::fsm::{first_transition, FsmState, Rule};
use crate::sim::TickCtx;

use super::combat::CombatAction;
use super::{steer, yaw_towards};

// ---------------------------------------------------------------------------
// EnemyState transition rules
// ---------------------------------------------------------------------------

/// Snapshot handed to every enemy transition rule.
#[derive(Debug, Clone, Default)]
pub struct EnemyCtx {
    /// Distance to the player, `None` when the player is dead or gone.
    pub target_distance: Option<f32>,
    pub detection_range: f32,
    pub attack_range: f32,
    pub attack_ready: bool,
    pub attack_cooldown: f32,
    pub state_time: f32,
    pub idle_duration: f32,
    pub wander_duration: f32,
    /// Distance to the current wander target, if any.
    pub wander_remaining: Option<f32>,
    pub arrive_distance: f32,
    pub hurt_duration: f32,
}

impl EnemyCtx {
    fn target_in(&self, range: f32) -> bool {
        self.target_distance.is_some_and(|d| d <= range)
    }

    fn detected(&self) -> bool {
        self.target_in(self.detection_range)
    }

    fn after_engagement(&self) -> EnemyState {
        if self.detected() {
            EnemyState::Chasing
        } else {
            EnemyState::Idle
        }
    }
}

fn stay_dead(state: &EnemyState, _ctx: &EnemyCtx) -> Option<EnemyState> {
    (*state == EnemyState::Dead).then_some(EnemyState::Dead)
}

/// A detected player overrides every non-committed state. A swing in
/// progress is left alone, so `engage` never moves an enemy out of
/// `Attacking`, even when the player steps out of reach.
fn engage(state: &EnemyState, ctx: &EnemyCtx) -> Option<EnemyState> {
    if matches!(state, EnemyState::Hurt | EnemyState::Attacking) || !ctx.detected() {
        return None;
    }
    if ctx.target_in(ctx.attack_range) && ctx.attack_ready {
        Some(EnemyState::Attacking)
    } else {
        Some(EnemyState::Chasing)
    }
}

fn lose_target(state: &EnemyState, ctx: &EnemyCtx) -> Option<EnemyState> {
    (*state == EnemyState::Chasing && !ctx.detected()).then_some(EnemyState::Idle)
}

fn abandon_attack(state: &EnemyState, ctx: &EnemyCtx) -> Option<EnemyState> {
    (*state == EnemyState::Attacking && ctx.target_distance.is_none()).then_some(EnemyState::Idle)
}

fn idle_to_wander(state: &EnemyState, ctx: &EnemyCtx) -> Option<EnemyState> {
    (*state == EnemyState::Idle && ctx.state_time > ctx.idle_duration).then_some(EnemyState::Wandering)
}

fn wander_to_idle(state: &EnemyState, ctx: &EnemyCtx) -> Option<EnemyState> {
    let arrived = ctx.wander_remaining.map_or(true, |d| d < ctx.arrive_distance);
    (*state == EnemyState::Wandering && (ctx.state_time > ctx.wander_duration || arrived))
        .then_some(EnemyState::Idle)
}

fn finish_attack(state: &EnemyState, ctx: &EnemyCtx) -> Option<EnemyState> {
    (*state == EnemyState::Attacking && ctx.state_time > ctx.attack_cooldown)
        .then(|| ctx.after_engagement())
}

fn recover_from_hurt(state: &EnemyState, ctx: &EnemyCtx) -> Option<EnemyState> {
    (*state == EnemyState::Hurt && ctx.state_time > ctx.hurt_duration).then(|| ctx.after_engagement())
}

/// Priority-ordered transition table. `Attacking` only ends through
/// `abandon_attack` or `finish_attack`.
pub const ENEMY_RULES: [Rule<EnemyState, EnemyCtx>; 8] = [
    stay_dead,
    engage,
    lose_target,
    abandon_attack,
    idle_to_wander,
    wander_to_idle,
    finish_attack,
    recover_from_hurt,
];

fn roll(span: Span, rng: &mut impl Rng) -> f32 {
    if span.max > span.min {
        rng.gen_range(span.min..span.max)
    } else {
        span.min
    }
}

/// Position of the player while it is alive.
fn live_target(world: &World) -> Option<(Entity, Vec3)> {
    world
        .query::<(&Player, &Transform, &PlayerFsm)>()
        .iter()
        .find(|(_, (_, _, fsm))| !fsm.is_state(PlayerState::Dead))
        .map(|(entity, (_, transform, _))| (entity, transform.position))
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Drive enemy FSM transitions and their on-enter actions.
pub fn enemy_state_system(world: &mut World, ctx: &mut TickCtx) {
    let target = live_target(world).map(|(_, position)| position);
    let tuning = &ctx.config.enemies.tuning;
    let wander_bound = ctx.config.world.wander_bound;

    for (entity, (enemy, transform, fsm, brain)) in
        world.query_mut::<(&Enemy, &Transform, &mut EnemyFsm, &mut EnemyBrain)>()
    {
        fsm.update(ctx.dt);
        let profile = ctx.config.enemies.profile(enemy.kind);
        let position = transform.position;

        let state = fsm.state();
        let rule_ctx = EnemyCtx {
            target_distance: target.map(|t| planar_distance(position, t)),
            detection_range: profile.detection_range,
            attack_range: profile.attack_range,
            attack_ready: brain.attack_timer <= 0.0,
            attack_cooldown: profile.attack_cooldown,
            state_time: fsm.state_time(),
            idle_duration: brain.idle_duration,
            wander_duration: brain.wander_duration,
            wander_remaining: brain.wander_target.map(|w| planar_distance(position, w)),
            arrive_distance: tuning.arrive_distance,
            hurt_duration: tuning.hurt_duration,
        };

        let Some(next) = first_transition(&ENEMY_RULES, &state, &rule_ctx) else {
            continue;
        };
        if !fsm.change_state(next) {
            continue;
        }

        match next {
            EnemyState::Idle => {
                brain.idle_duration = roll(profile.idle_time, ctx.rng);
                brain.wander_target = None;
            }
            EnemyState::Wandering => {
                let angle = ctx.rng.gen_range(0.0..TAU);
                let reach = ctx.rng.gen_range(0.0..=profile.wander_radius);
                let goal = position + Vec3::new(angle.cos(), 0.0, angle.sin()) * reach;
                brain.wander_target = Some(Vec3::new(
                    goal.x.clamp(-wander_bound, wander_bound),
                    0.0,
                    goal.z.clamp(-wander_bound, wander_bound),
                ));
                brain.wander_duration = roll(profile.wander_time, ctx.rng);
            }
            EnemyState::Attacking => {
                brain.attack_timer = profile.attack_cooldown;
                brain.has_dealt_damage = false;
            }
            EnemyState::Chasing | EnemyState::Hurt | EnemyState::Dead => {}
        }
        log::debug!("{:?} {entity:?} -> {}", enemy.kind, next.tag());
    }
}

/// Per-state movement for every enemy, plus the mid-swing damage window.
pub fn enemy_behavior_system(world: &mut World, ctx: &mut TickCtx) {
    let target = live_target(world);
    let tuning = &ctx.config.enemies.tuning;

    for (entity, (enemy, transform, vel, fsm, brain)) in world
        .query_mut::<(&Enemy, &mut Transform, &mut Velocity, &EnemyFsm, &mut EnemyBrain)>()
    {
        let profile = ctx.config.enemies.profile(enemy.kind);
        brain.attack_timer = (brain.attack_timer - ctx.dt).max(0.0);
        let position = transform.position;

        match fsm.state() {
            EnemyState::Idle => {
                steer(&mut vel.0, Vec3::ZERO, tuning.idle_decel, ctx.dt);
                if ctx.rng.gen::<f32>() < tuning.glance_chance {
                    transform.target_facing += ctx.rng.gen_range(-FRAC_PI_2..FRAC_PI_2);
                }
            }
            EnemyState::Wandering => {
                if let Some(goal) = brain.wander_target {
                    let dir = planar_delta(position, goal).normalize_or_zero();
                    steer(&mut vel.0, dir * profile.speed, tuning.wander_steer, ctx.dt);
                    if let Some(yaw) = yaw_towards(dir) {
                        transform.target_facing = yaw;
                    }
                }
            }
            EnemyState::Chasing => {
                if let Some((_, player_pos)) = target {
                    let dir = planar_delta(position, player_pos).normalize_or_zero();
                    let speed = profile.speed * tuning.chase_multiplier;
                    steer(&mut vel.0, dir * speed, tuning.chase_steer, ctx.dt);
                    if let Some(yaw) = yaw_towards(dir) {
                        transform.target_facing = yaw;
                    }
                }
            }
            EnemyState::Attacking => {
                steer(&mut vel.0, Vec3::ZERO, tuning.attack_decel, ctx.dt);
                let Some((player, player_pos)) = target else {
                    continue;
                };
                if let Some(yaw) = yaw_towards(planar_delta(position, player_pos)) {
                    transform.target_facing = yaw;
                }

                let progress = fsm.state_time() / profile.attack_cooldown;
                if !brain.has_dealt_damage && progress >= tuning.damage_time {
                    brain.has_dealt_damage = true;
                    let reach = profile.attack_range * tuning.reach_factor;
                    if planar_distance(position, player_pos) <= reach {
                        ctx.combat.push(CombatAction::Strike {
                            target: player,
                            amount: profile.attack_damage,
                            source: Some(entity),
                            origin: position,
                        });
                    }
                }
            }
            EnemyState::Hurt => {
                steer(&mut vel.0, Vec3::ZERO, tuning.attack_decel, ctx.dt);
            }
            EnemyState::Dead => {
                vel.0 = Vec3::ZERO;
            }
        }
    }
}
