//! Combat resolver: applies every hit, heal and cast queued during a tick.

use std::collections::VecDeque;

use glam::Vec3;
use hecs::{Entity, World};

use crate::components::{
    planar_delta, planar_distance, AbilityKind, Enemy, EnemyFsm, EnemyState, Health, KillLedger,
    Player, PlayerFsm, PlayerState, Transform, Velocity,
};
use crate::effects::{EffectKind, FireWall, Lifetime};
use crate::events::GameEvent;
use crate::schedule::Scheduled;
use crate::sim::TickCtx;

#[derive(Debug, Clone, PartialEq)]
pub enum CombatAction {
    /// Melee swing reaching its damage frame.
    Melee { attacker: Entity },
    /// Damage aimed at one actor. Knockback pushes away from `origin`.
    Strike { target: Entity, amount: u32, source: Option<Entity>, origin: Vec3 },
    /// A cast reaching its cast point.
    Cast { caster: Entity, ability: AbilityKind },
}

#[derive(Debug, Default)]
pub struct CombatQueue {
    pending: VecDeque<CombatAction>,
}

impl CombatQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: CombatAction) {
        self.pending.push_back(action);
    }

    pub fn pop(&mut self) -> Option<CombatAction> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Resolve everything queued this tick, including strikes produced while
/// resolving (a melee swing expands into one strike per enemy hit).
pub fn combat_system(world: &mut World, ctx: &mut TickCtx) {
    while let Some(action) = ctx.combat.pop() {
        match action {
            CombatAction::Melee { attacker } => resolve_melee(world, ctx, attacker),
            CombatAction::Strike { target, amount, source, origin } => {
                if world.get::<&Player>(target).is_ok() {
                    damage_player(world, ctx, target, amount, source);
                } else {
                    damage_enemy(world, ctx, target, amount, source, origin);
                }
            }
            CombatAction::Cast { caster, ability } => resolve_cast(world, ctx, caster, ability),
        }
    }
}

/// Queue a strike on every live enemy within range and inside the
/// attacker's forward cone.
fn resolve_melee(world: &World, ctx: &mut TickCtx, attacker: Entity) {
    let Ok(transform) = world.get::<&Transform>(attacker).map(|t| *t) else {
        return;
    };
    let tuning = &ctx.config.player;
    let forward = transform.forward();

    for (enemy, (_enemy, enemy_transform, fsm)) in
        world.query::<(&Enemy, &Transform, &EnemyFsm)>().iter()
    {
        if fsm.is_state(EnemyState::Dead) {
            continue;
        }
        let to_enemy = planar_delta(transform.position, enemy_transform.position);
        let distance = planar_distance(transform.position, enemy_transform.position);
        let in_cone = forward.dot(to_enemy.normalize_or_zero()) > tuning.attack_cone_dot;
        if distance <= tuning.attack_range && in_cone {
            ctx.combat.push(CombatAction::Strike {
                target: enemy,
                amount: tuning.attack_damage,
                source: Some(attacker),
                origin: transform.position,
            });
        }
    }
}

/// Damage intake for the player: an active shield eats the hit, otherwise
/// health drops and the player staggers or dies.
fn damage_player(world: &mut World, ctx: &mut TickCtx, target: Entity, amount: u32, source: Option<Entity>) {
    let Ok((health, fsm, vel, ledger)) =
        world.query_one_mut::<(&mut Health, &mut PlayerFsm, &mut Velocity, &mut KillLedger)>(target)
    else {
        return;
    };
    if fsm.is_state(PlayerState::Dead) {
        return;
    }

    if let Some(shield) = ctx.effects.active_shield_mut(target) {
        shield.dispose();
        ledger.spend(AbilityKind::Shield);
        ctx.events.push(GameEvent::HitBlocked { target, source });
        log::debug!("shield absorbed {amount} damage");
        return;
    }

    let lost = health.take(amount);
    ctx.events.push(GameEvent::DamageDealt { target, amount: lost, source });

    if health.is_depleted() {
        fsm.change_state(PlayerState::Dead);
        vel.0 = Vec3::ZERO;
        ctx.events.push(GameEvent::Died { actor: target });
        let delay = f64::from(ctx.config.player.defeat_report_delay);
        ctx.scheduler.schedule(ctx.now + delay, Scheduled::ReportGameOver);
        log::info!("player defeated ({} kills, score {})", ledger.kills, ledger.score);
    } else {
        fsm.change_state(PlayerState::Hurt);
    }
}

fn damage_enemy(
    world: &mut World,
    ctx: &mut TickCtx,
    target: Entity,
    amount: u32,
    source: Option<Entity>,
    origin: Vec3,
) {
    let enemies = &ctx.config.enemies;
    let Ok((enemy, transform, health, fsm, vel)) = world
        .query_one_mut::<(&Enemy, &Transform, &mut Health, &mut EnemyFsm, &mut Velocity)>(target)
    else {
        return;
    };
    if fsm.is_state(EnemyState::Dead) {
        return;
    }

    let lost = health.take(amount);
    ctx.events.push(GameEvent::DamageDealt { target, amount: lost, source });

    if !health.is_depleted() {
        fsm.change_state(EnemyState::Hurt);
        let away = planar_delta(origin, transform.position).normalize_or_zero();
        vel.0 += away * enemies.tuning.knockback;
        return;
    }

    fsm.change_state(EnemyState::Dead);
    vel.0 = Vec3::ZERO;
    let points = enemies.profile(enemy.kind).points;
    log::info!("{:?} {target:?} died", enemy.kind);
    ctx.events.push(GameEvent::Died { actor: target });
    let despawn_at = ctx.now + f64::from(enemies.tuning.sink_duration);
    ctx.scheduler.schedule(despawn_at, Scheduled::Despawn(target));

    let Some(killer) = source else {
        return;
    };
    if let Ok(mut ledger) = world.get::<&mut KillLedger>(killer) {
        let unlocked = ledger.record_kill(points);
        ctx.events.push(GameEvent::Killed { killer, victim: target, points });
        for ability in unlocked {
            ctx.events.push(GameEvent::AbilityReady { ability });
        }
    }
}

fn resolve_cast(world: &mut World, ctx: &mut TickCtx, caster: Entity, ability: AbilityKind) {
    let Ok(transform) = world.get::<&Transform>(caster).map(|t| *t) else {
        return;
    };
    let abilities = &ctx.config.abilities;

    let (kind, lifetime) = match ability {
        AbilityKind::Heal => {
            let amount = abilities.heal.amount;
            if let Ok(mut health) = world.get::<&mut Health>(caster) {
                let restored = health.heal(amount);
                ctx.events.push(GameEvent::Healed { target: caster, amount: restored });
            }
            let pulse = EffectKind::HealPulse { owner: caster, anchor: transform.position, amount };
            (pulse, Lifetime::Timed(abilities.heal.pulse_duration))
        }
        AbilityKind::Shield => {
            if ctx.effects.has_active_shield(caster) {
                log::debug!("shield already up, cast fizzles");
                return;
            }
            let shield = EffectKind::IceShield {
                owner: caster,
                anchor: transform.position,
                radius: abilities.shield.radius,
            };
            (shield, Lifetime::UntilConsumed)
        }
        AbilityKind::Ultimate => {
            let wall = &abilities.ultimate;
            let direction = transform.forward();
            let fire_wall = FireWall {
                owner: caster,
                position: transform.position + direction * wall.spawn_distance,
                direction,
                speed: wall.speed,
                range: wall.range,
                travelled: 0.0,
                damage: wall.damage,
                width: wall.width,
                height: wall.height,
                depth: wall.depth,
            };
            (EffectKind::FireWall(fire_wall), Lifetime::Timed(wall.duration))
        }
    };

    let label = kind.label();
    let id = ctx.effects.spawn(kind, lifetime, ctx.now);
    if ability == AbilityKind::Heal {
        // The owner was healed above; the pulse must never heal it again.
        if let Some(pulse) = ctx.effects.get_mut(id) {
            pulse.try_hit(caster);
        }
    }
    ctx.events.push(GameEvent::EffectSpawned { id, kind: label });
    log::debug!("{ability:?} cast by {caster:?}");
}
