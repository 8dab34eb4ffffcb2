use glam::Vec3;
use hecs::World;

use crate::components::{
    AbilityKind, KillLedger, Player, PlayerCombat, PlayerFsm, PlayerState, Velocity,
};
use crate::config::{ActionProfile, GameConfig};
use crate::engine::input::{Action, InputState};
use crate::fsm::{first_transition, FsmState, Rule};
use crate::sim::TickCtx;

use super::combat::CombatAction;
use super::steer;

// ---------------------------------------------------------------------------
// PlayerState transition rules
// ---------------------------------------------------------------------------

/// Snapshot handed to every player transition rule.
#[derive(Debug, Clone, Default)]
pub struct PlayerCtx {
    pub moving: bool,
    pub sprinting: bool,
    pub wants_attack: bool,
    pub wants_heal: bool,
    pub wants_shield: bool,
    pub wants_ultimate: bool,
    pub attack_ready: bool,
    pub heal_ready: bool,
    pub shield_ready: bool,
    pub ultimate_ready: bool,
    pub state_time: f32,
    /// Length of the current attack or cast, if the state has one.
    pub action_duration: Option<f32>,
    pub hurt_duration: f32,
}

impl PlayerCtx {
    fn locomotion(&self) -> PlayerState {
        if !self.moving {
            PlayerState::Idle
        } else if self.sprinting {
            PlayerState::Running
        } else {
            PlayerState::Walking
        }
    }
}

fn recover_from_hurt(state: &PlayerState, ctx: &PlayerCtx) -> Option<PlayerState> {
    (*state == PlayerState::Hurt && ctx.state_time > ctx.hurt_duration).then_some(PlayerState::Idle)
}

fn finish_action(state: &PlayerState, ctx: &PlayerCtx) -> Option<PlayerState> {
    let duration = ctx.action_duration?;
    let acting = *state == PlayerState::Attacking || state.is_casting();
    (acting && ctx.state_time > duration).then(|| ctx.locomotion())
}

/// Hurt, attacks, casts and death cannot be interrupted by input.
fn hold_committed(state: &PlayerState, _ctx: &PlayerCtx) -> Option<PlayerState> {
    (!state.is_free()).then_some(*state)
}

fn cast_ultimate(_state: &PlayerState, ctx: &PlayerCtx) -> Option<PlayerState> {
    (ctx.wants_ultimate && ctx.ultimate_ready).then_some(PlayerState::CastingUltimate)
}

fn cast_heal(_state: &PlayerState, ctx: &PlayerCtx) -> Option<PlayerState> {
    (ctx.wants_heal && ctx.heal_ready).then_some(PlayerState::CastingHeal)
}

fn cast_shield(_state: &PlayerState, ctx: &PlayerCtx) -> Option<PlayerState> {
    (ctx.wants_shield && ctx.shield_ready).then_some(PlayerState::CastingShield)
}

fn melee(_state: &PlayerState, ctx: &PlayerCtx) -> Option<PlayerState> {
    (ctx.wants_attack && ctx.attack_ready).then_some(PlayerState::Attacking)
}

fn locomotion(_state: &PlayerState, ctx: &PlayerCtx) -> Option<PlayerState> {
    Some(ctx.locomotion())
}

/// Priority-ordered transition table. Rules past `hold_committed` only run
/// from Idle, Walking or Running.
pub const PLAYER_RULES: [Rule<PlayerState, PlayerCtx>; 8] = [
    recover_from_hurt,
    finish_action,
    hold_committed,
    cast_ultimate,
    cast_heal,
    cast_shield,
    melee,
    locomotion,
];

/// Attack or cast timing for `state`.
pub fn action_profile(state: PlayerState, config: &GameConfig) -> Option<&ActionProfile> {
    let abilities = &config.abilities;
    match state {
        PlayerState::Attacking => Some(&config.player.attack),
        PlayerState::CastingHeal => Some(&abilities.heal.cast),
        PlayerState::CastingShield => Some(&abilities.shield.cast),
        PlayerState::CastingUltimate => Some(&abilities.ultimate.cast),
        _ => None,
    }
}

fn cast_action(ability: AbilityKind) -> Action {
    match ability {
        AbilityKind::Heal => Action::Heal,
        AbilityKind::Shield => Action::Shield,
        AbilityKind::Ultimate => Action::Ultimate,
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Drive player FSM transitions. Runs **before** `player_behavior_system`.
///
/// `fsm.update(dt)` is called first each tick so that a transition's
/// `just_entered` flag stays up for the rest of the tick it fired in.
pub fn player_state_system(world: &mut World, ctx: &mut TickCtx) {
    let input: &InputState = ctx.input;
    for (entity, (_player, fsm, combat, ledger)) in
        world.query_mut::<(&Player, &mut PlayerFsm, &mut PlayerCombat, &mut KillLedger)>()
    {
        // 1. Advance elapsed timer and clear last tick's just_entered flag.
        fsm.update(ctx.dt);

        // 2. Evaluate the rule table against this tick's snapshot.
        let state = fsm.state();
        let rule_ctx = PlayerCtx {
            moving: input.is_moving(),
            sprinting: input.is_held(Action::Run),
            wants_attack: input.is_held(Action::Attack),
            wants_heal: input.is_held(Action::Heal),
            wants_shield: input.is_held(Action::Shield),
            wants_ultimate: input.is_held(Action::Ultimate),
            attack_ready: combat.attack_timer <= 0.0,
            heal_ready: ledger.can_use(AbilityKind::Heal),
            shield_ready: ledger.can_use(AbilityKind::Shield) && !ctx.effects.has_active_shield(entity),
            ultimate_ready: ledger.can_use(AbilityKind::Ultimate),
            state_time: fsm.state_time(),
            action_duration: action_profile(state, ctx.config).map(|p| p.duration),
            hurt_duration: ctx.config.player.hurt_duration,
        };

        if let Some(next) = first_transition(&PLAYER_RULES, &state, &rule_ctx) {
            if fsm.change_state(next) {
                // 3. On-enter actions.
                match next {
                    PlayerState::Attacking => {
                        combat.attack_timer = ctx.config.player.attack.duration;
                        combat.action_fired = false;
                    }
                    _ => {
                        if let Some(ability) = next.ability() {
                            ledger.spend(ability);
                            combat.action_fired = false;
                        }
                    }
                }
                log::debug!("player {entity:?} -> {}", next.tag());
            }
        }

        // 4. Cast requests that went nowhere, logged once per key press.
        for (i, ability) in AbilityKind::ALL.into_iter().enumerate() {
            let held = input.is_held(cast_action(ability));
            if held && !combat.cast_keys[i] && fsm.state().ability() != Some(ability) {
                log::debug!(
                    "{ability:?} request ignored in {} ({} of {} kills)",
                    fsm.state().tag(),
                    ledger.kills_since_use(ability).max(0),
                    ledger.requirement(ability),
                );
            }
            combat.cast_keys[i] = held;
        }
    }
}

/// Steer the player's velocity for the current state and fire the attack or
/// ability once its cast point is reached.
pub fn player_behavior_system(world: &mut World, ctx: &mut TickCtx) {
    let tuning = &ctx.config.player;
    let dir = ctx.input.move_vector();
    let has_input = dir != Vec3::ZERO;

    for (entity, (_player, vel, fsm, combat)) in
        world.query_mut::<(&Player, &mut Velocity, &PlayerFsm, &mut PlayerCombat)>()
    {
        combat.attack_timer = (combat.attack_timer - ctx.dt).max(0.0);
        let state = fsm.state();

        match state {
            PlayerState::Dead => {
                vel.0 = Vec3::ZERO;
                continue;
            }
            PlayerState::Idle | PlayerState::Hurt => {
                steer(&mut vel.0, Vec3::ZERO, tuning.deceleration, ctx.dt);
            }
            PlayerState::Walking => {
                steer(&mut vel.0, dir * tuning.walk_speed, tuning.acceleration, ctx.dt);
            }
            PlayerState::Running => {
                steer(&mut vel.0, dir * tuning.run_speed, tuning.acceleration, ctx.dt);
            }
            PlayerState::Attacking
            | PlayerState::CastingHeal
            | PlayerState::CastingShield
            | PlayerState::CastingUltimate => {
                let Some(profile) = action_profile(state, ctx.config) else {
                    continue;
                };
                if has_input {
                    let target = dir * tuning.walk_speed * profile.move_fraction;
                    steer(&mut vel.0, target, tuning.acceleration * profile.accel_scale, ctx.dt);
                } else {
                    steer(&mut vel.0, Vec3::ZERO, tuning.deceleration * profile.decel_scale, ctx.dt);
                }

                let progress = fsm.state_time() / profile.duration;
                if !combat.action_fired && progress >= profile.cast_point {
                    combat.action_fired = true;
                    let action = match state.ability() {
                        Some(ability) => CombatAction::Cast { caster: entity, ability },
                        None => CombatAction::Melee { attacker: entity },
                    };
                    ctx.combat.push(action);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn idle_ctx() -> PlayerCtx {
        PlayerCtx {
            attack_ready: true,
            heal_ready: true,
            shield_ready: true,
            ultimate_ready: true,
            hurt_duration: 0.5,
            ..PlayerCtx::default()
        }
    }

    fn next(state: PlayerState, ctx: &PlayerCtx) -> Option<PlayerState> {
        first_transition(&PLAYER_RULES, &state, ctx)
    }

    #[rstest]
    #[case(false, false, PlayerState::Idle)]
    #[case(true, false, PlayerState::Walking)]
    #[case(true, true, PlayerState::Running)]
    fn locomotion_follows_input(#[case] moving: bool, #[case] sprinting: bool, #[case] expected: PlayerState) {
        let ctx = PlayerCtx { moving, sprinting, ..idle_ctx() };
        for from in [PlayerState::Idle, PlayerState::Walking, PlayerState::Running] {
            assert_eq!(next(from, &ctx), Some(expected));
        }
    }

    #[test]
    fn ultimate_outranks_other_commands() {
        let ctx = PlayerCtx {
            wants_attack: true,
            wants_heal: true,
            wants_shield: true,
            wants_ultimate: true,
            moving: true,
            ..idle_ctx()
        };
        assert_eq!(next(PlayerState::Walking, &ctx), Some(PlayerState::CastingUltimate));

        let ctx = PlayerCtx { ultimate_ready: false, ..ctx };
        assert_eq!(next(PlayerState::Walking, &ctx), Some(PlayerState::CastingHeal));

        let ctx = PlayerCtx { heal_ready: false, ..ctx };
        assert_eq!(next(PlayerState::Walking, &ctx), Some(PlayerState::CastingShield));

        let ctx = PlayerCtx { shield_ready: false, ..ctx };
        assert_eq!(next(PlayerState::Walking, &ctx), Some(PlayerState::Attacking));

        let ctx = PlayerCtx { attack_ready: false, ..ctx };
        assert_eq!(next(PlayerState::Walking, &ctx), Some(PlayerState::Walking));
    }

    #[test]
    fn committed_states_ignore_input() {
        let ctx = PlayerCtx {
            wants_ultimate: true,
            moving: true,
            state_time: 0.3,
            action_duration: Some(1.2),
            ..idle_ctx()
        };
        for state in [PlayerState::CastingHeal, PlayerState::Attacking, PlayerState::Hurt] {
            assert_eq!(next(state, &ctx), Some(state));
        }
        assert_eq!(next(PlayerState::Dead, &ctx), Some(PlayerState::Dead));
    }

    #[test]
    fn action_ends_after_its_duration() {
        let ctx = PlayerCtx {
            moving: true,
            state_time: 1.25,
            action_duration: Some(1.2),
            ..idle_ctx()
        };
        assert_eq!(next(PlayerState::CastingShield, &ctx), Some(PlayerState::Walking));
    }

    #[test]
    fn hurt_recovers_to_idle() {
        let ctx = PlayerCtx { state_time: 0.51, ..idle_ctx() };
        assert_eq!(next(PlayerState::Hurt, &ctx), Some(PlayerState::Idle));
    }
}
