use glam::Vec3;
use hecs::{Entity, World};

use crate::components::{Enemy, EnemyFsm, EnemyState, Transform};
use crate::effects::{Aabb, Effect, EffectKind};
use crate::events::GameEvent;
use crate::sim::TickCtx;

use super::combat::CombatAction;

/// Move the wall and collect every enemy its box overlaps. Returns `None`
/// once the wall has burned out.
fn advance_fire_wall(effect: &mut Effect, dt: f32, enemies: &[(Entity, Aabb)]) -> Option<Vec<Entity>> {
    let EffectKind::FireWall(wall) = &mut effect.kind else {
        return Some(Vec::new());
    };
    let step = wall.speed * dt;
    wall.travelled += step;
    if wall.travelled >= wall.range {
        return None;
    }
    wall.position += wall.direction * step;

    let bounds = wall.bounds();
    Some(
        enemies
            .iter()
            .filter(|(_, hitbox)| bounds.intersects(hitbox))
            .map(|&(enemy, _)| enemy)
            .collect(),
    )
}

/// Keep an anchored effect on its owner. An effect whose owner is gone is
/// disposed.
fn follow_owner(effect: &mut Effect, world: &World) {
    let owner = effect.kind.owner();
    let Ok(position) = world.get::<&Transform>(owner).map(|t| t.position) else {
        effect.dispose();
        return;
    };
    if let EffectKind::HealPulse { anchor, .. } | EffectKind::IceShield { anchor, .. } = &mut effect.kind {
        *anchor = position;
    }
}

/// Advance every live effect: anchored effects follow their owner, fire
/// walls travel and burn whatever they touch (once per enemy), and
/// expired or consumed effects are swept away.
pub fn effect_system(world: &mut World, ctx: &mut TickCtx) {
    let hitbox = Vec3::from(ctx.config.enemies.tuning.hitbox);
    let enemies: Vec<(Entity, Aabb)> = world
        .query::<(&Enemy, &Transform, &EnemyFsm)>()
        .iter()
        .filter(|(_, (_, _, fsm))| !fsm.is_state(EnemyState::Dead))
        .map(|(entity, (_, transform, _))| {
            let center = transform.position + Vec3::new(0.0, hitbox.y * 0.5, 0.0);
            (entity, Aabb::from_center_size(center, hitbox))
        })
        .collect();

    for effect in ctx.effects.iter_mut() {
        if effect.is_disposed() {
            continue;
        }

        if let EffectKind::FireWall(wall) = &effect.kind {
            let (owner, damage) = (wall.owner, wall.damage);
            match advance_fire_wall(effect, ctx.dt, &enemies) {
                None => {
                    log::debug!("fire wall {} burned out", effect.id);
                    effect.dispose();
                }
                Some(hits) => {
                    let origin = match &effect.kind {
                        EffectKind::FireWall(wall) => wall.position,
                        _ => Vec3::ZERO,
                    };
                    for enemy in hits {
                        if effect.try_hit(enemy) {
                            ctx.combat.push(CombatAction::Strike {
                                target: enemy,
                                amount: damage,
                                source: Some(owner),
                                origin,
                            });
                        }
                    }
                }
            }
        } else {
            follow_owner(effect, world);
        }

        effect.advance(ctx.dt);
    }

    for effect in ctx.effects.sweep() {
        ctx.events.push(GameEvent::EffectExpired { id: effect.id, kind: effect.kind.label() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{EffectStore, FireWall, Lifetime};

    fn wall(owner: Entity) -> EffectKind {
        EffectKind::FireWall(FireWall {
            owner,
            position: Vec3::ZERO,
            direction: Vec3::Z,
            speed: 15.0,
            range: 15.0,
            travelled: 0.0,
            damage: 100,
            width: 8.0,
            height: 4.0,
            depth: 2.0,
        })
    }

    #[test]
    fn wall_burns_out_at_its_range() {
        let mut world = World::new();
        let owner = world.spawn(());
        let mut store = EffectStore::new();
        let id = store.spawn(wall(owner), Lifetime::Timed(3.0), 0.0);
        let effect = store.get_mut(id).unwrap();

        assert!(advance_fire_wall(effect, 0.5, &[]).is_some());
        assert!(advance_fire_wall(effect, 0.4, &[]).is_some());
        assert!(advance_fire_wall(effect, 0.5, &[]).is_none());
    }

    #[test]
    fn wall_reports_overlapping_hitboxes() {
        let mut world = World::new();
        let owner = world.spawn(());
        let near = world.spawn(());
        let far = world.spawn(());
        let mut store = EffectStore::new();
        let id = store.spawn(wall(owner), Lifetime::Timed(3.0), 0.0);
        let effect = store.get_mut(id).unwrap();

        let size = Vec3::new(2.0, 3.0, 2.0);
        let enemies = [
            (near, Aabb::from_center_size(Vec3::new(1.0, 1.5, 2.0), size)),
            (far, Aabb::from_center_size(Vec3::new(1.0, 1.5, 12.0), size)),
        ];
        let hits = advance_fire_wall(effect, 0.1, &enemies).unwrap();
        assert_eq!(hits, vec![near]);
    }

    #[test]
    fn orphaned_anchor_is_disposed() {
        let mut world = World::new();
        let owner = world.spawn((Transform::at(Vec3::new(3.0, 0.0, 4.0)),));
        let mut store = EffectStore::new();
        let kind = EffectKind::IceShield { owner, anchor: Vec3::ZERO, radius: 3.0 };
        let id = store.spawn(kind, Lifetime::UntilConsumed, 0.0);

        follow_owner(store.get_mut(id).unwrap(), &world);
        let effect = store.get(id).unwrap();
        assert!(matches!(effect.kind, EffectKind::IceShield { anchor, .. } if anchor == Vec3::new(3.0, 0.0, 4.0)));

        world.despawn(owner).unwrap();
        follow_owner(store.get_mut(id).unwrap(), &world);
        assert!(store.get(id).unwrap().is_disposed());
    }
}
