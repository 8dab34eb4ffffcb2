//! Ability effect instances: logic only, visuals belong to the presenter.

use std::collections::HashSet;

use glam::Vec3;
use hecs::Entity;

pub type EffectId = u64;

/// Axis-aligned box used for effect overlap tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lifetime {
    /// Seconds until automatic removal.
    Timed(f32),
    /// Lives until something consumes it (a shield blocking a hit).
    UntilConsumed,
}

/// A wall of fire sliding along the ground away from its caster.
#[derive(Debug, Clone, PartialEq)]
pub struct FireWall {
    pub owner: Entity,
    pub position: Vec3,
    /// Unit travel direction on the ground plane.
    pub direction: Vec3,
    pub speed: f32,
    /// Travel distance after which the wall burns out.
    pub range: f32,
    pub travelled: f32,
    pub damage: u32,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl FireWall {
    /// Box enclosing the wall. The wall is `width` across its travel direction
    /// and `depth` along it; rotated walls get the enclosing axis-aligned box.
    pub fn bounds(&self) -> Aabb {
        let dx = self.direction.x.abs();
        let dz = self.direction.z.abs();
        let half_x = dx * self.depth * 0.5 + dz * self.width * 0.5;
        let half_z = dz * self.depth * 0.5 + dx * self.width * 0.5;
        Aabb {
            min: Vec3::new(self.position.x - half_x, 0.0, self.position.z - half_z),
            max: Vec3::new(self.position.x + half_x, self.height, self.position.z + half_z),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EffectKind {
    /// Healing burst that stays around the caster while it fades.
    HealPulse { owner: Entity, anchor: Vec3, amount: u32 },
    /// Blocks exactly one incoming hit on its owner.
    IceShield { owner: Entity, anchor: Vec3, radius: f32 },
    FireWall(FireWall),
}

impl EffectKind {
    pub fn owner(&self) -> Entity {
        match self {
            EffectKind::HealPulse { owner, .. } | EffectKind::IceShield { owner, .. } => *owner,
            EffectKind::FireWall(wall) => wall.owner,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EffectKind::HealPulse { .. } => "heal_pulse",
            EffectKind::IceShield { .. } => "ice_shield",
            EffectKind::FireWall(_) => "fire_wall",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Effect {
    pub id: EffectId,
    pub kind: EffectKind,
    /// Simulation time of creation.
    pub started_at: f64,
    pub elapsed: f32,
    pub lifetime: Lifetime,
    /// Actors this effect has already acted on. Only ever grows.
    hit_set: HashSet<Entity>,
    disposed: bool,
}

impl Effect {
    /// Record `target` as affected. Returns `false` when it was affected
    /// before or the effect is already inert, in which case nothing may be
    /// applied.
    pub fn try_hit(&mut self, target: Entity) -> bool {
        !self.disposed && self.hit_set.insert(target)
    }

    pub fn has_hit(&self, target: Entity) -> bool {
        self.hit_set.contains(&target)
    }

    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
        if let Lifetime::Timed(duration) = self.lifetime {
            if self.elapsed > duration {
                self.disposed = true;
            }
        }
    }
}

/// Owns every live effect instance.
#[derive(Debug, Default)]
pub struct EffectStore {
    next_id: EffectId,
    effects: Vec<Effect>,
}

impl EffectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, kind: EffectKind, lifetime: Lifetime, now: f64) -> EffectId {
        self.next_id += 1;
        let id = self.next_id;
        self.effects.push(Effect {
            id,
            kind,
            started_at: now,
            elapsed: 0.0,
            lifetime,
            hit_set: HashSet::new(),
            disposed: false,
        });
        id
    }

    pub fn get(&self, id: EffectId) -> Option<&Effect> {
        self.effects.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EffectId) -> Option<&mut Effect> {
        self.effects.iter_mut().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Effect> {
        self.effects.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// The owner's shield that is still waiting to block a hit.
    pub fn active_shield_mut(&mut self, owner: Entity) -> Option<&mut Effect> {
        self.effects.iter_mut().find(|e| {
            !e.disposed && matches!(e.kind, EffectKind::IceShield { owner: o, .. } if o == owner)
        })
    }

    pub fn has_active_shield(&self, owner: Entity) -> bool {
        self.effects.iter().any(|e| {
            !e.disposed && matches!(e.kind, EffectKind::IceShield { owner: o, .. } if o == owner)
        })
    }

    /// Remove disposed effects and hand them back to the caller.
    pub fn sweep(&mut self) -> Vec<Effect> {
        let (gone, kept): (Vec<_>, Vec<_>) = self.effects.drain(..).partition(|e| e.disposed);
        self.effects = kept;
        gone
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;

    fn entities(n: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..n).map(|_| world.spawn(())).collect()
    }

    fn wall(owner: Entity, direction: Vec3) -> FireWall {
        FireWall {
            owner,
            position: Vec3::ZERO,
            direction,
            speed: 15.0,
            range: 15.0,
            travelled: 0.0,
            damage: 100,
            width: 8.0,
            height: 4.0,
            depth: 2.0,
        }
    }

    #[test]
    fn hit_set_allows_each_target_once() {
        let ids = entities(3);
        let mut store = EffectStore::new();
        let id = store.spawn(EffectKind::FireWall(wall(ids[0], Vec3::Z)), Lifetime::Timed(3.0), 0.0);
        let effect = store.get_mut(id).unwrap();

        assert!(effect.try_hit(ids[1]));
        assert!(!effect.try_hit(ids[1]));
        assert!(effect.try_hit(ids[2]));
        effect.dispose();
        assert!(!effect.try_hit(ids[0]));
        assert!(effect.has_hit(ids[1]));
    }

    #[test]
    fn timed_effect_expires_after_duration() {
        let ids = entities(1);
        let mut store = EffectStore::new();
        let kind = EffectKind::HealPulse { owner: ids[0], anchor: Vec3::ZERO, amount: 30 };
        store.spawn(kind, Lifetime::Timed(1.0), 0.0);

        store.iter_mut().for_each(|e| e.advance(1.0));
        assert!(store.sweep().is_empty());
        store.iter_mut().for_each(|e| e.advance(0.1));
        assert_eq!(store.sweep().len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn shield_lives_until_consumed() {
        let ids = entities(1);
        let mut store = EffectStore::new();
        let kind = EffectKind::IceShield { owner: ids[0], anchor: Vec3::ZERO, radius: 3.0 };
        store.spawn(kind, Lifetime::UntilConsumed, 0.0);

        store.iter_mut().for_each(|e| e.advance(1000.0));
        assert!(store.has_active_shield(ids[0]));
        store.active_shield_mut(ids[0]).unwrap().dispose();
        assert!(!store.has_active_shield(ids[0]));
        assert_eq!(store.sweep().len(), 1);
    }

    #[test]
    fn wall_bounds_rotate_with_direction() {
        let ids = entities(1);
        let along_z = wall(ids[0], Vec3::Z).bounds();
        assert_eq!(along_z.max.x, 4.0);
        assert_eq!(along_z.max.z, 1.0);
        assert_eq!(along_z.max.y, 4.0);

        let along_x = wall(ids[0], Vec3::X).bounds();
        assert_eq!(along_x.max.x, 1.0);
        assert_eq!(along_x.max.z, 4.0);
    }

    #[test]
    fn aabb_overlap() {
        let a = Aabb::from_center_size(Vec3::ZERO, Vec3::splat(2.0));
        let b = Aabb::from_center_size(Vec3::new(1.5, 0.0, 0.0), Vec3::splat(2.0));
        let c = Aabb::from_center_size(Vec3::new(3.5, 0.0, 0.0), Vec3::splat(2.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
