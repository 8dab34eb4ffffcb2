//! Notifications flowing from the simulation to the presentation layer.
//!
//! Systems push [`GameEvent`]s onto an [`EventQueue`] during the tick; the
//! queue is drained into a [`Presenter`] once the tick has finished, so the
//! presenter always observes a consistent world.

use glam::Vec3;
use hecs::Entity;

use crate::components::{AbilityKind, EnemyKind};
use crate::effects::EffectId;

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// An actor's state machine entered a new state this tick.
    StateEntered { actor: Entity, state: &'static str },
    /// Play the clip for `clip` on `actor`.
    AnimationRequested { actor: Entity, clip: &'static str, looped: bool },
    DamageDealt { target: Entity, amount: u32, source: Option<Entity> },
    /// A shield absorbed a hit aimed at `target`.
    HitBlocked { target: Entity, source: Option<Entity> },
    Healed { target: Entity, amount: u32 },
    Died { actor: Entity },
    Killed { killer: Entity, victim: Entity, points: u64 },
    AbilityReady { ability: AbilityKind },
    EffectSpawned { id: EffectId, kind: &'static str },
    EffectExpired { id: EffectId, kind: &'static str },
    EnemySpawned { actor: Entity, kind: EnemyKind, position: Vec3 },
    Despawned { actor: Entity },
    GameOver { score: u64, kills: u32 },
}

#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, GameEvent> {
        self.events.drain(..)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// The presentation collaborator: renderer, animation player, HUD.
///
/// Every method has a no-op default so a presenter only implements what it
/// cares about.
pub trait Presenter {
    /// Start `clip` on `actor`. Return `false` when no such clip exists.
    fn request_animation(&mut self, _actor: Entity, _clip: &str, _looped: bool) -> bool {
        true
    }

    fn on_damage_dealt(&mut self, _target: Entity, _amount: u32) {}

    fn on_death(&mut self, _actor: Entity) {}

    fn on_kill(&mut self, _killer: Entity) {}

    fn on_game_over(&mut self, _score: u64, _kills: u32) {}

    /// Sees every event, after the specific callbacks above.
    fn on_event(&mut self, _event: &GameEvent) {}
}

/// Clip played when an actor's own clip is missing.
pub const FALLBACK_CLIP: &str = "idle";

/// Hand every queued event to `presenter`.
pub fn dispatch(queue: &mut EventQueue, presenter: &mut impl Presenter) {
    for event in queue.drain() {
        match &event {
            GameEvent::AnimationRequested { actor, clip, looped } => {
                if !presenter.request_animation(*actor, clip, *looped) && *clip != FALLBACK_CLIP {
                    log::debug!("no clip `{clip}` for {actor:?}, falling back to `{FALLBACK_CLIP}`");
                    presenter.request_animation(*actor, FALLBACK_CLIP, true);
                }
            }
            GameEvent::DamageDealt { target, amount, .. } => presenter.on_damage_dealt(*target, *amount),
            GameEvent::Died { actor } => presenter.on_death(*actor),
            GameEvent::Killed { killer, .. } => presenter.on_kill(*killer),
            GameEvent::GameOver { score, kills } => presenter.on_game_over(*score, *kills),
            _ => {}
        }
        presenter.on_event(&event);
    }
}

/// Presenter that keeps everything it is told. Used by tests and replays.
#[derive(Debug, Default)]
pub struct EventLog {
    pub events: Vec<GameEvent>,
    /// Clips this presenter pretends not to have.
    pub missing_clips: Vec<&'static str>,
    /// Every clip actually started, after fallbacks.
    pub animations: Vec<(Entity, String)>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, predicate: impl Fn(&GameEvent) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }
}

impl Presenter for EventLog {
    fn request_animation(&mut self, actor: Entity, clip: &str, _looped: bool) -> bool {
        if self.missing_clips.iter().any(|missing| *missing == clip) {
            return false;
        }
        self.animations.push((actor, clip.to_owned()));
        true
    }

    fn on_event(&mut self, event: &GameEvent) {
        self.events.push(event.clone());
    }
}

/// Presenter for the headless runner: reports notable events through `log`.
#[derive(Debug, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn on_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Killed { victim, points, .. } => log::info!("killed {victim:?} (+{points})"),
            GameEvent::EnemySpawned { kind, position, .. } => {
                log::info!("{kind:?} spawned at ({:.1}, {:.1})", position.x, position.z)
            }
            GameEvent::AbilityReady { ability } => log::info!("{ability:?} ready"),
            GameEvent::GameOver { score, kills } => log::info!("game over: score {score}, kills {kills}"),
            GameEvent::StateEntered { .. } | GameEvent::AnimationRequested { .. } => {
                log::trace!("{event:?}")
            }
            _ => log::debug!("{event:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;

    #[test]
    fn missing_clip_falls_back_to_idle() {
        let actor = World::new().spawn(());
        let mut queue = EventQueue::new();
        queue.push(GameEvent::AnimationRequested { actor, clip: "casting_heal", looped: false });

        let mut presenter = EventLog { missing_clips: vec!["casting_heal"], ..EventLog::default() };
        dispatch(&mut queue, &mut presenter);

        assert_eq!(presenter.animations, vec![(actor, FALLBACK_CLIP.to_owned())]);
        assert!(queue.is_empty());
    }

    #[test]
    fn specific_callbacks_run_before_on_event() {
        #[derive(Default)]
        struct Counter {
            damage: u32,
            kills: u32,
            seen: usize,
        }
        impl Presenter for Counter {
            fn on_damage_dealt(&mut self, _target: Entity, amount: u32) {
                self.damage += amount;
            }
            fn on_kill(&mut self, _killer: Entity) {
                self.kills += 1;
            }
            fn on_event(&mut self, _event: &GameEvent) {
                self.seen += 1;
            }
        }

        let mut world = World::new();
        let (a, b) = (world.spawn(()), world.spawn(()));
        let mut queue = EventQueue::new();
        queue.push(GameEvent::DamageDealt { target: b, amount: 25, source: Some(a) });
        queue.push(GameEvent::Killed { killer: a, victim: b, points: 100 });

        let mut counter = Counter::default();
        dispatch(&mut queue, &mut counter);
        assert_eq!((counter.damage, counter.kills, counter.seen), (25, 1, 2));
    }
}
