//! The simulation context: owns the ECS world and every registry the
//! systems share, and runs them in a fixed order once per tick.

use glam::Vec3;
use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::components::{
    EnemyFsm, EnemyKind, EnemyState, Health, KillLedger, PlayerFsm, PlayerState, Transform,
};
use crate::config::GameConfig;
use crate::effects::{Effect, EffectStore};
use crate::engine::input::InputState;
use crate::engine::time::SimClock;
use crate::events::{dispatch, EventQueue, GameEvent, Presenter};
use crate::obstacles::{ObstacleContact, ObstacleRegistry};
use crate::scene::{self, forest};
use crate::schedule::{Scheduled, Scheduler};
use crate::systems::{
    animation_system, combat_system, effect_system, enemy_behavior_system, enemy_state_system,
    physics_system, player_behavior_system, player_state_system, spawn_enemy_near,
    CombatQueue,
};

/// Everything a system may touch besides the world, borrowed for one tick.
pub struct TickCtx<'a> {
    pub dt: f32,
    /// Simulation time at the start of this tick.
    pub now: f64,
    pub config: &'a GameConfig,
    pub input: &'a InputState,
    pub obstacles: &'a ObstacleRegistry,
    pub effects: &'a mut EffectStore,
    pub rng: &'a mut ChaCha8Rng,
    pub events: &'a mut EventQueue,
    pub combat: &'a mut CombatQueue,
    pub scheduler: &'a mut Scheduler,
}

pub struct Simulation {
    world: World,
    config: GameConfig,
    obstacles: ObstacleRegistry,
    effects: EffectStore,
    rng: ChaCha8Rng,
    clock: SimClock,
    events: EventQueue,
    combat: CombatQueue,
    scheduler: Scheduler,
    player: Entity,
    paused: bool,
    auto_spawn: bool,
    spawn_timer: f32,
    game_over: bool,
}

impl Simulation {
    /// An empty arena: the player at the origin, no trees and no enemies.
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let mut world = World::new();
        let mut events = EventQueue::new();
        let player = scene::spawn_player(&mut world, &config);
        animation_system(&mut world, &mut events);

        Self {
            world,
            config,
            obstacles: ObstacleRegistry::new(),
            effects: EffectStore::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            clock: SimClock::new(),
            events,
            combat: CombatQueue::new(),
            scheduler: Scheduler::new(),
            player,
            paused: false,
            auto_spawn: false,
            spawn_timer: 0.0,
            game_over: false,
        }
    }

    /// Grow the forest, spawn the opening wave and turn on periodic spawning.
    pub fn populate(&mut self) {
        let planted = forest::scatter_trees(
            &mut self.obstacles,
            &self.config.forest,
            &self.config.world,
            &mut self.rng,
        );
        log::info!("forest planted with {planted} trees");
        self.spawn_opening_wave();
        animation_system(&mut self.world, &mut self.events);
        self.auto_spawn = true;
    }

    /// Start a fresh run in the same forest.
    pub fn restart(&mut self) {
        self.world.clear();
        self.effects.clear();
        self.scheduler.clear();
        self.combat.clear();
        self.events.clear();
        self.spawn_timer = 0.0;
        self.game_over = false;
        self.paused = false;

        self.player = scene::spawn_player(&mut self.world, &self.config);
        if self.auto_spawn {
            self.spawn_opening_wave();
        }
        animation_system(&mut self.world, &mut self.events);
        log::info!("run restarted");
    }

    fn spawn_opening_wave(&mut self) {
        for _ in 0..self.config.spawn.initial_enemies {
            spawn_enemy_near(
                &mut self.world,
                &self.config,
                &self.obstacles,
                &mut self.rng,
                &mut self.events,
            );
        }
    }

    /// Advance the simulation by `dt` seconds and report to `presenter`.
    pub fn tick(&mut self, dt: f32, input: &InputState, presenter: &mut impl Presenter) {
        if self.paused {
            return;
        }

        self.clock.advance(dt);
        self.run_scheduled();

        let mut ctx = TickCtx {
            dt,
            now: self.clock.elapsed,
            config: &self.config,
            input,
            obstacles: &self.obstacles,
            effects: &mut self.effects,
            rng: &mut self.rng,
            events: &mut self.events,
            combat: &mut self.combat,
            scheduler: &mut self.scheduler,
        };

        player_state_system(&mut self.world, &mut ctx);
        enemy_state_system(&mut self.world, &mut ctx);
        player_behavior_system(&mut self.world, &mut ctx);
        enemy_behavior_system(&mut self.world, &mut ctx);
        physics_system(&mut self.world, &mut ctx);
        effect_system(&mut self.world, &mut ctx);
        combat_system(&mut self.world, &mut ctx);

        if self.auto_spawn && !self.game_over {
            self.spawn_timer += dt;
            if self.spawn_timer >= self.config.spawn.interval {
                self.spawn_timer = 0.0;
                let live = self
                    .world
                    .query::<&EnemyFsm>()
                    .iter()
                    .filter(|(_, fsm)| !fsm.is_state(EnemyState::Dead))
                    .count();
                if live < self.config.spawn.max_enemies {
                    spawn_enemy_near(&mut self.world, ctx.config, ctx.obstacles, ctx.rng, ctx.events);
                }
            }
        }

        animation_system(&mut self.world, ctx.events);
        dispatch(&mut self.events, presenter);
    }

    /// Between-tick pass: remove finished corpses, report a lost run.
    fn run_scheduled(&mut self) {
        for item in self.scheduler.drain_due(self.clock.elapsed) {
            match item {
                Scheduled::Despawn(actor) => {
                    if self.world.despawn(actor).is_ok() {
                        self.events.push(GameEvent::Despawned { actor });
                    }
                }
                Scheduled::ReportGameOver => {
                    let (score, kills) = self
                        .world
                        .get::<&KillLedger>(self.player)
                        .map(|l| (l.score, l.kills))
                        .unwrap_or_default();
                    self.game_over = true;
                    self.events.push(GameEvent::GameOver { score, kills });
                }
            }
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Spawn `kind` at `position`, or at the nearest spot clear of trees.
    pub fn spawn_enemy(&mut self, kind: EnemyKind, position: Vec3) -> Entity {
        let radius = self.config.enemies.profile(kind).collision_radius;
        let position = self.obstacles.find_nearest_free_position(position, radius);
        let actor = scene::spawn_enemy(&mut self.world, &self.config, kind, position);
        self.events.push(GameEvent::EnemySpawned { actor, kind, position });
        animation_system(&mut self.world, &mut self.events);
        actor
    }

    pub fn add_obstacle(&mut self, position: Vec3, radius: f32) {
        self.obstacles.add(position, radius);
    }

    pub fn player(&self) -> Entity {
        self.player
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn elapsed(&self) -> f64 {
        self.clock.elapsed
    }

    pub fn position_of(&self, actor: Entity) -> Option<Vec3> {
        self.world.get::<&Transform>(actor).ok().map(|t| t.position)
    }

    pub fn facing_of(&self, actor: Entity) -> Option<f32> {
        self.world.get::<&Transform>(actor).ok().map(|t| t.facing)
    }

    pub fn health_of(&self, actor: Entity) -> Option<Health> {
        self.world.get::<&Health>(actor).ok().map(|h| *h)
    }

    pub fn player_state(&self) -> Option<PlayerState> {
        self.world.get::<&PlayerFsm>(self.player).ok().map(|f| f.state())
    }

    pub fn enemy_state(&self, actor: Entity) -> Option<EnemyState> {
        self.world.get::<&EnemyFsm>(actor).ok().map(|f| f.state())
    }

    pub fn query_obstacles(&mut self, position: Vec3, radius: f32) -> Vec<ObstacleContact> {
        self.obstacles.query(position, radius, &mut self.rng)
    }

    pub fn obstacles(&self) -> &ObstacleRegistry {
        &self.obstacles
    }

    /// Every actor that is not dead, minus `except`.
    pub fn live_actors(&self, except: Option<Entity>) -> Vec<Entity> {
        let mut actors = Vec::new();
        for (entity, fsm) in self.world.query::<&PlayerFsm>().iter() {
            if !fsm.is_state(PlayerState::Dead) && Some(entity) != except {
                actors.push(entity);
            }
        }
        for (entity, fsm) in self.world.query::<&EnemyFsm>().iter() {
            if !fsm.is_state(EnemyState::Dead) && Some(entity) != except {
                actors.push(entity);
            }
        }
        actors
    }

    pub fn kill_count(&self) -> u32 {
        self.world.get::<&KillLedger>(self.player).map(|l| l.kills).unwrap_or(0)
    }

    pub fn score(&self) -> u64 {
        self.world.get::<&KillLedger>(self.player).map(|l| l.score).unwrap_or(0)
    }

    pub fn active_effects(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter().filter(|e| !e.is_disposed())
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
