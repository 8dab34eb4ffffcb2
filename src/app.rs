use glam::Vec3;

use crate::components::{
    planar_delta, planar_distance, AbilityKind, Enemy, EnemyFsm, EnemyState, Health, KillLedger,
    PlayerState, Transform,
};
use crate::config::GameConfig;
use crate::engine::input::{Action, InputState};
use crate::events::Presenter;
use crate::sim::Simulation;

/// Fixed simulation step used by [`GameApp::advance`].
pub const TICK_DT: f32 = 1.0 / 60.0;

/// Upper bound on catch-up ticks per frame after a stall.
const MAX_TICKS_PER_FRAME: usize = 8;

/// Scripted player used by the headless runner.
#[derive(Debug, Clone)]
pub struct Autopilot {
    /// Start sprinting when the nearest enemy is further than this.
    pub sprint_distance: f32,
    /// Swing when the nearest enemy is this close.
    pub strike_distance: f32,
    /// Heal below this much health.
    pub heal_below: u32,
    /// Raise a shield when an enemy is this close.
    pub shield_distance: f32,
    /// Use the ultimate once this many enemies are within `crowd_radius`.
    pub crowd_size: usize,
    pub crowd_radius: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            sprint_distance: 12.0,
            strike_distance: 4.0,
            heal_below: 50,
            shield_distance: 3.0,
            crowd_size: 3,
            crowd_radius: 15.0,
        }
    }
}

impl Autopilot {
    /// Rewrite `input` for the next tick from what the player can see.
    pub fn drive(&self, sim: &Simulation, input: &mut InputState) {
        input.clear();
        let world = sim.world();
        let player = sim.player();

        let Ok(origin) = world.get::<&Transform>(player).map(|t| t.position) else {
            return;
        };
        if sim.player_state() == Some(PlayerState::Dead) {
            return;
        }
        let health = world.get::<&Health>(player).map(|h| h.current).unwrap_or(0);
        let (can_heal, can_shield, can_ultimate) = world
            .get::<&KillLedger>(player)
            .map(|l| {
                (
                    l.can_use(AbilityKind::Heal),
                    l.can_use(AbilityKind::Shield),
                    l.can_use(AbilityKind::Ultimate),
                )
            })
            .unwrap_or_default();

        let mut enemies: Vec<(f32, Vec3)> = world
            .query::<(&Enemy, &Transform, &EnemyFsm)>()
            .iter()
            .filter(|(_, (_, _, fsm))| !fsm.is_state(EnemyState::Dead))
            .map(|(_, (_, t, _))| (planar_distance(origin, t.position), t.position))
            .collect();
        enemies.sort_by(|a, b| a.0.total_cmp(&b.0));

        let Some(&(nearest, target)) = enemies.first() else {
            return;
        };
        let crowd = enemies.iter().filter(|(d, _)| *d <= self.crowd_radius).count();

        if can_ultimate && crowd >= self.crowd_size {
            input.press(Action::Ultimate);
        } else if can_heal && health < self.heal_below {
            input.press(Action::Heal);
        } else if can_shield && nearest <= self.shield_distance {
            input.press(Action::Shield);
        } else if nearest <= self.strike_distance {
            input.press(Action::Attack);
        }

        // Keep walking in close so the swing faces the target.
        press_towards(input, planar_delta(origin, target));
        if nearest > self.sprint_distance {
            input.press(Action::Run);
        }
    }
}

/// Hold the direction keys closest to `delta` (eight-way).
fn press_towards(input: &mut InputState, delta: Vec3) {
    let len = delta.length();
    if len < f32::EPSILON {
        return;
    }
    let dir = delta / len;
    if dir.x > 0.38 {
        input.press(Action::Right);
    } else if dir.x < -0.38 {
        input.press(Action::Left);
    }
    if dir.z > 0.38 {
        input.press(Action::Backward);
    } else if dir.z < -0.38 {
        input.press(Action::Forward);
    }
}

/// Outcome of a headless run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub elapsed: f64,
    pub kills: u32,
    pub score: u64,
    pub player_health: u32,
    pub game_over: bool,
}

/// Headless host: owns the simulation and the held input, and feeds the
/// simulation fixed ticks from variable frame times.
pub struct GameApp {
    sim: Simulation,
    input: InputState,
    autopilot: Option<Autopilot>,
    tick_accum: f32,
    ticks: u64,
}

impl GameApp {
    /// A populated forest with the opening wave already spawned.
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let mut sim = Simulation::new(config, seed);
        sim.populate();
        Self {
            sim,
            input: InputState::new(),
            autopilot: None,
            tick_accum: 0.0,
            ticks: 0,
        }
    }

    pub fn with_autopilot(mut self, autopilot: Autopilot) -> Self {
        self.autopilot = Some(autopilot);
        self
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn sim(&self) -> &Simulation {
        &self.sim
    }

    pub fn toggle_pause(&mut self) {
        let paused = !self.sim.is_paused();
        self.sim.set_paused(paused);
        log::info!("{}", if paused { "paused" } else { "resumed" });
    }

    /// Run exactly one simulation tick of `dt` seconds.
    pub fn step(&mut self, dt: f32, presenter: &mut impl Presenter) {
        if self.sim.is_paused() {
            return;
        }
        if let Some(autopilot) = &self.autopilot {
            autopilot.drive(&self.sim, &mut self.input);
        }
        self.sim.tick(dt, &self.input, presenter);
        self.ticks += 1;
    }

    /// Consume `frame_dt` seconds of wall time in fixed ticks. Returns the
    /// number of ticks run.
    pub fn advance(&mut self, frame_dt: f32, presenter: &mut impl Presenter) -> usize {
        if self.sim.is_paused() {
            return 0;
        }
        self.tick_accum += frame_dt;
        let mut ticks = 0;
        while self.tick_accum >= TICK_DT && ticks < MAX_TICKS_PER_FRAME {
            self.step(TICK_DT, presenter);
            self.tick_accum -= TICK_DT;
            ticks += 1;
        }
        if ticks == MAX_TICKS_PER_FRAME {
            self.tick_accum = 0.0;
        }
        ticks
    }

    /// Tick at `dt` until `seconds` of simulated time pass or the run is
    /// lost.
    pub fn run(&mut self, dt: f32, seconds: f64, presenter: &mut impl Presenter) -> RunSummary {
        let start = self.sim.elapsed();
        while self.sim.elapsed() - start < seconds && !self.sim.is_game_over() {
            self.step(dt, presenter);
        }
        self.summary()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            ticks: self.ticks,
            elapsed: self.sim.elapsed(),
            kills: self.sim.kill_count(),
            score: self.sim.score(),
            player_health: self.sim.health_of(self.sim.player()).map_or(0, |h| h.current),
            game_over: self.sim.is_game_over(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;

    #[test]
    fn paused_app_does_not_advance() {
        let mut app = GameApp::new(GameConfig::default(), 1);
        let mut presenter = EventLog::new();
        app.toggle_pause();
        assert_eq!(app.advance(1.0, &mut presenter), 0);
        assert_eq!(app.sim().elapsed(), 0.0);
        app.toggle_pause();
        assert!(app.advance(0.05, &mut presenter) >= 2);
    }

    #[test]
    fn stalls_are_capped() {
        let mut app = GameApp::new(GameConfig::default(), 1);
        let mut presenter = EventLog::new();
        assert_eq!(app.advance(5.0, &mut presenter), MAX_TICKS_PER_FRAME);
        assert_eq!(app.advance(0.0, &mut presenter), 0);
    }

    #[test]
    fn direction_keys_follow_delta() {
        let mut input = InputState::new();
        press_towards(&mut input, Vec3::new(3.0, 0.0, -3.0));
        assert!(input.is_held(Action::Right) && input.is_held(Action::Forward));
        input.clear();
        press_towards(&mut input, Vec3::new(0.0, 0.0, 5.0));
        assert!(input.is_held(Action::Backward));
        assert!(!input.is_held(Action::Left) && !input.is_held(Action::Right));
    }

    #[test]
    fn autopilot_run_is_deterministic() {
        let run = |seed| {
            let mut app = GameApp::new(GameConfig::default(), seed).with_autopilot(Autopilot::default());
            app.run(TICK_DT, 5.0, &mut EventLog::new())
        };
        assert_eq!(run(7), run(7));
    }
}
