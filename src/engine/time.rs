/// Simulation clock advanced once per tick.
///
/// Elapsed time is kept in `f64` so scheduled deadlines stay exact over long
/// sessions; per-tick deltas stay `f32` like the rest of the simulation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimClock {
    pub elapsed: f64,
    pub ticks: u64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += f64::from(dt);
        self.ticks += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates() {
        let mut clock = SimClock::new();
        for _ in 0..60 {
            clock.advance(1.0 / 60.0);
        }
        assert_eq!(clock.ticks, 60);
        assert!((clock.elapsed - 1.0).abs() < 1e-5);
    }
}
