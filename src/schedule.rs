use hecs::Entity;

/// Deferred work processed against the simulation clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduled {
    /// Remove a dead enemy once its sink has finished.
    Despawn(Entity),
    /// Tell the presenter the run is over.
    ReportGameOver,
}

/// Time-ordered queue of [`Scheduled`] entries. Entries with the same due
/// time come out in insertion order.
#[derive(Debug, Default)]
pub struct Scheduler {
    seq: u64,
    pending: Vec<(f64, u64, Scheduled)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: f64, item: Scheduled) {
        self.seq += 1;
        self.pending.push((due, self.seq, item));
    }

    /// Remove and return every entry due at or before `now`, earliest first.
    pub fn drain_due(&mut self, now: f64) -> Vec<Scheduled> {
        let mut due: Vec<_> = Vec::new();
        self.pending.retain(|&(at, seq, item)| {
            if at <= now {
                due.push((at, seq, item));
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        due.into_iter().map(|(_, _, item)| item).collect()
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
