//! Deferred removal of emptied stages.
//!
//! When a transfer leaves a stage empty it is not removed on the spot; a
//! check is scheduled one settle window later so a quick follow-up gesture
//! can refill it without the stage flickering out of view. Checks are keyed
//! by stage id: scheduling again pushes the deadline back, and a stage that
//! receives content has its check cancelled. Whatever fires still has to
//! re-check emptiness against the working set.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::types::StageId;

/// Source of "now" for the settle timer.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[derive(Debug)]
pub struct PruneScheduler {
    settle_window: Duration,
    pending: HashMap<StageId, Instant>,
}

impl PruneScheduler {
    pub fn new(settle_window: Duration) -> Self {
        Self {
            settle_window,
            pending: HashMap::new(),
        }
    }

    pub fn settle_window(&self) -> Duration {
        self.settle_window
    }

    /// Schedule (or reschedule) a check for `stage` one window after `now`.
    pub fn schedule(&mut self, stage: StageId, now: Instant) {
        let deadline = now + self.settle_window;
        tracing::trace!(stage = %stage, "Prune check scheduled");
        self.pending.insert(stage, deadline);
    }

    /// Drop the pending check for `stage`. Returns `true` if one existed.
    pub fn cancel(&mut self, stage: &StageId) -> bool {
        self.pending.remove(stage).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_scheduled(&self, stage: &StageId) -> bool {
        self.pending.contains_key(stage)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    /// Remove and return every check whose deadline has passed, earliest
    /// first.
    pub fn take_due(&mut self, now: Instant) -> Vec<StageId> {
        let mut due: Vec<(StageId, Instant)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, deadline)| (id.clone(), *deadline))
            .collect();
        due.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        for (id, _) in &due {
            self.pending.remove(id);
        }
        due.into_iter().map(|(id, _)| id).collect()
    }

    /// Remove and return every pending check regardless of deadline.
    pub fn drain(&mut self) -> Vec<StageId> {
        let mut all: Vec<StageId> = self.pending.drain().map(|(id, _)| id).collect();
        all.sort();
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(300);

    #[test]
    fn test_check_fires_only_after_window() {
        let clock = ManualClock::new();
        let mut scheduler = PruneScheduler::new(WINDOW);
        scheduler.schedule("a".into(), clock.now());

        clock.advance(Duration::from_millis(299));
        assert!(scheduler.take_due(clock.now()).is_empty());
        assert!(scheduler.is_scheduled(&"a".into()));

        clock.advance(Duration::from_millis(1));
        assert_eq!(scheduler.take_due(clock.now()), vec![StageId::from("a")]);
        assert_eq!(scheduler.pending_len(), 0);
    }

    #[test]
    fn test_reschedule_pushes_deadline_back() {
        let clock = ManualClock::new();
        let mut scheduler = PruneScheduler::new(WINDOW);
        scheduler.schedule("a".into(), clock.now());

        clock.advance(Duration::from_millis(200));
        scheduler.schedule("a".into(), clock.now());
        assert_eq!(scheduler.pending_len(), 1);

        clock.advance(Duration::from_millis(200));
        assert!(scheduler.take_due(clock.now()).is_empty());

        clock.advance(Duration::from_millis(100));
        assert_eq!(scheduler.take_due(clock.now()).len(), 1);
    }

    #[test]
    fn test_cancel_removes_check() {
        let clock = ManualClock::new();
        let mut scheduler = PruneScheduler::new(WINDOW);
        scheduler.schedule("a".into(), clock.now());
        scheduler.schedule("b".into(), clock.now());

        assert!(scheduler.cancel(&"a".into()));
        assert!(!scheduler.cancel(&"a".into()));

        clock.advance(WINDOW);
        assert_eq!(scheduler.take_due(clock.now()), vec![StageId::from("b")]);

        scheduler.schedule("c".into(), clock.now());
        scheduler.cancel_all();
        clock.advance(WINDOW);
        assert!(scheduler.take_due(clock.now()).is_empty());
    }

    #[test]
    fn test_due_checks_come_out_earliest_first() {
        let clock = ManualClock::new();
        let mut scheduler = PruneScheduler::new(WINDOW);
        scheduler.schedule("late".into(), clock.now() + Duration::from_millis(50));
        scheduler.schedule("early".into(), clock.now());
        assert_eq!(scheduler.next_deadline(), Some(clock.now() + WINDOW));

        clock.advance(Duration::from_secs(1));
        assert_eq!(
            scheduler.take_due(clock.now()),
            vec![StageId::from("early"), StageId::from("late")]
        );
    }

    #[test]
    fn test_drain_ignores_deadlines() {
        let clock = ManualClock::new();
        let mut scheduler = PruneScheduler::new(WINDOW);
        scheduler.schedule("b".into(), clock.now());
        scheduler.schedule("a".into(), clock.now());

        assert_eq!(
            scheduler.drain(),
            vec![StageId::from("a"), StageId::from("b")]
        );
        assert_eq!(scheduler.pending_len(), 0);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        let before = other.now();
        clock.advance(Duration::from_secs(2));
        assert_eq!(other.now() - before, Duration::from_secs(2));
    }
}
