use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tracing::{debug, trace, warn};

use crate::panels::{Panel, PanelView};

struct Task {
    panel: Box<dyn Panel>,
    interval: Duration,
    next_due: Instant,
    failures: u64,
}

impl Task {
    /// Refresh the panel, swallowing failures. Returns the number of rewritten fields.
    fn run(&mut self, wall_clock: &DateTime<Local>) -> usize {
        match self.panel.refresh(wall_clock) {
            Ok(0) => {
                trace!(panel = self.panel.name(), "panel unchanged");
                0
            }
            Ok(changed) => {
                debug!(panel = self.panel.name(), changed, "panel refreshed");
                changed
            }
            Err(e) => {
                self.failures += 1;
                warn!(
                    panel = self.panel.name(),
                    failures = self.failures,
                    "refresh failed, keeping last display: {:#}",
                    e
                );
                0
            }
        }
    }
}

// Owns every panel as a periodic task and runs the ones that are due
pub struct Scheduler {
    tasks: Vec<Task>,
    dirty: bool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            dirty: false,
        }
    }

    /// Add a panel, refreshing it straight away. Its next run is `interval` after `now`.
    pub fn register(
        &mut self,
        panel: Box<dyn Panel>,
        interval: Duration,
        now: Instant,
        wall_clock: &DateTime<Local>,
    ) {
        let mut task = Task {
            panel,
            interval,
            next_due: now + interval,
            failures: 0,
        };
        if task.run(wall_clock) > 0 {
            self.dirty = true;
        }
        self.tasks.push(task);
    }

    /// Run every task whose deadline has passed and reschedule it one interval from `now`.
    /// Ticks missed while blocked are not made up. Returns how many tasks ran.
    pub fn run_due(&mut self, now: Instant, wall_clock: &DateTime<Local>) -> usize {
        let mut ran = 0;
        for task in self.tasks.iter_mut().filter(|t| t.next_due <= now) {
            if task.run(wall_clock) > 0 {
                self.dirty = true;
            }
            task.next_due = now + task.interval;
            ran += 1;
        }
        ran
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.iter().map(|t| t.next_due).min()
    }

    pub fn views(&self) -> Vec<PanelView> {
        self.tasks.iter().map(|t| t.panel.view()).collect()
    }

    /// Whether any panel changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[allow(dead_code)]
    pub fn failures(&self, panel: &str) -> Option<u64> {
        self.tasks
            .iter()
            .find(|t| t.panel.name() == panel)
            .map(|t| t.failures)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::testing::{FakeFeed, Scripted};
    use crate::panels::HeadlinesPanel;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::panels::{Region, TextSize, ViewLine};

    /// Counts refreshes and always reports one change.
    struct Counter {
        runs: Rc<Cell<u32>>,
    }

    impl Panel for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        fn region(&self) -> Region {
            Region::TopLeft
        }

        fn refresh(&mut self, _now: &DateTime<Local>) -> anyhow::Result<usize> {
            self.runs.set(self.runs.get() + 1);
            Ok(1)
        }

        fn view(&self) -> PanelView {
            PanelView {
                name: self.name(),
                region: self.region(),
                title: self.title(),
                show_title: false,
                lines: vec![ViewLine::new(self.runs.get().to_string(), TextSize::Small)],
            }
        }
    }

    fn counter() -> (Box<dyn Panel>, Rc<Cell<u32>>) {
        let runs = Rc::new(Cell::new(0));
        (Box::new(Counter { runs: Rc::clone(&runs) }), runs)
    }

    #[test]
    fn test_register_refreshes_immediately() {
        let mut scheduler = Scheduler::new();
        let (panel, runs) = counter();
        let start = Instant::now();
        scheduler.register(panel, Duration::from_secs(60), start, &Local::now());

        assert_eq!(runs.get(), 1);
        assert_eq!(scheduler.next_deadline(), Some(start + Duration::from_secs(60)));
        assert!(scheduler.take_dirty());
        assert!(!scheduler.take_dirty());
    }

    #[test]
    fn test_only_due_tasks_run() {
        let mut scheduler = Scheduler::new();
        let start = Instant::now();
        let (fast, fast_runs) = counter();
        let (slow, slow_runs) = counter();
        scheduler.register(fast, Duration::from_millis(200), start, &Local::now());
        scheduler.register(slow, Duration::from_secs(600), start, &Local::now());

        assert_eq!(scheduler.run_due(start + Duration::from_millis(100), &Local::now()), 0);
        assert_eq!(scheduler.run_due(start + Duration::from_millis(200), &Local::now()), 1);
        assert_eq!(fast_runs.get(), 2);
        assert_eq!(slow_runs.get(), 1);
        assert_eq!(scheduler.next_deadline(), Some(start + Duration::from_millis(400)));
    }

    #[test]
    fn test_missed_ticks_are_not_replayed() {
        let mut scheduler = Scheduler::new();
        let start = Instant::now();
        let (panel, runs) = counter();
        scheduler.register(panel, Duration::from_secs(1), start, &Local::now());

        let late = start + Duration::from_secs(10);
        assert_eq!(scheduler.run_due(late, &Local::now()), 1);
        assert_eq!(runs.get(), 2);
        assert_eq!(scheduler.next_deadline(), Some(late + Duration::from_secs(1)));
    }

    #[test]
    fn test_failures_are_swallowed_and_retried() {
        let mut scheduler = Scheduler::new();
        let start = Instant::now();
        let feed = FakeFeed(Scripted::new(vec![
            Ok(vec!["Headline".to_string()]),
            Err("connection reset".to_string()),
            Ok(vec!["Headline".to_string()]),
        ]));
        scheduler.register(
            Box::new(HeadlinesPanel::news(Box::new(feed))),
            Duration::from_secs(600),
            start,
            &Local::now(),
        );
        assert!(scheduler.take_dirty());
        let before = scheduler.views();

        let tick = start + Duration::from_secs(600);
        assert_eq!(scheduler.run_due(tick, &Local::now()), 1);
        assert_eq!(scheduler.failures("news"), Some(1));
        assert!(!scheduler.take_dirty());
        assert_eq!(scheduler.views(), before);
        assert_eq!(scheduler.next_deadline(), Some(tick + Duration::from_secs(600)));

        // Same headline again: runs, but nothing to redraw
        scheduler.run_due(tick + Duration::from_secs(600), &Local::now());
        assert!(!scheduler.take_dirty());
        assert_eq!(scheduler.views(), before);
    }

    #[test]
    fn test_views_in_registration_order() {
        let mut scheduler = Scheduler::new();
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.next_deadline(), None);

        let start = Instant::now();
        let (a, _) = counter();
        scheduler.register(a, Duration::from_secs(1), start, &Local::now());
        let feed = FakeFeed(Scripted::new(vec![Ok(vec![])]));
        scheduler.register(
            Box::new(HeadlinesPanel::markets(Box::new(feed))),
            Duration::from_secs(1),
            start,
            &Local::now(),
        );

        let names: Vec<&str> = scheduler.views().iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["counter", "markets"]);
        assert_eq!(scheduler.len(), 2);
    }
}
