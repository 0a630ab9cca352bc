//! Virtual-clock scheduler for `repeat with time` actions.
//!
//! Time only moves when the host advances it, so tick order is fully
//! deterministic: earliest due first, registration order on ties.

#[derive(Debug, Clone, PartialEq)]
struct ScheduledTimer {
    name: String,
    interval_ms: f64,
    action: String,
    next_due_ms: f64,
    sequence: u64,
}

/// One due firing of a timer.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub name: String,
    pub action: String,
    pub at_ms: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TimerScheduler {
    now_ms: f64,
    next_sequence: u64,
    timers: Vec<ScheduledTimer>,
}

impl TimerScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Registers a timer whose first tick is one interval from now. A timer
    /// with the same name is replaced.
    pub fn schedule(&mut self, name: &str, interval_ms: f64, action: &str) {
        self.cancel(name);
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.timers.push(ScheduledTimer {
            name: name.to_string(),
            interval_ms,
            action: action.to_string(),
            next_due_ms: self.now_ms + interval_ms,
            sequence,
        });
    }

    pub fn cancel(&mut self, name: &str) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.name != name);
        self.timers.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_scheduled(&self, name: &str) -> bool {
        self.timers.iter().any(|timer| timer.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.timers.iter().map(|timer| timer.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Pops the next tick due at or before `until_ms`, moving the clock to it
    /// and rescheduling the timer one interval later.
    pub fn next_tick(&mut self, until_ms: f64) -> Option<Tick> {
        let timer = self
            .timers
            .iter_mut()
            .filter(|timer| timer.next_due_ms <= until_ms)
            .min_by(|a, b| {
                a.next_due_ms
                    .total_cmp(&b.next_due_ms)
                    .then(a.sequence.cmp(&b.sequence))
            })?;
        let at_ms = timer.next_due_ms;
        timer.next_due_ms += timer.interval_ms;
        self.now_ms = self.now_ms.max(at_ms);
        Some(Tick {
            name: timer.name.clone(),
            action: timer.action.clone(),
            at_ms,
        })
    }

    /// Moves the clock to `until_ms` once all due ticks have been taken.
    pub fn settle(&mut self, until_ms: f64) {
        self.now_ms = self.now_ms.max(until_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut TimerScheduler, until_ms: f64) -> Vec<(String, f64)> {
        let mut ticks = Vec::new();
        while let Some(tick) = scheduler.next_tick(until_ms) {
            ticks.push((tick.name, tick.at_ms));
        }
        scheduler.settle(until_ms);
        ticks
    }

    #[test]
    fn fires_in_due_order_with_ties_by_registration() {
        let mut scheduler = TimerScheduler::new();
        scheduler.schedule("slow", 200.0, "a");
        scheduler.schedule("fast", 100.0, "b");
        assert_eq!(
            drain(&mut scheduler, 250.0),
            vec![
                ("fast".to_string(), 100.0),
                ("slow".to_string(), 200.0),
                ("fast".to_string(), 200.0),
            ]
        );
        assert_eq!(scheduler.now_ms(), 250.0);
        assert_eq!(drain(&mut scheduler, 300.0), vec![("fast".to_string(), 300.0)]);
    }

    #[test]
    fn cancelling_stops_future_ticks() {
        let mut scheduler = TimerScheduler::new();
        scheduler.schedule("tick", 50.0, "a");
        assert_eq!(drain(&mut scheduler, 100.0).len(), 2);
        assert!(scheduler.cancel("tick"));
        assert!(!scheduler.cancel("tick"));
        assert!(drain(&mut scheduler, 1000.0).is_empty());
    }

    #[test]
    fn rescheduling_replaces_the_timer() {
        let mut scheduler = TimerScheduler::new();
        scheduler.schedule("tick", 50.0, "a");
        scheduler.schedule("tick", 80.0, "b");
        assert_eq!(scheduler.names(), vec!["tick"]);
        let tick = scheduler.next_tick(100.0).expect("due");
        assert_eq!((tick.action.as_str(), tick.at_ms), ("b", 80.0));
    }
}
