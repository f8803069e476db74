//! Virtual-time scheduler
//!
//! Timers fire only when the driver advances the clock, in due-time order
//! (ties broken by timer id), so runs are fully reproducible.

use std::collections::BTreeMap;

use crate::channel::{Scheduler, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Armed {
    due_ms: u64,
    period_ms: Option<u64>,
}

/// One `set_timeout`/`set_interval` request, kept for inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTimer {
    pub timer: TimerId,
    pub at_ms: u64,
    pub delay_ms: u64,
    pub repeating: bool,
}

#[derive(Debug, Default)]
pub struct VirtualScheduler {
    now_ms: u64,
    armed: BTreeMap<TimerId, Armed>,
    /// Every arm request, in order
    pub history: Vec<ScheduledTimer>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn is_armed(&self, timer: TimerId) -> bool {
        self.armed.contains_key(&timer)
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    /// Delays of all one-shot timers armed so far
    pub fn timeout_delays(&self) -> Vec<u64> {
        self.history
            .iter()
            .filter(|t| !t.repeating)
            .map(|t| t.delay_ms)
            .collect()
    }

    /// Earliest armed timer and its due time
    pub fn next_due(&self) -> Option<(u64, TimerId)> {
        self.armed
            .iter()
            .map(|(timer, armed)| (armed.due_ms, *timer))
            .min()
    }

    /// Fire the earliest timer if it is due at or before `deadline_ms`,
    /// moving the clock to its due time. Intervals are re-armed.
    pub fn fire_next(&mut self, deadline_ms: u64) -> Option<TimerId> {
        let (due_ms, timer) = self.next_due()?;
        if due_ms > deadline_ms {
            return None;
        }

        self.now_ms = self.now_ms.max(due_ms);
        if let Some(armed) = self.armed.get_mut(&timer) {
            match armed.period_ms {
                Some(period) => armed.due_ms = due_ms + period.max(1),
                None => {
                    self.armed.remove(&timer);
                }
            }
        }
        Some(timer)
    }

    /// Move the clock forward without firing anything
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    fn arm(&mut self, timer: TimerId, delay_ms: u64, repeating: bool) {
        let due_ms = self.now_ms + delay_ms;
        self.armed.insert(
            timer,
            Armed {
                due_ms,
                period_ms: repeating.then_some(delay_ms),
            },
        );
        self.history.push(ScheduledTimer {
            timer,
            at_ms: self.now_ms,
            delay_ms,
            repeating,
        });
    }
}

impl Scheduler for VirtualScheduler {
    fn set_timeout(&mut self, timer: TimerId, delay_ms: u64) {
        self.arm(timer, delay_ms, false);
    }

    fn set_interval(&mut self, timer: TimerId, period_ms: u64) {
        self.arm(timer, period_ms, true);
    }

    fn cancel(&mut self, timer: TimerId) {
        self.armed.remove(&timer);
    }

    fn expired(&mut self, timer: TimerId) {
        self.armed.remove(&timer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_due_order() {
        let mut sched = VirtualScheduler::new();
        sched.set_timeout(TimerId(1), 300);
        sched.set_timeout(TimerId(2), 100);
        sched.set_timeout(TimerId(3), 100);

        assert_eq!(sched.fire_next(1000), Some(TimerId(2)));
        assert_eq!(sched.fire_next(1000), Some(TimerId(3)));
        assert_eq!(sched.now_ms(), 100);
        assert_eq!(sched.fire_next(1000), Some(TimerId(1)));
        assert_eq!(sched.now_ms(), 300);
        assert_eq!(sched.fire_next(1000), None);
    }

    #[test]
    fn test_interval_rearms_until_cancelled() {
        let mut sched = VirtualScheduler::new();
        sched.set_interval(TimerId(7), 30_000);

        assert_eq!(sched.fire_next(100_000), Some(TimerId(7)));
        assert_eq!(sched.fire_next(100_000), Some(TimerId(7)));
        assert_eq!(sched.now_ms(), 60_000);

        sched.cancel(TimerId(7));
        assert_eq!(sched.fire_next(100_000), None);
        assert_eq!(sched.armed_count(), 0);
    }

    #[test]
    fn test_deadline_respected() {
        let mut sched = VirtualScheduler::new();
        sched.set_timeout(TimerId(1), 5000);
        assert_eq!(sched.fire_next(4999), None);
        assert!(sched.is_armed(TimerId(1)));
        assert_eq!(sched.timeout_delays(), vec![5000]);
    }
}
