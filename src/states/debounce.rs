// Coalescing timer used for "recompile while typing" and share-link updates.
// It never owns a thread: the UI passes its clock in (`egui` input time, in
// seconds) and polls once per frame, the same way the editor used to debounce
// autosave writes.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Debouncer {
    /// Quiet period in seconds.
    delay: f64,
    /// When the armed call becomes due. `None` means nothing is scheduled.
    deadline: Option<f64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay: delay.as_secs_f64(),
            deadline: None,
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay)
    }

    /// Changes the quiet period. An armed deadline keeps its original time.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay.as_secs_f64();
    }

    /// Cancels any pending call and arms a new one at `now + delay`.
    pub fn schedule(&mut self, now: f64) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` exactly once per arming, on the first poll at or after
    /// the deadline.
    pub fn poll(&mut self, now: f64) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Time left before the armed call is due, zero if overdue.
    pub fn time_until_due(&self, now: f64) -> Option<Duration> {
        self.deadline
            .map(|deadline| Duration::from_secs_f64((deadline - now).max(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rapid_schedules_fire_once_after_last() {
        let mut d = Debouncer::from_millis(200);
        for i in 0..10 {
            d.schedule(i as f64 * 0.05);
        }
        // last schedule at 0.45 -> due at 0.65
        assert!(!d.poll(0.6));
        assert!(d.poll(0.65));
        assert!(!d.poll(0.7));
        assert!(!d.is_pending());
    }

    #[test]
    fn cancel_disarms() {
        let mut d = Debouncer::from_millis(200);
        d.schedule(1.0);
        d.cancel();
        assert!(!d.poll(5.0));
        assert_eq!(d.time_until_due(5.0), None);
    }

    #[test]
    fn time_until_due_saturates_at_zero() {
        let mut d = Debouncer::from_millis(100);
        d.schedule(0.0);
        let left = d.time_until_due(0.04).expect("pending");
        assert!((left.as_secs_f64() - 0.06).abs() < 1e-9);
        assert_eq!(d.time_until_due(3.0), Some(Duration::ZERO));
    }
}
