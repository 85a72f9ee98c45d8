//! Single-slot cancellable scheduled task.
//!
//! The host drives time: `schedule` arms (or re-arms) the slot, `poll`
//! reports whether the deadline passed and disarms it. A new `schedule`
//! before the deadline replaces the pending one, so a burst of resize
//! notifications produces exactly one firing per quiet period.

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay_ms: f64,
    deadline: Option<f64>,
}

impl Debouncer {
    pub fn new(delay_ms: f64) -> Self {
        Self {
            delay_ms: delay_ms.max(0.0),
            deadline: None,
        }
    }

    pub fn delay_ms(&self) -> f64 {
        self.delay_ms
    }

    /// Arm the slot to fire `delay_ms` after `now_ms`, replacing any pending deadline.
    pub fn schedule(&mut self, now_ms: f64) {
        self.deadline = Some(now_ms + self.delay_ms);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` exactly once when the pending deadline has passed.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
