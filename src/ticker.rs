use crate::engine::EngineEvent;
use std::time::{Duration, Instant};

/// Fixed-interval scheduler for the host loop.
///
/// There is only ever one deadline: starting again throws the old one away,
/// and `due` hands out at most one tick per call, so a late loop never runs
/// two ticks back to back.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    next: Option<Instant>,
}

/// Poll timeout used while stopped, so input stays responsive.
const IDLE_POLL: Duration = Duration::from_millis(250);

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Ticker {
            interval,
            next: None,
        }
    }

    pub fn start(&mut self, interval: Duration, now: Instant) {
        self.interval = interval;
        self.next = Some(now + interval);
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    pub fn is_active(&self) -> bool {
        self.next.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True once a period has elapsed; the next deadline is one full
    /// interval from `now`.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.next {
            Some(deadline) if now >= deadline => {
                self.next = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }

    pub fn time_until_due(&self, now: Instant) -> Duration {
        match self.next {
            Some(deadline) => deadline.saturating_duration_since(now),
            None => IDLE_POLL,
        }
    }

    pub fn apply(&mut self, event: &EngineEvent, now: Instant) {
        match event {
            EngineEvent::Reschedule(interval) => self.start(*interval, now),
            EngineEvent::Halt => self.stop(),
            _ => {}
        }
    }
}
