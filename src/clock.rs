use std::time::{Duration, Instant};

/// Counts time spent actually playing; paused stretches are left out.
#[derive(Debug, Clone, Default)]
pub struct PlayClock {
    banked: Duration,
    since: Option<Instant>,
}

impl PlayClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resume(&mut self, now: Instant) {
        if self.since.is_none() {
            self.since = Some(now);
        }
    }

    pub fn pause(&mut self, now: Instant) {
        if let Some(since) = self.since.take() {
            self.banked += now.saturating_duration_since(since);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_ticking(&self) -> bool {
        self.since.is_some()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        let live = self
            .since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or_default();
        self.banked + live
    }
}

/// `MM:SS`; minutes keep counting past 99.
pub fn format_clock(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
