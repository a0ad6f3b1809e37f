use std::time::{Duration, Instant};

/// Wall-clock countdown for a timed session.
///
/// Remaining time is derived from the start instant on every tick, so the
/// countdown stays correct no matter how unevenly the driving loop calls in.
#[derive(Clone, Copy, Debug)]
pub struct SessionClock {
    duration: Duration,
    started_at: Option<Instant>,
    elapsed: Duration,
    remaining: Duration,
    is_running: bool,
}

impl SessionClock {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started_at: None,
            elapsed: Duration::ZERO,
            remaining: duration,
            is_running: false,
        }
    }

    /// Records the start instant. Calling this on a running clock is a
    /// no-op that keeps the original start instant.
    pub fn start(&mut self, now: Instant) {
        if self.is_running {
            log::warn!("session clock already running, start ignored");
            return;
        }

        self.is_running = true;
        self.started_at = Some(now);
        self.elapsed = Duration::ZERO;
        self.remaining = self.duration;
    }

    /// Recomputes elapsed/remaining. Once remaining hits zero the clock
    /// stops running and further ticks do nothing.
    pub fn tick(&mut self, now: Instant) {
        if !self.is_running {
            return;
        }
        let Some(started_at) = self.started_at else {
            return;
        };

        self.elapsed = now.saturating_duration_since(started_at);
        self.remaining = self.duration.saturating_sub(self.elapsed);

        if self.remaining.is_zero() {
            self.is_running = false;
        }
    }

    pub fn stop(&mut self) {
        self.is_running = false;
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Remaining time rounded to the nearest second as `MM:SS`;
    /// `"00:00"` once expired.
    pub fn remaining_formatted(&self) -> String {
        if self.remaining.is_zero() {
            return String::from("00:00");
        }

        let total_seconds = self.remaining.as_secs_f64().round() as u64;
        format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_finished(&self) -> bool {
        self.remaining.is_zero()
    }
}
