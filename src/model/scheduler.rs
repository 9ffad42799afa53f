use std::time::Duration;

/// How often the model asks its host for fresh telemetry.
pub const REFRESH_PERIOD: Duration = Duration::from_secs(30);

/// Cooperative refresh timer. The host reports its own monotonic elapsed
/// time; nothing here sleeps or spawns.
#[derive(Clone, Copy, Debug)]
pub struct RefreshScheduler {
    period: Duration,
    next_due: Duration,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(REFRESH_PERIOD)
    }
}

impl RefreshScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// True when a refresh is owed at `elapsed`. The next deadline is
    /// measured from now, so a stalled host owes one refresh, not a backlog.
    pub fn due(&mut self, elapsed: Duration) -> bool {
        if elapsed < self.next_due {
            return false;
        }
        self.next_due = elapsed + self.period;
        true
    }
}
