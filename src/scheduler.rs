//! Fixed-cadence polling
//!
//! The host owns the clock and calls [`Scheduler::poll`] from its main loop.
//! A due tick runs the component's `update` exactly once; periods missed while
//! the host was busy are skipped rather than replayed.

/// Host clock reading, milliseconds
pub type Instant = fugit::TimerInstantU64<1000>;
/// Polling period, milliseconds
pub type Duration = fugit::MillisDurationU64;

/// Lifecycle the host drives.
pub trait PollingComponent {
    type Error;

    fn setup(&mut self) -> Result<(), Self::Error>;

    /// One polling cycle. Must not block.
    fn update(&mut self);

    /// Polling cycle with the scheduler's clock reading.
    fn update_at(&mut self, _now: Instant) {
        self.update();
    }

    fn update_interval(&self) -> Duration;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Scheduler {
    interval: Duration,
    next_due: Option<Instant>,
}

impl Scheduler {
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn for_component<C: PollingComponent + ?Sized>(component: &C) -> Self {
        Self::new(component.update_interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arms the scheduler; the first tick is due immediately.
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.next_due {
            Some(due) => now >= due,
            None => false,
        }
    }

    ///
    /// Runs `component.update_at(now)` if a tick is due. Returns whether it ran.
    ///
    pub fn poll<C: PollingComponent + ?Sized>(&mut self, now: Instant, component: &mut C) -> bool {
        let due = match self.next_due {
            Some(due) if now >= due => due,
            _ => return false,
        };

        component.update_at(now);

        let next = due + self.interval;
        self.next_due = Some(if next > now { next } else { now + self.interval });
        true
    }
}
