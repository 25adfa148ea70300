//! PWM output fallback
//!
//! Besides the UART, the sensor drives a digital output whose low-pulse
//! occupancy within a sampling window is proportional to the PM2.5
//! concentration. Edges are reported by the host, usually from a pin
//! interrupt.

use crate::scheduler::{Duration, Instant};

/// Concentration reported for a window spent entirely low, µg/m³
pub const FULL_SCALE: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseAccumulator {
    low_since: Option<Instant>,
    low_time: Duration,
}

impl PulseAccumulator {
    pub const fn new() -> Self {
        Self {
            low_since: None,
            low_time: Duration::from_ticks(0),
        }
    }

    /// Records an edge; `level` is the pin level after the edge.
    pub fn on_edge(&mut self, level: bool, now: Instant) {
        match (level, self.low_since) {
            (false, None) => self.low_since = Some(now),
            (true, Some(since)) => {
                if let Some(elapsed) = now.checked_duration_since(since) {
                    self.low_time = self.low_time + elapsed;
                }
                self.low_since = None;
            }
            _ => {}
        }
    }

    ///
    /// Credits a pulse still low at `now` to the closing window and restarts
    /// it from `now`.
    ///
    pub fn close_window(&mut self, now: Instant) {
        if let Some(since) = self.low_since {
            if let Some(elapsed) = now.checked_duration_since(since) {
                self.low_time = self.low_time + elapsed;
                self.low_since = Some(now);
            }
        }
    }

    pub fn low_time(&self) -> Duration {
        self.low_time
    }

    ///
    /// Converts the low time accumulated over `window` into a concentration
    /// and starts a new window. Call `close_window` first, or a pulse still in
    /// progress is credited to the next window.
    ///
    pub fn take_concentration(&mut self, window: Duration) -> f32 {
        let low_ms = self.low_time.to_millis();
        self.low_time = Duration::from_ticks(0);

        let window_ms = window.to_millis();
        if window_ms == 0 {
            return 0.0;
        }

        let ratio = (low_ms as f32 / window_ms as f32).min(1.0);
        ratio * FULL_SCALE
    }
}

impl Default for PulseAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(millis: u64) -> Instant {
        Instant::from_ticks(millis)
    }

    #[test]
    fn accumulates_low_pulses_only() {
        let mut pulses = PulseAccumulator::new();

        pulses.on_edge(false, at(1_000));
        pulses.on_edge(true, at(1_300));
        pulses.on_edge(false, at(5_000));
        pulses.on_edge(true, at(5_600));

        assert_eq!(Duration::millis(900), pulses.low_time());
    }

    #[test]
    fn repeated_edges_of_same_level_are_ignored() {
        let mut pulses = PulseAccumulator::new();

        pulses.on_edge(true, at(0));
        pulses.on_edge(false, at(100));
        pulses.on_edge(false, at(150));
        pulses.on_edge(true, at(400));
        pulses.on_edge(true, at(900));

        assert_eq!(Duration::millis(300), pulses.low_time());
    }

    #[test]
    fn concentration_is_occupancy_scaled_to_full_scale() {
        let mut pulses = PulseAccumulator::new();
        pulses.on_edge(false, at(0));
        pulses.on_edge(true, at(3_000));

        assert_eq!(100.0, pulses.take_concentration(Duration::secs(30)));
        assert_eq!(0.0, pulses.take_concentration(Duration::secs(30)));
    }

    #[test]
    fn occupancy_is_capped() {
        let mut pulses = PulseAccumulator::new();
        pulses.on_edge(false, at(0));
        pulses.on_edge(true, at(60_000));

        assert_eq!(FULL_SCALE, pulses.take_concentration(Duration::secs(30)));
    }

    #[test]
    fn empty_window_reports_zero() {
        let mut pulses = PulseAccumulator::new();
        pulses.on_edge(false, at(0));
        pulses.on_edge(true, at(10));

        assert_eq!(0.0, pulses.take_concentration(Duration::millis(0)));
    }

    #[test]
    fn pulse_in_progress_is_split_at_window_boundary() {
        let mut pulses = PulseAccumulator::new();
        pulses.on_edge(false, at(29_000));
        pulses.close_window(at(30_000));

        assert_eq!(Duration::millis(1_000), pulses.low_time());
        assert_eq!(50.0, pulses.take_concentration(Duration::secs(20)));

        pulses.on_edge(true, at(31_000));
        assert_eq!(Duration::millis(1_000), pulses.low_time());
    }

    #[test]
    fn closing_window_while_high_changes_nothing() {
        let mut pulses = PulseAccumulator::new();
        pulses.on_edge(false, at(0));
        pulses.on_edge(true, at(500));
        pulses.close_window(at(30_000));

        assert_eq!(Duration::millis(500), pulses.low_time());
    }

    #[test]
    fn pulse_in_progress_carries_over_without_closing() {
        let mut pulses = PulseAccumulator::new();
        pulses.on_edge(false, at(29_000));
        pulses.take_concentration(Duration::secs(30));
        pulses.on_edge(true, at(31_000));

        assert_eq!(Duration::millis(2_000), pulses.low_time());
    }
}
