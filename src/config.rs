use crate::scheduler::Duration;

/// How the sensor delivers measurements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportingMode {
    /// Sensor reports air quality continuously. Frames queue up in the
    /// transport when the poll interval is longer than the sensor's output
    /// period, so readings lag; use a poll interval at or below it.
    Active,
    /// Sensor reports air quality on request, one request is sent per poll
    Passive,
}

/// Driver settings, supplied by the host at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Polling cadence
    pub poll_interval: Duration,
    /// Read measurements from the serial transport
    pub use_uart: bool,
    pub reporting_mode: ReportingMode,
    /// Upper bound on bytes drained from the transport in one cycle
    pub max_bytes_per_tick: usize,
    /// Publish the PWM occupancy estimate when the UART path is inactive
    pub pulse_fallback: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: Duration::secs(30),
            use_uart: false,
            reporting_mode: ReportingMode::Passive,
            max_bytes_per_tick: 64,
            pulse_fallback: false,
        }
    }
}

impl Config {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_uart(mut self, use_uart: bool) -> Self {
        self.use_uart = use_uart;
        self
    }

    pub fn with_reporting_mode(mut self, reporting_mode: ReportingMode) -> Self {
        self.reporting_mode = reporting_mode;
        self
    }

    pub fn with_max_bytes_per_tick(mut self, max_bytes_per_tick: usize) -> Self {
        self.max_bytes_per_tick = max_bytes_per_tick;
        self
    }

    pub fn with_pulse_fallback(mut self, pulse_fallback: bool) -> Self {
        self.pulse_fallback = pulse_fallback;
        self
    }
}
