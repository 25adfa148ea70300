//! Driver for the PM1003 particulate matter sensor.
//!
//! The driver is polled: every [`update`](Pm1003::update) drains whatever the
//! serial port has already buffered, decodes at most one measurement frame and
//! hands the result to the attached consumers. Nothing in a cycle blocks, and
//! every failure ends as "no reading this cycle".

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

use core::convert::Infallible;

use embedded_hal::serial::{Read, Write};
use log::{debug, info, warn};
use nb::block;

mod config;
mod error;
pub mod frame;
pub mod pulse;
mod read_fsm;
pub mod scheduler;
pub mod sink;

pub use config::{Config, ReportingMode};
pub use error::{Diagnostics, Error};
pub use frame::{decode, Frame, Reading};
pub use scheduler::{Duration, Instant, PollingComponent, Scheduler};
pub use sink::{BinarySink, MeasurementSink};

use frame::{create_command, CMD_READ_MEASUREMENT};
use pulse::PulseAccumulator;
use read_fsm::{ReadStateMachine, ReadStatus};

pub struct Pm1003<'a, Serial = NoTransport>
where
    Serial: Read<u8> + Write<u8>,
{
    config: Config,
    serial: Option<Serial>,
    reader: ReadStateMachine,
    binary_sensor: Option<&'a mut dyn BinarySink>,
    pm_2_5_sensor: Option<&'a mut dyn MeasurementSink>,
    pulses: PulseAccumulator,
    diagnostics: Diagnostics,
}

impl<'a> Pm1003<'a, NoTransport> {
    ///
    /// Creates a driver that never reads a serial port
    ///
    pub fn new(config: Config) -> Self {
        Self::unattached(config)
    }
}

impl<'a, Serial> Pm1003<'a, Serial>
where
    Serial: Read<u8> + Write<u8>,
{
    ///
    /// Creates a driver whose transport is attached later with
    /// `set_uart_parent`.
    ///
    pub fn unattached(config: Config) -> Self {
        Self {
            config,
            serial: None,
            reader: ReadStateMachine::new(),
            binary_sensor: None,
            pm_2_5_sensor: None,
            pulses: PulseAccumulator::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    ///
    /// Creates a new sensor instance using a single object implementing embedded hal serial traits
    ///
    pub fn with_uart(serial: Serial, config: Config) -> Self {
        let mut sensor = Self::unattached(config);
        sensor.set_uart_parent(serial);
        sensor
    }

    pub fn set_uart_parent(&mut self, serial: Serial) {
        self.serial = Some(serial);
        self.config.use_uart = true;
        self.reader.reset();
    }

    pub fn set_use_uart(&mut self, use_uart: bool) {
        self.config.use_uart = use_uart;
    }

    pub fn set_binary_sensor(&mut self, sensor: &'a mut dyn BinarySink) {
        self.binary_sensor = Some(sensor);
    }

    pub fn set_pm_2_5_sensor(&mut self, sensor: &'a mut dyn MeasurementSink) {
        self.pm_2_5_sensor = Some(sensor);
    }

    /// Hands the serial transport back to the caller.
    pub fn release(&mut self) -> Option<Serial> {
        self.reader.reset();
        self.serial.take()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    fn uart_active(&self) -> bool {
        self.config.use_uart && self.serial.is_some()
    }

    ///
    /// Checks the transport and, in passive mode, asks the sensor for its
    /// first measurement. Blocks until the request is sent.
    ///
    pub fn setup(&mut self) -> Result<(), Error> {
        info!(
            "Setting up PM1003: interval {} ms, uart {}, {:?} mode",
            self.config.poll_interval.to_millis(),
            self.config.use_uart,
            self.config.reporting_mode
        );

        if !self.config.use_uart {
            if self.config.pulse_fallback {
                info!("PM1003 reading PWM output");
            }
            return Ok(());
        }
        if self.serial.is_none() {
            warn!("PM1003 UART enabled without a transport, readings disabled");
            return Ok(());
        }

        self.reader.reset();
        match self.config.reporting_mode {
            ReportingMode::Passive => self.request(),
            ReportingMode::Active => Ok(()),
        }
    }

    ///
    /// One polling cycle: consume at most one frame, publish it, and in
    /// passive mode queue the next request.
    ///
    /// Without a timestamp, a PWM low pulse still running is credited to the
    /// next window; `update_at` splits it.
    ///
    pub fn update(&mut self) {
        if self.uart_active() {
            if let Some(frame) = self.try_read_frame() {
                match decode(&frame) {
                    Ok(reading) => {
                        self.diagnostics.frame_decoded();
                        debug!("PM1003 PM2.5 {} µg/m³, presence {}", reading.pm2_5, reading.presence);
                        self.publish(reading);
                    }
                    Err(error) => {
                        self.diagnostics.record(error);
                        warn!("PM1003 dropped frame: {}", error);
                    }
                }
            }

            if self.config.reporting_mode == ReportingMode::Passive {
                if let Err(error) = self.try_request() {
                    debug!("PM1003 request not sent this cycle: {}", error);
                }
            }
        } else if self.config.pulse_fallback {
            let concentration = self.pulses.take_concentration(self.config.poll_interval);
            debug!("PM1003 PWM estimate {} µg/m³", concentration);
            if let Some(sensor) = self.pm_2_5_sensor.as_mut() {
                sensor.publish(concentration);
            }
        }
    }

    /// Polling cycle at `now`, the end of the current PWM window.
    pub fn update_at(&mut self, now: Instant) {
        self.pulses.close_window(now);
        self.update();
    }

    ///
    /// Assembles one frame from the bytes the transport already holds.
    /// Never waits for more. Bytes after a complete frame stay in the
    /// transport for the next cycle.
    ///
    pub fn try_read_frame(&mut self) -> Option<Frame> {
        if !self.config.use_uart {
            return None;
        }
        let serial = self.serial.as_mut()?;

        for _ in 0..self.config.max_bytes_per_tick {
            let byte = match serial.read() {
                Ok(byte) => byte,
                Err(nb::Error::WouldBlock) => return None,
                Err(nb::Error::Other(_)) => {
                    warn!("PM1003 read error, discarding partial frame");
                    self.diagnostics.record(Error::Read);
                    self.reader.reset();
                    return None;
                }
            };

            match self.reader.update(byte) {
                ReadStatus::InProgress => {}
                ReadStatus::Finished(frame) => return Some(frame),
                ReadStatus::Failed(error) => {
                    self.diagnostics.record(error);
                    warn!("PM1003 frame discarded: {}", error);
                }
            }
        }
        None
    }

    /// Forwards a reading to whichever consumers are attached.
    pub fn publish(&mut self, reading: Reading) {
        if let Some(sensor) = self.binary_sensor.as_mut() {
            sensor.set_state(reading.presence);
        }
        if let Some(sensor) = self.pm_2_5_sensor.as_mut() {
            sensor.publish(reading.pm2_5);
        }
    }

    ///
    /// Feeds an edge of the sensor's PWM output. `level` is the pin level
    /// after the edge.
    ///
    pub fn on_pulse_edge(&mut self, level: bool, now: Instant) {
        self.pulses.on_edge(level, now);
    }

    ///
    /// Requests one measurement, `11 02 0B 01 E1`
    ///
    pub fn request(&mut self) -> Result<(), Error> {
        let cmd = create_command(CMD_READ_MEASUREMENT, 0x01).map_err(|_| Error::Write)?;
        self.send_cmd(&cmd)
    }

    fn try_request(&mut self) -> Result<(), Error> {
        let cmd = create_command(CMD_READ_MEASUREMENT, 0x01).map_err(|_| Error::Write)?;
        self.try_send_cmd(&cmd)
    }

    fn send_cmd(&mut self, cmd: &[u8]) -> Result<(), Error> {
        let serial = self.serial.as_mut().ok_or(Error::TransportAbsent)?;
        for byte in cmd {
            if block!(serial.write(*byte)).is_err() {
                self.diagnostics.record(Error::Write);
                return Err(Error::Write);
            }
        }
        Ok(())
    }

    // A full TX buffer abandons the command; the sensor drops the partial frame.
    fn try_send_cmd(&mut self, cmd: &[u8]) -> Result<(), Error> {
        let serial = self.serial.as_mut().ok_or(Error::TransportAbsent)?;
        for byte in cmd {
            match serial.write(*byte) {
                Ok(()) => {}
                Err(nb::Error::WouldBlock) => return Err(Error::Write),
                Err(nb::Error::Other(_)) => {
                    self.diagnostics.record(Error::Write);
                    return Err(Error::Write);
                }
            }
        }
        Ok(())
    }
}

impl<'a, Serial> PollingComponent for Pm1003<'a, Serial>
where
    Serial: Read<u8> + Write<u8>,
{
    type Error = Error;

    fn setup(&mut self) -> Result<(), Error> {
        Pm1003::setup(self)
    }

    fn update(&mut self) {
        Pm1003::update(self)
    }

    fn update_at(&mut self, now: Instant) {
        Pm1003::update_at(self, now)
    }

    fn update_interval(&self) -> Duration {
        self.config.poll_interval
    }
}

impl<'a, TX, RX> Pm1003<'a, Wrapper<TX, RX>>
where
    TX: Write<u8>,
    RX: Read<u8>,
{
    ///
    /// Creates a new sensor instance using separate Read and Write embedded hal trait objects
    ///
    pub fn new_tx_rx(tx: TX, rx: RX, config: Config) -> Self {
        Self::with_uart(Wrapper(tx, rx), config)
    }
}

///
/// Stand-in transport for drivers built without a serial port. Never yields a byte.
///
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransport;

impl Read<u8> for NoTransport {
    type Error = Infallible;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        Err(nb::Error::WouldBlock)
    }
}

impl Write<u8> for NoTransport {
    type Error = Infallible;

    fn write(&mut self, _: u8) -> nb::Result<(), Self::Error> {
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

///
/// Combines two serial traits objects into one
///
pub struct Wrapper<TX, RX>(TX, RX)
where
    TX: Write<u8>,
    RX: Read<u8>;

impl<TX, RX> Wrapper<TX, RX>
where
    TX: Write<u8>,
    RX: Read<u8>,
{
    pub fn split(self) -> (TX, RX) {
        (self.0, self.1)
    }
}

impl<TX, RX> Read<u8> for Wrapper<TX, RX>
where
    TX: Write<u8>,
    RX: Read<u8>,
{
    type Error = RX::Error;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.1.read()
    }
}

impl<TX, RX> Write<u8> for Wrapper<TX, RX>
where
    TX: Write<u8>,
    RX: Read<u8>,
{
    type Error = TX::Error;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.0.write(word)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        self.0.flush()
    }
}
