//! Consumers of decoded readings
//!
//! Both are owned by the host; the driver only borrows them.

/// Receives the presence flag of every decoded frame
pub trait BinarySink {
    fn set_state(&mut self, state: bool);
}

/// Receives the PM2.5 concentration in µg/m³
pub trait MeasurementSink {
    fn publish(&mut self, value: f32);
}

impl<F> BinarySink for F
where
    F: FnMut(bool),
{
    fn set_state(&mut self, state: bool) {
        self(state)
    }
}

impl<F> MeasurementSink for F
where
    F: FnMut(f32),
{
    fn publish(&mut self, value: f32) {
        self(value)
    }
}
