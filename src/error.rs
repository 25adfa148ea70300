use core::fmt;

/// Everything that can go wrong between the serial port and a published reading.
///
/// Inside a polling cycle none of these are fatal: the cycle drops the reading,
/// bumps the matching [`Diagnostics`](crate::Diagnostics) counter and waits for
/// the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// No serial transport is attached, or the UART path is disabled
    TransportAbsent,
    /// Marker or length byte did not match where one was expected
    FrameDesync,
    /// Frame bytes do not sum to zero
    ChecksumMismatch,
    /// Frame too short or not starting with the marker
    MalformedFrame,
    /// The serial port reported a receive error
    Read,
    /// The serial port reported a transmit error
    Write,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::TransportAbsent => "no serial transport attached",
            Error::FrameDesync => "frame desync",
            Error::ChecksumMismatch => "checksum error",
            Error::MalformedFrame => "malformed frame",
            Error::Read => "read error",
            Error::Write => "error sending command",
        };
        f.write_str(msg)
    }
}

/// Counters for dropped and decoded frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    pub frames: u32,
    pub desyncs: u32,
    pub checksum_errors: u32,
    pub malformed_frames: u32,
    pub read_errors: u32,
    pub write_errors: u32,
}

impl Diagnostics {
    pub(crate) fn record(&mut self, error: Error) {
        let counter = match error {
            Error::FrameDesync => &mut self.desyncs,
            Error::ChecksumMismatch => &mut self.checksum_errors,
            Error::MalformedFrame => &mut self.malformed_frames,
            Error::Read => &mut self.read_errors,
            Error::Write => &mut self.write_errors,
            Error::TransportAbsent => return,
        };
        *counter = counter.wrapping_add(1);
    }

    pub(crate) fn frame_decoded(&mut self) {
        self.frames = self.frames.wrapping_add(1);
    }

    /// Total number of frames dropped for any reason
    pub fn dropped(&self) -> u32 {
        self.desyncs
            .wrapping_add(self.checksum_errors)
            .wrapping_add(self.malformed_frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_each_error_in_its_own_counter() {
        let mut diagnostics = Diagnostics::default();

        diagnostics.record(Error::FrameDesync);
        diagnostics.record(Error::ChecksumMismatch);
        diagnostics.record(Error::ChecksumMismatch);
        diagnostics.record(Error::MalformedFrame);
        diagnostics.record(Error::Read);

        assert_eq!(1, diagnostics.desyncs);
        assert_eq!(2, diagnostics.checksum_errors);
        assert_eq!(1, diagnostics.malformed_frames);
        assert_eq!(1, diagnostics.read_errors);
        assert_eq!(4, diagnostics.dropped());
    }

    #[test]
    fn absent_transport_is_not_counted() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.record(Error::TransportAbsent);
        assert_eq!(Diagnostics::default(), diagnostics);
    }
}
