#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use pm1003::{BinarySink, MeasurementSink};

pub const FRAME: [u8; 8] = [0x42, 0x4d, 0x04, 0x00, 0x7b, 0x01, 0x00, 0xf1];

/// Builds a measurement frame for `pm2_5_x10` tenths of µg/m³.
pub fn frame(pm2_5_x10: u16, presence: bool) -> [u8; 8] {
    let [hi, lo] = pm2_5_x10.to_be_bytes();
    let mut frame = [0x42, 0x4d, 0x04, hi, lo, presence as u8, 0x00, 0x00];
    frame[7] = pm1003::frame::checksum(&frame[..7]);
    frame
}

/// Serial port whose receive side the test fills between cycles
#[derive(Clone, Default)]
pub struct SerialMock {
    rx: Rc<RefCell<VecDeque<u8>>>,
    tx: Rc<RefCell<Vec<u8>>>,
    rx_error: Rc<RefCell<bool>>,
}

impl SerialMock {
    pub fn push(&self, bytes: &[u8]) {
        self.rx.borrow_mut().extend(bytes.iter().copied());
    }

    pub fn pending(&self) -> usize {
        self.rx.borrow().len()
    }

    pub fn written(&self) -> Vec<u8> {
        self.tx.borrow().clone()
    }

    pub fn fail_next_read(&self) {
        *self.rx_error.borrow_mut() = true;
    }
}

impl embedded_hal::serial::Read<u8> for SerialMock {
    type Error = ();

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        if self.rx_error.replace(false) {
            return Err(nb::Error::Other(()));
        }
        self.rx.borrow_mut().pop_front().ok_or(nb::Error::WouldBlock)
    }
}

impl embedded_hal::serial::Write<u8> for SerialMock {
    type Error = ();

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.tx.borrow_mut().push(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Default)]
pub struct BinaryRecorder {
    pub states: Vec<bool>,
}

impl BinarySink for BinaryRecorder {
    fn set_state(&mut self, state: bool) {
        self.states.push(state);
    }
}

#[derive(Default)]
pub struct MeasurementRecorder {
    pub values: Vec<f32>,
}

impl MeasurementSink for MeasurementRecorder {
    fn publish(&mut self, value: f32) {
        self.values.push(value);
    }
}
