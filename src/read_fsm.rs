use crate::frame::{verify_checksum, Frame, FRAME_SIZE, PAYLOAD_LEN, START_1, START_2};
use crate::Error;

#[derive(PartialEq, Debug)]
pub(crate) enum ReadStatus {
    InProgress,
    Finished(Frame),
    Failed(Error),
}

#[derive(PartialEq, Debug, Clone, Copy)]
enum State {
    WaitingForFirstMagicNumber,
    WaitingForSecondMagicNumber,
    WaitingForLength,
    Reading,
}

/// Assembles measurement frames one byte at a time.
///
/// The state survives between calls, so a frame may arrive spread over any
/// number of polling cycles.
pub(crate) struct ReadStateMachine {
    buffer: Frame,
    index: usize,
    state: State,
}

impl ReadStateMachine {
    pub(crate) fn new() -> Self {
        Self {
            buffer: [0; FRAME_SIZE],
            index: 0,
            state: State::WaitingForFirstMagicNumber,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.index = 0;
        self.state = State::WaitingForFirstMagicNumber;
    }

    fn magic_number_read(&mut self) {
        self.buffer[0] = START_1;
        self.buffer[1] = START_2;
        self.index = 2;
        self.state = State::WaitingForLength;
    }

    fn fail(&mut self, error: Error) -> ReadStatus {
        self.reset();
        ReadStatus::Failed(error)
    }

    fn byte_read(&mut self, byte: u8) -> ReadStatus {
        self.buffer[self.index] = byte;
        self.index += 1;
        if self.index < FRAME_SIZE {
            return ReadStatus::InProgress;
        }

        if !verify_checksum(&self.buffer) {
            return self.fail(Error::ChecksumMismatch);
        }
        self.reset();
        ReadStatus::Finished(self.buffer)
    }

    pub(crate) fn update(&mut self, byte: u8) -> ReadStatus {
        match self.state {
            State::WaitingForFirstMagicNumber => {
                if byte == START_1 {
                    self.state = State::WaitingForSecondMagicNumber;
                }
                ReadStatus::InProgress
            }
            State::WaitingForSecondMagicNumber => match byte {
                START_2 => {
                    self.magic_number_read();
                    ReadStatus::InProgress
                }
                START_1 => ReadStatus::InProgress,
                _ => self.fail(Error::FrameDesync),
            },
            State::WaitingForLength => {
                if byte == PAYLOAD_LEN {
                    self.buffer[self.index] = byte;
                    self.index += 1;
                    self.state = State::Reading;
                    ReadStatus::InProgress
                } else {
                    let status = self.fail(Error::FrameDesync);
                    if byte == START_1 {
                        self.state = State::WaitingForSecondMagicNumber;
                    }
                    status
                }
            }
            State::Reading => self.byte_read(byte),
        }
    }
}
