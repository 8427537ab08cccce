// Newline-delimited framing for the stdio transport
//
// Unlike `LinesCodec`, bad lines are yielded as frames instead of errors, so a
// single malformed message cannot end the stream.

use bytes::{Buf, BytesMut};
use std::io;
use tokio_util::codec::Decoder;

/// Longest accepted message line, in bytes
pub const MAX_MESSAGE_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// One line of text without its terminator
    Message(String),
    /// A line that was not valid UTF-8
    InvalidUtf8,
    /// A line over the length limit; its bytes were dropped
    TooLong,
}

#[derive(Debug)]
pub struct MessageCodec {
    max_length: usize,
    // Bytes before this index are known to hold no newline
    next_index: usize,
    discarding: bool,
}

impl MessageCodec {
    pub fn new() -> Self {
        Self::with_max_length(MAX_MESSAGE_BYTES)
    }

    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn frame(line: &[u8]) -> Frame {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    match std::str::from_utf8(line) {
        Ok(text) => Frame::Message(text.to_string()),
        Err(_) => Frame::InvalidUtf8,
    }
}

impl Decoder for MessageCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, io::Error> {
        loop {
            // Never scan more than one byte past the limit
            let read_to = buf.len().min(self.max_length.saturating_add(1));
            let newline = buf[self.next_index..read_to]
                .iter()
                .position(|b| *b == b'\n');

            match (self.discarding, newline) {
                (true, Some(offset)) => {
                    buf.advance(self.next_index + offset + 1);
                    self.next_index = 0;
                    self.discarding = false;
                    return Ok(Some(Frame::TooLong));
                }
                (true, None) => {
                    buf.advance(read_to);
                    self.next_index = 0;
                    if buf.is_empty() {
                        return Ok(None);
                    }
                }
                (false, Some(offset)) => {
                    let end = self.next_index + offset;
                    self.next_index = 0;
                    let line = buf.split_to(end + 1);
                    return Ok(Some(frame(&line[..end])));
                }
                (false, None) if buf.len() > self.max_length => {
                    self.discarding = true;
                }
                (false, None) => {
                    self.next_index = read_to;
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, io::Error> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }

        self.next_index = 0;
        if self.discarding {
            buf.clear();
            self.discarding = false;
            return Ok(Some(Frame::TooLong));
        }
        if buf.is_empty() {
            return Ok(None);
        }

        let line = buf.split_to(buf.len());
        Ok(Some(frame(&line)))
    }
}
