// Request line reader - bounded, byte-oriented framing of the input stream
#![allow(dead_code)]

use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// One unit of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Line contents without the terminator; bytes are not yet validated as UTF-8
    Line(Vec<u8>),
    /// Line exceeded the limit; its bytes were discarded
    TooLong(usize),
    Eof,
}

/// Splits input on `\n`, never buffering more than `max_line_bytes` of a line
///
/// `next_frame` is cancel safe: partial progress lives in `self`, so it can
/// sit in a `select!` arm that loses the race.
pub struct RequestLines<R> {
    reader: BufReader<R>,
    line: Vec<u8>,
    seen: usize,
    max_line_bytes: usize,
}

impl<R: AsyncRead + Unpin> RequestLines<R> {
    pub fn new(input: R, max_line_bytes: usize) -> Self {
        Self {
            reader: BufReader::new(input),
            line: Vec::new(),
            seen: 0,
            max_line_bytes,
        }
    }

    pub async fn next_frame(&mut self) -> io::Result<Frame> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                if self.seen == 0 {
                    return Ok(Frame::Eof);
                }
                return Ok(self.take_frame());
            }

            let newline = available.iter().position(|b| *b == b'\n');
            let body = &available[..newline.unwrap_or(available.len())];
            self.seen += body.len();
            if self.seen <= self.max_line_bytes {
                self.line.extend_from_slice(body);
            } else if !self.line.is_empty() {
                self.line = Vec::new();
            }

            let used = body.len() + usize::from(newline.is_some());
            self.reader.consume(used);
            if newline.is_some() {
                return Ok(self.take_frame());
            }
        }
    }

    fn take_frame(&mut self) -> Frame {
        let seen = std::mem::take(&mut self.seen);
        let mut line = std::mem::take(&mut self.line);
        if seen > self.max_line_bytes {
            return Frame::TooLong(seen);
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Frame::Line(line)
    }
}
