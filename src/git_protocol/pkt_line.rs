use super::{Error, Result};
use std::fmt;

const LEN_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum PktLine {
    Data(Vec<u8>),
    Flush,
}

impl PktLine {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Data(bytes.into())
    }

    pub fn flush() -> Self {
        Self::Flush
    }

    pub fn size(&self) -> usize {
        match self {
            Self::Data(bytes) => bytes.len() + LEN_SIZE,
            Self::Flush => 0,
        }
    }

    /// `<4 hex digit length><payload>`, or `0000` for a flush.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = format!("{:04x}", self.size()).into_bytes();
        if let Self::Data(bytes) = self {
            buf.extend_from_slice(bytes);
        }
        buf
    }
}

impl fmt::Display for PktLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.encode()))
    }
}

/// Splits a buffer into pkt-lines.
///
/// In lenient mode a line whose first four bytes are not a hex length is
/// taken as a bare record running up to and including the next newline.
#[derive(Debug, Clone)]
pub struct PktLines<'a> {
    buf: &'a [u8],
    pos: usize,
    lenient: bool,
}

impl<'a> PktLines<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            lenient: false,
        }
    }

    pub fn lenient(buf: &'a [u8]) -> Self {
        Self {
            lenient: true,
            ..Self::new(buf)
        }
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn read_line(&mut self) -> Result<PktLine> {
        let rest = self.remaining();

        let Some(len) = rest.get(..LEN_SIZE).and_then(line_size) else {
            if self.lenient {
                let end = rest
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(rest.len(), |n| n + 1);
                self.pos += end;
                return Ok(PktLine::new(&rest[..end]));
            }
            return Err(Error::Network(format!(
                "invalid pkt-line length at offset {}: {:?}",
                self.pos,
                String::from_utf8_lossy(&rest[..rest.len().min(LEN_SIZE)])
            )));
        };

        if len == 0 {
            self.pos += LEN_SIZE;
            return Ok(PktLine::flush());
        }
        if len < LEN_SIZE {
            return Err(Error::Network(format!(
                "unsupported pkt-line length {len:04x} at offset {}",
                self.pos
            )));
        }
        if rest.len() < len {
            return Err(Error::Network(format!(
                "pkt-line at offset {} needs {len} bytes, {} left",
                self.pos,
                rest.len()
            )));
        }

        self.pos += len;
        Ok(PktLine::new(&rest[LEN_SIZE..len]))
    }
}

impl Iterator for PktLines<'_> {
    type Item = Result<PktLine>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.buf.len() {
            return None;
        }

        let line = self.read_line();
        if line.is_err() {
            self.pos = self.buf.len();
        }
        Some(line)
    }
}

fn line_size(buf: &[u8]) -> Option<usize> {
    if !buf.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let len_str = std::str::from_utf8(buf).ok()?;
    usize::from_str_radix(len_str, 16).ok()
}
