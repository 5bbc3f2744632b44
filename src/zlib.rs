//! Streaming zlib transform over a fixed working chunk.
//!
//! Input is fed `CHUNK` bytes at a time and the output buffer doubles
//! whenever the stream fills it, so neither side needs a known size.

use super::{Error, Result};
use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

const CHUNK: usize = 16 * 1024;

pub fn compress(input: &[u8]) -> Result<Vec<u8>> {
    // Left alive until this function returns, on every path.
    let mut stream = Compress::new(Compression::default(), true);
    let mut out: Vec<u8> = Vec::with_capacity(CHUNK);

    loop {
        grow_if_full(&mut out);

        let start = stream.total_in() as usize;
        let end = (start + CHUNK).min(input.len());
        let flush = if end == input.len() {
            FlushCompress::Finish
        } else {
            FlushCompress::None
        };

        let status = stream
            .compress_vec(&input[start..end], &mut out, flush)
            .map_err(|err| Error::CorruptStream(format!("deflate failed. {err}")))?;

        match status {
            Status::StreamEnd => return Ok(out),
            Status::Ok | Status::BufError => continue,
        }
    }
}

pub fn decompress(input: &[u8]) -> Result<Vec<u8>> {
    let mut stream = Decompress::new(true);
    let mut out: Vec<u8> = Vec::with_capacity(CHUNK);

    loop {
        grow_if_full(&mut out);

        let start = stream.total_in() as usize;
        let end = (start + CHUNK).min(input.len());
        let produced = stream.total_out();

        let status = stream
            .decompress_vec(&input[start..end], &mut out, FlushDecompress::None)
            .map_err(|err| {
                if err.needs_dictionary().is_some() {
                    Error::CorruptStream("stream requires a preset dictionary".into())
                } else {
                    Error::CorruptStream(format!("inflate failed. {err}"))
                }
            })?;

        if status == Status::StreamEnd {
            return Ok(out);
        }

        let stalled = stream.total_in() as usize == start && stream.total_out() == produced;
        if stalled && out.len() < out.capacity() {
            return Err(Error::CorruptStream(format!(
                "stream ended before its checksum after {} of {} bytes",
                start,
                input.len()
            )));
        }
    }
}

/// Doubles the spare capacity once the stream has filled the buffer.
fn grow_if_full(out: &mut Vec<u8>) {
    if out.len() == out.capacity() {
        out.reserve(out.capacity().max(CHUNK));
    }
}
