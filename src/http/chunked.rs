//! Chunked transfer encoding support
//!
//! This module decodes the chunk framing of a chunked body. The trailer
//! section after the last chunk is left to the header decoder.

use super::buffer::Accumulator;
use super::scanner::{scan_line, LineLimit, Scan};
use super::{display_bytes, Error, Result};
use bytes::Bytes;

/// Position inside the chunk framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkedState {
    /// Expecting a chunk-size line
    Size,
    /// Inside chunk data
    Data { remaining: u64 },
    /// Expecting the CRLF that closes chunk data
    DataEnd,
}

/// Result of one decoding step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkStep {
    /// Decoded body bytes, never empty
    Data(Bytes),
    /// Framing consumed, call again
    Continue,
    /// The zero-size chunk was read; the trailer section follows
    LastChunk,
    /// Buffered input is exhausted
    NeedMoreData,
}

/// Parse a chunk-size line (terminator already stripped)
///
/// Format: HEXDIGITS [BWS] [; extensions]
///
/// Chunk extensions are discarded without interpretation.
pub fn parse_chunk_size_line(line: &[u8]) -> Result<u64> {
    let malformed = || Error::MalformedChunkHeader(display_bytes(line));

    let digits_end = line
        .iter()
        .position(|b| !b.is_ascii_hexdigit())
        .unwrap_or(line.len());
    if digits_end == 0 {
        return Err(malformed());
    }

    let rest = &line[digits_end..];
    let rest_start = rest
        .iter()
        .position(|&b| b != b' ' && b != b'\t')
        .unwrap_or(rest.len());
    match rest.get(rest_start) {
        None | Some(b';') => {}
        Some(_) => return Err(malformed()),
    }

    // Only ASCII hex digits were selected above
    let digits = std::str::from_utf8(&line[..digits_end]).map_err(|_| malformed())?;
    u64::from_str_radix(digits, 16).map_err(|_| malformed())
}

/// Advance the chunk framing by one step
///
/// Consumes from `acc` only what the step used.
pub fn step(state: &mut ChunkedState, acc: &mut Accumulator, max_chunk_line: usize) -> Result<ChunkStep> {
    match *state {
        ChunkedState::Size => {
            let line = match scan_line(acc, LineLimit::Line(max_chunk_line)) {
                Ok(Scan::Line { line, .. }) => line,
                Ok(Scan::NeedMoreData) => return Ok(ChunkStep::NeedMoreData),
                Err(_) => {
                    return Err(Error::MalformedChunkHeader(format!(
                        "chunk-size line exceeds {} bytes",
                        max_chunk_line
                    )))
                }
            };
            match parse_chunk_size_line(&line)? {
                0 => Ok(ChunkStep::LastChunk),
                size => {
                    *state = ChunkedState::Data { remaining: size };
                    Ok(ChunkStep::Continue)
                }
            }
        }

        ChunkedState::Data { remaining } => {
            if acc.is_empty() {
                return Ok(ChunkStep::NeedMoreData);
            }
            let n = remaining.min(acc.len() as u64);
            let data = acc.split_to(n as usize);
            *state = match remaining - n {
                0 => ChunkedState::DataEnd,
                left => ChunkedState::Data { remaining: left },
            };
            Ok(ChunkStep::Data(data))
        }

        ChunkedState::DataEnd => match acc.as_slice() {
            [] | [b'\r'] => Ok(ChunkStep::NeedMoreData),
            [b'\r', b'\n', ..] => {
                acc.consume(2);
                *state = ChunkedState::Size;
                Ok(ChunkStep::Continue)
            }
            [b'\n', ..] => {
                acc.consume(1);
                *state = ChunkedState::Size;
                Ok(ChunkStep::Continue)
            }
            other => Err(Error::MalformedChunkHeader(format!(
                "Expected CRLF after chunk data, got {}",
                display_bytes(&other[..other.len().min(2)])
            ))),
        },
    }
}
