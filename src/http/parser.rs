//! HTTP message parsing
//!
//! This module provides the incremental parser that drives line scanning,
//! header decoding, body length resolution and chunk decoding across
//! repeated calls with partial input.

use super::body::{resolve_body_kind, BodyKind};
use super::buffer::Accumulator;
use super::chunked::{self, ChunkStep, ChunkedState};
use super::headers::{decode_header_line, FieldLine};
use super::scanner::{scan_line, LineLimit, Scan};
use super::{EntityProcessor, Error, Headers, Limits, MessageKind, Result, StartLine};
use bytes::Bytes;
use log::{debug, trace, warn};

/// Observable parser state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserState {
    /// Between messages, waiting for a start line
    Initial,
    /// Reading the header section
    GotStartLine,
    /// Header section complete, body not started
    GotHeaders,
    /// Reading an identity body
    ProcessingBody,
    /// Reading a chunked body
    ProcessingChunks,
    /// Reading the trailer section of a chunked body
    ProcessingTrailer,
    /// End of input was reached cleanly
    Finished,
    /// A fatal error occurred
    Error,
}

/// Bytes left in an identity body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Remaining {
    Bytes(u64),
    UntilEof,
}

#[derive(Debug)]
enum Stage {
    Initial,
    GotStartLine(StartLine),
    GotHeaders(StartLine),
    Body(Remaining),
    Chunks(ChunkedState),
    Trailer(Headers),
    Finished,
    Error,
}

impl Stage {
    fn state(&self) -> ParserState {
        match self {
            Stage::Initial => ParserState::Initial,
            Stage::GotStartLine(_) => ParserState::GotStartLine,
            Stage::GotHeaders(_) => ParserState::GotHeaders,
            Stage::Body(_) => ParserState::ProcessingBody,
            Stage::Chunks(_) => ParserState::ProcessingChunks,
            Stage::Trailer(_) => ParserState::ProcessingTrailer,
            Stage::Finished => ParserState::Finished,
            Stage::Error => ParserState::Error,
        }
    }
}

/// Outcome of one dispatch step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    Advanced,
    NeedMoreData,
}

/// Incremental HTTP/1.x parser
///
/// Feed bytes with [`add_data`](Parser::add_data) in any split; parsed
/// pieces are delivered to the [`EntityProcessor`] as soon as they are
/// complete. Several pipelined messages in one call are all processed.
///
/// Every error is fatal: the parser moves to [`ParserState::Error`] and
/// rejects further input.
pub struct Parser<P: EntityProcessor> {
    kind: MessageKind,
    limits: Limits,
    processor: P,
    buffer: Accumulator,
    stage: Stage,
    headers: Headers,
    header_budget: usize,
    head_response: bool,
    error: Option<Error>,
}

impl<P: EntityProcessor> Parser<P> {
    /// Create a parser with the default limits
    pub fn new(kind: MessageKind, processor: P) -> Self {
        Self::with_limits(kind, processor, Limits::default())
    }

    /// Create a parser with custom limits
    ///
    /// Limits above the crate ceilings are clamped.
    pub fn with_limits(kind: MessageKind, mut processor: P, limits: Limits) -> Self {
        let limits = limits.clamped();
        let headers = processor.create_header_container();
        Parser {
            kind,
            limits,
            processor,
            buffer: Accumulator::new(),
            stage: Stage::Initial,
            headers,
            header_budget: limits.max_header_length,
            head_response: false,
            error: None,
        }
    }

    /// Get the current state
    pub fn state(&self) -> ParserState {
        self.stage.state()
    }

    /// Get the message kind this parser decodes
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Get the limits in effect
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// The error that moved the parser to [`ParserState::Error`]
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Number of received bytes not parsed yet
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Get a reference to the processor
    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Get a mutable reference to the processor
    pub fn processor_mut(&mut self) -> &mut P {
        &mut self.processor
    }

    /// Consume the parser and return the processor
    pub fn into_processor(self) -> P {
        self.processor
    }

    /// Announce that the next response answers a HEAD request
    ///
    /// Its body is then empty whatever its headers say. The flag is cleared
    /// once that response's header section is complete.
    pub fn expect_head_response(&mut self) {
        self.head_response = true;
    }

    /// Feed received bytes
    ///
    /// Returns `Ok(())` once all buffered input is processed or more input
    /// is needed.
    pub fn add_data(&mut self, data: &[u8]) -> Result<()> {
        self.check_usable()?;
        self.buffer.append(data);

        loop {
            match self.step() {
                Ok(Progress::Advanced) => continue,
                Ok(Progress::NeedMoreData) => return Ok(()),
                Err(err) => return Err(self.fail(err)),
            }
        }
    }

    /// Signal that no more bytes will arrive
    ///
    /// Valid between messages, and while reading a body delimited by the
    /// end of input, which is completed here.
    pub fn on_end_data(&mut self) -> Result<()> {
        self.check_usable()?;

        match self.stage {
            Stage::Initial if self.buffer.is_empty() => {}
            Stage::Body(Remaining::UntilEof) => {
                self.deliver(self.buffer.len());
                self.end_of_entity();
            }
            _ => return Err(self.fail(Error::UnexpectedEndOfData)),
        }

        debug!("end of input, parser finished");
        self.stage = Stage::Finished;
        Ok(())
    }

    fn check_usable(&self) -> Result<()> {
        match self.stage {
            Stage::Finished | Stage::Error => Err(Error::InvalidCallSequence(self.state())),
            _ => Ok(()),
        }
    }

    fn fail(&mut self, err: Error) -> Error {
        warn!("parser failed in state {:?}: {}", self.state(), err);
        self.stage = Stage::Error;
        self.error = Some(err.clone());
        err
    }

    fn step(&mut self) -> Result<Progress> {
        match self.state() {
            ParserState::Initial => self.read_start_line(),
            ParserState::GotStartLine => self.read_header_line(),
            ParserState::GotHeaders => self.start_entity(),
            ParserState::ProcessingBody => self.read_body(),
            ParserState::ProcessingChunks => self.read_chunks(),
            ParserState::ProcessingTrailer => self.read_trailer_line(),
            ParserState::Finished | ParserState::Error => Ok(Progress::NeedMoreData),
        }
    }

    /// Scan one line of the header or trailer section, charging the budget
    fn scan_section_line(&mut self) -> Result<Option<Bytes>> {
        let limit = LineLimit::tighter(
            self.limits.max_line_length,
            self.header_budget,
            self.limits.max_header_length,
        );
        match scan_line(&mut self.buffer, limit)? {
            Scan::Line { line, consumed } => {
                self.header_budget -= consumed;
                Ok(Some(line))
            }
            Scan::NeedMoreData => Ok(None),
        }
    }

    fn read_start_line(&mut self) -> Result<Progress> {
        if self.buffer.is_empty() {
            return Ok(Progress::NeedMoreData);
        }
        let line = match self.scan_section_line()? {
            Some(line) => line,
            None => return Ok(Progress::NeedMoreData),
        };

        // Empty lines ahead of a start line are skipped
        if line.is_empty() {
            return Ok(Progress::Advanced);
        }

        let start_line = StartLine::parse(self.kind, &String::from_utf8_lossy(&line))?;
        debug!("start line: {}", start_line);
        self.stage = Stage::GotStartLine(start_line);
        Ok(Progress::Advanced)
    }

    fn read_header_line(&mut self) -> Result<Progress> {
        let line = match self.scan_section_line()? {
            Some(line) => line,
            None => return Ok(Progress::NeedMoreData),
        };

        match decode_header_line(&line, &mut self.headers, self.limits.max_headers)? {
            FieldLine::Field => {}
            FieldLine::EndOfHeaders => {
                if let Stage::GotStartLine(start_line) =
                    std::mem::replace(&mut self.stage, Stage::Initial)
                {
                    self.stage = Stage::GotHeaders(start_line);
                }
            }
        }
        Ok(Progress::Advanced)
    }

    fn start_entity(&mut self) -> Result<Progress> {
        let start_line = match std::mem::replace(&mut self.stage, Stage::Initial) {
            Stage::GotHeaders(start_line) => start_line,
            other => {
                self.stage = other;
                return Ok(Progress::NeedMoreData);
            }
        };

        let body = resolve_body_kind(
            &start_line,
            &self.headers,
            self.head_response,
            self.limits.max_content_length,
        )?;
        debug!(
            "header section complete: {} fields, body {:?}",
            self.headers.len(),
            body
        );

        self.head_response = false;
        let headers = std::mem::take(&mut self.headers);
        self.processor.on_start_of_entity(start_line, headers);

        self.stage = match body {
            BodyKind::Fixed(n) => Stage::Body(Remaining::Bytes(n)),
            BodyKind::Eof => Stage::Body(Remaining::UntilEof),
            BodyKind::Chunked => Stage::Chunks(ChunkedState::Size),
        };
        Ok(Progress::Advanced)
    }

    fn read_body(&mut self) -> Result<Progress> {
        let remaining = match self.stage {
            Stage::Body(remaining) => remaining,
            _ => return Ok(Progress::NeedMoreData),
        };

        match remaining {
            Remaining::Bytes(0) => {
                self.end_of_entity();
                Ok(Progress::Advanced)
            }
            _ if self.buffer.is_empty() => Ok(Progress::NeedMoreData),
            Remaining::Bytes(left) => {
                let n = left.min(self.buffer.len() as u64);
                self.deliver(n as usize);
                self.stage = Stage::Body(Remaining::Bytes(left - n));
                Ok(Progress::Advanced)
            }
            Remaining::UntilEof => {
                self.deliver(self.buffer.len());
                Ok(Progress::NeedMoreData)
            }
        }
    }

    fn read_chunks(&mut self) -> Result<Progress> {
        let step = match &mut self.stage {
            Stage::Chunks(state) => {
                chunked::step(state, &mut self.buffer, self.limits.max_chunk_line)?
            }
            _ => return Ok(Progress::NeedMoreData),
        };

        match step {
            ChunkStep::Data(data) => {
                trace!("delivering {} chunk bytes", data.len());
                self.processor.on_entity_data(data);
                Ok(Progress::Advanced)
            }
            ChunkStep::Continue => Ok(Progress::Advanced),
            ChunkStep::LastChunk => {
                debug!("last chunk, reading trailer section");
                self.header_budget = self.limits.max_header_length;
                self.stage = Stage::Trailer(Headers::new());
                Ok(Progress::Advanced)
            }
            ChunkStep::NeedMoreData => Ok(Progress::NeedMoreData),
        }
    }

    fn read_trailer_line(&mut self) -> Result<Progress> {
        let line = match self.scan_section_line()? {
            Some(line) => line,
            None => return Ok(Progress::NeedMoreData),
        };

        let max_headers = self.limits.max_headers;
        let end = match &mut self.stage {
            Stage::Trailer(trailers) => {
                decode_header_line(&line, trailers, max_headers)? == FieldLine::EndOfHeaders
            }
            _ => return Ok(Progress::NeedMoreData),
        };

        if end {
            if let Stage::Trailer(trailers) = std::mem::replace(&mut self.stage, Stage::Initial) {
                if !trailers.is_empty() {
                    debug!("{} trailer fields", trailers.len());
                    self.processor.on_trailers(trailers);
                }
            }
            self.end_of_entity();
        }
        Ok(Progress::Advanced)
    }

    /// Hand the first `n` buffered bytes to the processor
    fn deliver(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        trace!("delivering {} body bytes", n);
        let data = self.buffer.split_to(n);
        self.processor.on_entity_data(data);
    }

    /// Complete the current message and get ready for the next one
    fn end_of_entity(&mut self) {
        debug!("end of entity");
        self.processor.on_end_of_entity();
        self.headers = self.processor.create_header_container();
        self.header_budget = self.limits.max_header_length;
        self.stage = Stage::Initial;
    }
}
