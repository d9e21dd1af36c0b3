//! Entity processor
//!
//! The consumer of parser events. A [`Parser`](super::Parser) calls these
//! methods synchronously from inside `add_data` / `on_end_data`.

use super::{Headers, StartLine};
use bytes::{Bytes, BytesMut};

/// Consumer of parsed messages
///
/// For every message the parser calls `on_start_of_entity` once, then
/// `on_entity_data` zero or more times, then `on_trailers` if a chunked body
/// carried trailer fields, then `on_end_of_entity` once.
pub trait EntityProcessor {
    /// Provide the header container for the next message
    ///
    /// Called when the parser is created and after each completed message.
    fn create_header_container(&mut self) -> Headers {
        Headers::new()
    }

    /// The start line and header section are complete
    fn on_start_of_entity(&mut self, start_line: StartLine, headers: Headers);

    /// A contiguous piece of the decoded body; never empty
    fn on_entity_data(&mut self, data: Bytes);

    /// Trailer fields of a chunked body
    fn on_trailers(&mut self, _trailers: Headers) {}

    /// The body is complete
    fn on_end_of_entity(&mut self);
}

impl<P: EntityProcessor + ?Sized> EntityProcessor for &mut P {
    fn create_header_container(&mut self) -> Headers {
        (**self).create_header_container()
    }

    fn on_start_of_entity(&mut self, start_line: StartLine, headers: Headers) {
        (**self).on_start_of_entity(start_line, headers)
    }

    fn on_entity_data(&mut self, data: Bytes) {
        (**self).on_entity_data(data)
    }

    fn on_trailers(&mut self, trailers: Headers) {
        (**self).on_trailers(trailers)
    }

    fn on_end_of_entity(&mut self) {
        (**self).on_end_of_entity()
    }
}

/// A complete HTTP message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    start_line: StartLine,
    headers: Headers,
    trailers: Headers,
    body: Bytes,
}

impl Message {
    /// Get the start line
    pub fn start_line(&self) -> &StartLine {
        &self.start_line
    }

    /// Get the headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get the trailer fields, empty unless the body was chunked
    pub fn trailers(&self) -> &Headers {
        &self.trailers
    }

    /// Get the body
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Check if the connection should be closed after this message
    pub fn wants_close(&self) -> bool {
        self.start_line.wants_close(&self.headers)
    }
}

/// An entity processor that buffers whole messages
///
/// Bodies are accumulated in memory; use it when messages are known to be
/// small, or as a reference consumer.
#[derive(Debug, Default)]
pub struct Collector {
    current: Option<(StartLine, Headers, Headers)>,
    body: BytesMut,
    messages: Vec<Message>,
}

impl Collector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed messages, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Remove and return the completed messages
    pub fn take_messages(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    /// Check if a message has started but not ended
    pub fn in_progress(&self) -> bool {
        self.current.is_some()
    }
}

impl EntityProcessor for Collector {
    fn on_start_of_entity(&mut self, start_line: StartLine, headers: Headers) {
        self.body.clear();
        self.current = Some((start_line, headers, Headers::new()));
    }

    fn on_entity_data(&mut self, data: Bytes) {
        self.body.extend_from_slice(&data);
    }

    fn on_trailers(&mut self, trailers: Headers) {
        if let Some((_, _, current)) = self.current.as_mut() {
            *current = trailers;
        }
    }

    fn on_end_of_entity(&mut self) {
        if let Some((start_line, headers, trailers)) = self.current.take() {
            self.messages.push(Message {
                start_line,
                headers,
                trailers,
                body: self.body.split().freeze(),
            });
        }
    }
}
