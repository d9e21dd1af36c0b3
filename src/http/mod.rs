//! Incremental HTTP/1.x message parser
//!
//! This module turns an arbitrary sequence of byte chunks into a sequence of
//! parsed start-line / header / body events. It does no I/O of its own: the
//! owning connection layer feeds bytes with [`Parser::add_data`] and signals
//! end of input with [`Parser::on_end_data`].
//!
//! # Architecture
//!
//! The parser is split into small pieces, leaves first:
//!
//! - `buffer` holds bytes that arrived but were not consumed yet
//! - `scanner` extracts one CRLF-terminated line within a length limit
//! - `headers` decodes field lines into an ordered, case-insensitive multimap
//! - `body` decides how the message body is delimited
//! - `chunked` parses chunk-size lines
//! - `parser` drives everything and calls the [`EntityProcessor`]
//!
//! # Examples
//!
//! ```
//! use h1stream::http::{Collector, MessageKind, Parser};
//!
//! let mut parser = Parser::new(MessageKind::Response, Collector::new());
//! parser.add_data(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nHel").unwrap();
//! parser.add_data(b"lo").unwrap();
//!
//! let messages = parser.processor_mut().take_messages();
//! assert_eq!(messages.len(), 1);
//! assert_eq!(messages[0].body(), b"Hello");
//! ```

pub mod body;
pub mod buffer;
pub mod chunked;
pub mod headers;
pub mod message;
pub mod parser;
pub mod processor;
pub mod scanner;

pub use body::BodyKind;
pub use headers::Headers;
pub use message::{MessageKind, Method, RequestLine, StartLine, Status, StatusLine, Version};
pub use parser::{Parser, ParserState};
pub use processor::{Collector, EntityProcessor, Message};

/// Result type for parser operations
pub type Result<T> = std::result::Result<T, Error>;

/// Parser errors
///
/// Every variant is fatal: once returned, the parser stays in
/// [`ParserState::Error`] and the connection should be torn down.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Malformed start line: {0}")]
    MalformedStartLine(String),

    #[error("Malformed header field: {0}")]
    MalformedField(String),

    #[error("Line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("Header section exceeds {limit} bytes")]
    HeaderBudgetExceeded { limit: usize },

    #[error("More than {limit} header fields")]
    TooManyFields { limit: usize },

    #[error("Unsupported transfer encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),

    #[error("Malformed chunk header: {0}")]
    MalformedChunkHeader(String),

    #[error("Unexpected end of data")]
    UnexpectedEndOfData,

    #[error("Invalid call sequence in state {0:?}")]
    InvalidCallSequence(ParserState),
}

/// Maximum size of the start line plus header section (and of a trailer section)
pub const MAX_HEADER_LENGTH: usize = 8 * 1024;

/// Maximum size of a single start line or field line, terminator included
pub const MAX_LINE_LENGTH: usize = 4 * 1024;

/// Maximum accepted `Content-Length`
pub const MAX_CONTENT_LENGTH: u64 = 500 * 1024 * 1024;

/// Maximum size of a chunk-size line, extensions included
pub const MAX_CHUNK_LINE: usize = 1024;

/// Maximum number of fields per header or trailer section
pub const MAX_HEADERS: usize = 64;

/// Limits applied by a parser for its whole lifetime
///
/// The defaults are the crate ceilings. Limits can be tightened at
/// construction time but never raised above the ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_header_length: usize,
    pub max_line_length: usize,
    pub max_content_length: u64,
    pub max_chunk_line: usize,
    pub max_headers: usize,
}

impl Limits {
    /// Clamp every limit to its ceiling
    pub fn clamped(self) -> Self {
        Limits {
            max_header_length: self.max_header_length.min(MAX_HEADER_LENGTH),
            max_line_length: self.max_line_length.min(MAX_LINE_LENGTH),
            max_content_length: self.max_content_length.min(MAX_CONTENT_LENGTH),
            max_chunk_line: self.max_chunk_line.min(MAX_CHUNK_LINE),
            max_headers: self.max_headers.min(MAX_HEADERS),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_header_length: MAX_HEADER_LENGTH,
            max_line_length: MAX_LINE_LENGTH,
            max_content_length: MAX_CONTENT_LENGTH,
            max_chunk_line: MAX_CHUNK_LINE,
            max_headers: MAX_HEADERS,
        }
    }
}

/// Render raw bytes for an error message
///
/// Lossy UTF-8, cut at 64 characters.
pub(crate) fn display_bytes(raw: &[u8]) -> String {
    const SHOWN: usize = 64;
    let text = String::from_utf8_lossy(raw);
    if text.chars().count() > SHOWN {
        let mut cut: String = text.chars().take(SHOWN).collect();
        cut.push_str("...");
        cut
    } else {
        text.into_owned()
    }
}
