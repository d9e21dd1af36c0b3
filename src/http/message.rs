//! HTTP start-line types
//!
//! This module defines the request-line and status-line of an HTTP message
//! and the functions that parse them.

use super::{Error, Headers, Result};
use std::fmt;
use std::str::FromStr;

/// Which side of the exchange a parser decodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Messages start with a request-line
    Request,
    /// Messages start with a status-line
    Response,
}

/// HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl Method {
    /// Convert method to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Patch => "PATCH",
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "CONNECT" => Ok(Method::Connect),
            "OPTIONS" => Ok(Method::Options),
            "TRACE" => Ok(Method::Trace),
            "PATCH" => Ok(Method::Patch),
            _ => Err(Error::MalformedStartLine(format!("Unknown method: {}", s))),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    Http10,
    #[default]
    Http11,
}

impl Version {
    /// Convert version to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "HTTP/1.0" => Ok(Version::Http10),
            "HTTP/1.1" => Ok(Version::Http11),
            _ => Err(Error::MalformedStartLine(format!("Unsupported version: {}", s))),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status {
    code: u16,
}

impl Status {
    /// Create a new status code
    pub fn new(code: u16) -> Result<Self> {
        if (100..600).contains(&code) {
            Ok(Status { code })
        } else {
            Err(Error::MalformedStartLine(format!("Invalid status code: {}", code)))
        }
    }

    /// Get the status code
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Get the canonical reason phrase for this status code
    ///
    /// Used when a status-line omits its reason phrase.
    pub fn reason_phrase(&self) -> &'static str {
        match self.code {
            100 => "Continue",
            101 => "Switching Protocols",
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            206 => "Partial Content",
            301 => "Moved Permanently",
            302 => "Found",
            304 => "Not Modified",
            400 => "Bad Request",
            404 => "Not Found",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            _ => match self.code / 100 {
                1 => "Informational",
                2 => "Success",
                3 => "Redirection",
                4 => "Client Error",
                _ => "Server Error",
            },
        }
    }

    /// Check if this is an informational status (1xx)
    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.code)
    }

    /// Check if a response with this status never carries a body
    ///
    /// True for 1xx, 204 No Content and 304 Not Modified.
    pub fn forbids_body(&self) -> bool {
        self.is_informational() || self.code == 204 || self.code == 304
    }

    pub const NO_CONTENT: Status = Status { code: 204 };
    pub const NOT_MODIFIED: Status = Status { code: 304 };
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.reason_phrase())
    }
}

/// Parsed request-line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub target: String,
    pub version: Version,
}

/// Parsed status-line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: Version,
    pub status: Status,
    pub reason: String,
}

/// First line of an HTTP message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartLine {
    Request(RequestLine),
    Status(StatusLine),
}

impl StartLine {
    /// Parse a start-line of the given kind
    pub fn parse(kind: MessageKind, line: &str) -> Result<Self> {
        match kind {
            MessageKind::Request => parse_request_line(line).map(StartLine::Request),
            MessageKind::Response => parse_status_line(line).map(StartLine::Status),
        }
    }

    /// Protocol version of the message
    pub fn version(&self) -> Version {
        match self {
            StartLine::Request(req) => req.version,
            StartLine::Status(status) => status.version,
        }
    }

    /// The request-line, if this is a request
    pub fn request(&self) -> Option<&RequestLine> {
        match self {
            StartLine::Request(req) => Some(req),
            StartLine::Status(_) => None,
        }
    }

    /// The status-line, if this is a response
    pub fn status(&self) -> Option<&StatusLine> {
        match self {
            StartLine::Request(_) => None,
            StartLine::Status(status) => Some(status),
        }
    }

    /// Check if the connection should be closed after this message
    ///
    /// HTTP/1.1 closes only on `Connection: close`; HTTP/1.0 closes unless
    /// `Connection: keep-alive` was sent.
    pub fn wants_close(&self, headers: &Headers) -> bool {
        match self.version() {
            Version::Http11 => headers.connection_close(),
            Version::Http10 => !headers.connection_keep_alive() || headers.connection_close(),
        }
    }
}

impl fmt::Display for StartLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartLine::Request(req) => write!(f, "{} {} {}", req.method, req.target, req.version),
            StartLine::Status(status) => write!(
                f,
                "{} {} {}",
                status.version,
                status.status.code(),
                status.reason
            ),
        }
    }
}

/// Parse HTTP request line
///
/// Format: METHOD URI VERSION
/// Example: GET /index.html HTTP/1.1
pub fn parse_request_line(line: &str) -> Result<RequestLine> {
    let parts: Vec<&str> = line.split(' ').collect();

    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(Error::MalformedStartLine(format!(
            "Invalid request line: {:?}",
            line
        )));
    }

    Ok(RequestLine {
        method: parts[0].parse()?,
        target: parts[1].to_string(),
        version: parts[2].parse()?,
    })
}

/// Parse HTTP response status line
///
/// Format: VERSION STATUS [REASON]
/// Example: HTTP/1.1 200 OK
pub fn parse_status_line(line: &str) -> Result<StatusLine> {
    let mut parts = line.splitn(3, ' ');

    let version: Version = parts.next().unwrap_or_default().parse()?;

    let code_str = parts.next().unwrap_or_default();
    if code_str.len() != 3 || !code_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::MalformedStartLine(format!(
            "Invalid status code: {:?}",
            code_str
        )));
    }
    let code = code_str
        .parse::<u16>()
        .map_err(|_| Error::MalformedStartLine(format!("Invalid status code: {:?}", code_str)))?;
    let status = Status::new(code)?;

    let reason = match parts.next().map(str::trim) {
        Some(reason) if !reason.is_empty() => reason.to_string(),
        _ => status.reason_phrase().to_string(),
    };

    Ok(StatusLine {
        version,
        status,
        reason,
    })
}
