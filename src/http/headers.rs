//! HTTP headers handling
//!
//! This module provides a type for managing HTTP headers with case-insensitive
//! lookups and support for multiple values per header name, plus the decoder
//! that turns raw field lines into entries.

use super::{display_bytes, Error, Result};
use std::fmt;

/// HTTP headers collection
///
/// Headers are stored in insertion order and support:
/// - Case-insensitive header name lookups
/// - Multiple values for the same header name
/// - Iteration over all headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: Vec<(String, String)>,
}

impl Headers {
    /// Create a new empty headers collection
    pub fn new() -> Self {
        Headers {
            headers: Vec::new(),
        }
    }

    /// Insert a header
    ///
    /// If a header with the same name (case-insensitive) already exists,
    /// this adds another value rather than replacing it.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Values of every field named `name` (case-insensitive), in order
    fn matching<'a, 'n>(&'a self, name: &'n str) -> Matching<'a, 'n> {
        Matching {
            inner: self.headers.iter(),
            name,
        }
    }

    /// Get the first value for a header (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.matching(name).next()
    }

    /// Get all values for a header (case-insensitive)
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.matching(name).collect()
    }

    /// Count how many times a header appears
    pub fn count(&self, name: &str) -> usize {
        self.matching(name).count()
    }

    /// Check if a header exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Get the number of headers
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Check if there are no headers
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Iterate over all headers
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Comma-separated list elements across every value of `name`
    ///
    /// Elements are trimmed and empty elements skipped.
    pub fn list_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.matching(name)
            .flat_map(|v| v.split(','))
            .map(trim_ows)
            .filter(|item| !item.is_empty())
    }

    /// Check if the `Connection` header asks to close the connection
    pub fn connection_close(&self) -> bool {
        self.list_values("Connection")
            .any(|token| token.eq_ignore_ascii_case("close"))
    }

    /// Check if the `Connection` header asks to keep the connection alive
    pub fn connection_keep_alive(&self) -> bool {
        self.list_values("Connection")
            .any(|token| token.eq_ignore_ascii_case("keep-alive"))
    }

    /// Extend the value of the last inserted header
    fn continue_last(&mut self, folded: &str) -> bool {
        match self.headers.last_mut() {
            Some((_, value)) => {
                if !folded.is_empty() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(folded);
                }
                true
            }
            None => false,
        }
    }

    /// Parse a header line into name and value
    pub fn parse_header_line(line: &str) -> Result<(String, String)> {
        let colon_pos = line
            .find(':')
            .ok_or_else(|| Error::MalformedField(format!("No colon in header: {}", line)))?;

        let name = &line[..colon_pos];
        if name.is_empty() {
            return Err(Error::MalformedField("Empty header name".to_string()));
        }
        if name.bytes().any(|b| b.is_ascii_whitespace()) {
            return Err(Error::MalformedField(format!(
                "Whitespace in header name: {:?}",
                name
            )));
        }

        let value = trim_ows(&line[colon_pos + 1..]);
        Ok((name.to_string(), value.to_string()))
    }
}

struct Matching<'a, 'n> {
    inner: std::slice::Iter<'a, (String, String)>,
    name: &'n str,
}

impl<'a, 'n> Iterator for Matching<'a, 'n> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let name = self.name;
        self.inner
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.headers {
            writeln!(f, "{}: {}", name, value)?;
        }
        Ok(())
    }
}

impl FromIterator<(String, String)> for Headers {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Trim optional whitespace (SP / HTAB) from both ends
fn trim_ows(s: &str) -> &str {
    s.trim_matches(|c: char| c == ' ' || c == '\t')
}

/// Result of decoding one line of a header or trailer section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLine {
    /// A field was added or continued
    Field,
    /// The empty line closing the section
    EndOfHeaders,
}

/// Decode one raw field line (terminator already stripped) into `headers`
///
/// A line starting with SP or HTAB is an obsolete fold and continues the
/// previous field's value. On error `headers` is left unchanged.
pub fn decode_header_line(raw: &[u8], headers: &mut Headers, max_headers: usize) -> Result<FieldLine> {
    if raw.is_empty() {
        return Ok(FieldLine::EndOfHeaders);
    }

    let line = String::from_utf8_lossy(raw);

    if raw[0] == b' ' || raw[0] == b'\t' {
        if headers.continue_last(trim_ows(&line)) {
            return Ok(FieldLine::Field);
        }
        return Err(Error::MalformedField(format!(
            "Continuation line without a field: {}",
            display_bytes(raw)
        )));
    }

    if headers.len() >= max_headers {
        return Err(Error::TooManyFields { limit: max_headers });
    }

    let (name, value) = Headers::parse_header_line(&line)?;
    headers.insert(name, value);
    Ok(FieldLine::Field)
}
