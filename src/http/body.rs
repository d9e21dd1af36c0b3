//! Body length resolution
//!
//! Decides how the body of a message is delimited, once its header section
//! is complete. Implements the message body length rules of RFC 9112 §6.3,
//! restricted to a single transfer-coding.

use log::debug;

use super::{Error, Headers, MessageKind, Result, StartLine};

/// The body kind of an HTTP message
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyKind {
    /// A fixed body length set by the `Content-Length` header.
    /// Messages without a body have the value `Fixed(0)`.
    Fixed(u64),
    /// A chunked body set by `Transfer-Encoding`.
    Chunked,
    /// The body is read until the end of input.
    ///
    /// Only used for responses without any length information.
    Eof,
}

/// Transfer-coding applied to a message
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransferCoding {
    /// No transfer-coding, or a single `identity`
    Identity,
    /// Exactly one non-identity coding
    Chunked,
}

/// Determine the transfer-coding from all `Transfer-Encoding` fields
///
/// More than one token, whether in one field or spread over several, is
/// rejected. `identity` counts as a token like any other.
pub fn transfer_coding(headers: &Headers) -> Result<TransferCoding> {
    let mut codings = headers.list_values("Transfer-Encoding");

    let first = match codings.next() {
        None => return Ok(TransferCoding::Identity),
        Some(token) => token,
    };
    if let Some(second) = codings.next() {
        return Err(Error::UnsupportedEncoding(format!("{}, {}", first, second)));
    }

    if first.eq_ignore_ascii_case("identity") {
        return Ok(TransferCoding::Identity);
    }
    if !first.eq_ignore_ascii_case("chunked") {
        debug!("treating transfer-coding {:?} as chunked", first);
    }
    Ok(TransferCoding::Chunked)
}

/// Determine the declared `Content-Length`, if any
///
/// Repeated fields and comma lists are accepted only if every value agrees.
pub fn content_length(headers: &Headers, max_content_length: u64) -> Result<Option<u64>> {
    let mut length: Option<u64> = None;

    for value in headers.list_values("Content-Length") {
        if !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidContentLength(value.to_string()));
        }
        let parsed = value
            .parse::<u64>()
            .map_err(|_| Error::InvalidContentLength(value.to_string()))?;
        if parsed > max_content_length {
            return Err(Error::InvalidContentLength(format!(
                "{} exceeds maximum of {}",
                parsed, max_content_length
            )));
        }
        match length {
            Some(prev) if prev != parsed => {
                return Err(Error::InvalidContentLength(format!(
                    "conflicting values {} and {}",
                    prev, parsed
                )));
            }
            _ => length = Some(parsed),
        }
    }

    // A field that was present but held only empty list elements
    if length.is_none() && headers.contains("Content-Length") {
        return Err(Error::InvalidContentLength(String::new()));
    }

    Ok(length)
}

/// Resolve the body kind of a message whose header section is complete
///
/// Algorithm:
///
/// 1. More than one transfer-coding -> error
/// 2. HEAD responses, 1xx, 204, 304 -- no body
/// 3. A transfer-coding -> Chunked (Content-Length is ignored)
/// 4. If Content-Length -> Fixed
/// 5. Else requests have no body, responses are read until Eof
pub fn resolve_body_kind(
    start_line: &StartLine,
    headers: &Headers,
    head_response: bool,
    max_content_length: u64,
) -> Result<BodyKind> {
    let coding = transfer_coding(headers)?;

    let forbids_body = match start_line {
        StartLine::Status(status) => head_response || status.status.forbids_body(),
        StartLine::Request(_) => false,
    };

    if coding == TransferCoding::Chunked {
        return Ok(if forbids_body {
            BodyKind::Fixed(0)
        } else {
            BodyKind::Chunked
        });
    }

    let length = content_length(headers, max_content_length)?;
    if forbids_body {
        return Ok(BodyKind::Fixed(0));
    }

    Ok(match (length, kind_of(start_line)) {
        (Some(n), _) => BodyKind::Fixed(n),
        (None, MessageKind::Request) => BodyKind::Fixed(0),
        (None, MessageKind::Response) => BodyKind::Eof,
    })
}

fn kind_of(start_line: &StartLine) -> MessageKind {
    match start_line {
        StartLine::Request(_) => MessageKind::Request,
        StartLine::Status(_) => MessageKind::Response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MAX_CONTENT_LENGTH;

    fn response(code: &str) -> StartLine {
        StartLine::parse(MessageKind::Response, &format!("HTTP/1.1 {}", code)).unwrap()
    }

    fn request() -> StartLine {
        StartLine::parse(MessageKind::Request, "POST /upload HTTP/1.1").unwrap()
    }

    fn headers(fields: &[(&str, &str)]) -> Headers {
        fields
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    fn resolve(line: &StartLine, fields: &[(&str, &str)]) -> Result<BodyKind> {
        resolve_body_kind(line, &headers(fields), false, MAX_CONTENT_LENGTH)
    }

    #[test]
    fn test_fixed_length() {
        assert_eq!(
            resolve(&response("200 OK"), &[("Content-Length", "42")]),
            Ok(BodyKind::Fixed(42))
        );
        assert_eq!(
            resolve(&request(), &[("content-length", "7")]),
            Ok(BodyKind::Fixed(7))
        );
    }

    #[test]
    fn test_no_length_information() {
        assert_eq!(resolve(&response("200 OK"), &[]), Ok(BodyKind::Eof));
        assert_eq!(resolve(&request(), &[]), Ok(BodyKind::Fixed(0)));
    }

    #[test]
    fn test_chunked_ignores_content_length() {
        assert_eq!(
            resolve(
                &response("200 OK"),
                &[("Content-Length", "bogus"), ("Transfer-Encoding", "chunked")]
            ),
            Ok(BodyKind::Chunked)
        );
        assert_eq!(
            resolve(&request(), &[("Transfer-Encoding", "Chunked")]),
            Ok(BodyKind::Chunked)
        );
    }

    #[test]
    fn test_single_identity_uses_content_length() {
        assert_eq!(
            resolve(
                &response("200 OK"),
                &[("Transfer-Encoding", "identity"), ("Content-Length", "3")]
            ),
            Ok(BodyKind::Fixed(3))
        );
    }

    #[test]
    fn test_single_other_coding_is_chunked() {
        assert_eq!(
            resolve(
                &response("200 OK"),
                &[("Transfer-Encoding", "gzip"), ("Content-Length", "9")]
            ),
            Ok(BodyKind::Chunked)
        );
    }

    #[test]
    fn test_identity_counts_as_a_coding() {
        for fields in [
            &[("Transfer-Encoding", "identity, chunked")][..],
            &[("Transfer-Encoding", "identity"), ("Transfer-Encoding", "chunked")][..],
            &[
                ("Transfer-Encoding", "identity"),
                ("Transfer-Encoding", "identity"),
                ("Content-Length", "0"),
            ][..],
        ] {
            let err = resolve(&response("200 OK"), fields).unwrap_err();
            assert!(matches!(err, Error::UnsupportedEncoding(_)), "{:?}", fields);
        }
    }

    #[test]
    fn test_multiple_codings_rejected() {
        let err = resolve(
            &response("200 OK"),
            &[("Transfer-Encoding", "chunked"), ("Transfer-Encoding", "chunked")],
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedEncoding(_)));

        let err = resolve(&request(), &[("Transfer-Encoding", "gzip, chunked")]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedEncoding(_)));
    }

    #[test]
    fn test_bodyless_statuses() {
        for code in ["100 Continue", "101 Switching", "204 No Content", "304 Not Modified"] {
            assert_eq!(
                resolve(&response(code), &[("Content-Length", "10")]),
                Ok(BodyKind::Fixed(0)),
                "status {}",
                code
            );
        }
        assert_eq!(
            resolve(&response("304 Not Modified"), &[("Transfer-Encoding", "chunked")]),
            Ok(BodyKind::Fixed(0))
        );
    }

    #[test]
    fn test_head_response() {
        let fields = headers(&[("Content-Length", "1000")]);
        assert_eq!(
            resolve_body_kind(&response("200 OK"), &fields, true, MAX_CONTENT_LENGTH),
            Ok(BodyKind::Fixed(0))
        );
        // The flag has no meaning for requests
        assert_eq!(
            resolve_body_kind(&request(), &fields, true, MAX_CONTENT_LENGTH),
            Ok(BodyKind::Fixed(1000))
        );
    }

    #[test]
    fn test_invalid_content_length() {
        for value in ["-1", "+5", "abc", "1.5", "", "99999999999999999999999"] {
            let err = resolve(&response("200 OK"), &[("Content-Length", value)]).unwrap_err();
            assert!(matches!(err, Error::InvalidContentLength(_)), "value {:?}", value);
        }
    }

    #[test]
    fn test_content_length_ceiling() {
        let max = MAX_CONTENT_LENGTH.to_string();
        assert_eq!(
            resolve(&response("200 OK"), &[("Content-Length", max.as_str())]),
            Ok(BodyKind::Fixed(MAX_CONTENT_LENGTH))
        );

        let over = (MAX_CONTENT_LENGTH + 1).to_string();
        assert!(resolve(&response("200 OK"), &[("Content-Length", over.as_str())]).is_err());

        let fields = headers(&[("Content-Length", "11")]);
        assert!(resolve_body_kind(&request(), &fields, false, 10).is_err());
    }

    #[test]
    fn test_repeated_content_length() {
        assert_eq!(
            resolve(
                &response("200 OK"),
                &[("Content-Length", "5"), ("Content-Length", "5, 5")]
            ),
            Ok(BodyKind::Fixed(5))
        );
        let err = resolve(
            &response("200 OK"),
            &[("Content-Length", "5"), ("Content-Length", "6")],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidContentLength(_)));
    }
}
