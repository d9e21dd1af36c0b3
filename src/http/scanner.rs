//! Line scanning
//!
//! Finds one line at the front of the buffered input. Lines end in CRLF; a
//! bare LF is accepted as well.

use super::buffer::Accumulator;
use super::{Error, Result};
use bytes::Bytes;

/// Which limit bounds a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineLimit {
    /// Per-line ceiling, reported as [`Error::LineTooLong`]
    Line(usize),
    /// Remaining section budget, reported as [`Error::HeaderBudgetExceeded`]
    Budget { remaining: usize, total: usize },
}

impl LineLimit {
    /// Pick the tighter of a per-line limit and a remaining section budget
    pub fn tighter(line: usize, remaining: usize, total: usize) -> Self {
        if remaining < line {
            LineLimit::Budget { remaining, total }
        } else {
            LineLimit::Line(line)
        }
    }

    fn max_len(&self) -> usize {
        match *self {
            LineLimit::Line(n) => n,
            LineLimit::Budget { remaining, .. } => remaining,
        }
    }

    fn exceeded(&self) -> Error {
        match *self {
            LineLimit::Line(limit) => Error::LineTooLong { limit },
            LineLimit::Budget { total, .. } => Error::HeaderBudgetExceeded { limit: total },
        }
    }
}

/// Outcome of a line scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scan {
    /// A complete line; the terminator is stripped from `line`
    Line { line: Bytes, consumed: usize },
    /// No terminator yet, nothing was consumed
    NeedMoreData,
}

/// Position of the first LF within `max_len` bytes
fn find_lf(buf: &[u8], max_len: usize) -> Option<usize> {
    let window = &buf[..buf.len().min(max_len)];
    window.iter().position(|&b| b == b'\n')
}

/// Strip a trailing CR
fn trim_cr(line: &[u8]) -> usize {
    if line.last() == Some(&b'\r') {
        line.len() - 1
    } else {
        line.len()
    }
}

/// Scan the front of `acc` for one line
///
/// `limit` bounds the line length including its terminator. On success the
/// line and its terminator are removed from the accumulator; on
/// [`Scan::NeedMoreData`] and on error nothing is consumed.
pub fn scan_line(acc: &mut Accumulator, limit: LineLimit) -> Result<Scan> {
    let max_len = limit.max_len();
    match find_lf(acc.as_slice(), max_len) {
        Some(lf) => {
            let consumed = lf + 1;
            let mut raw = acc.split_to(consumed);
            let len = trim_cr(&raw[..lf]);
            raw.truncate(len);
            Ok(Scan::Line {
                line: raw,
                consumed,
            })
        }
        None if acc.len() >= max_len => Err(limit.exceeded()),
        None => Ok(Scan::NeedMoreData),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acc(data: &[u8]) -> Accumulator {
        let mut acc = Accumulator::new();
        acc.append(data);
        acc
    }

    #[test]
    fn test_scan_crlf_line() {
        let mut buf = acc(b"Host: a\r\nNext");
        let scan = scan_line(&mut buf, LineLimit::Line(100)).unwrap();
        assert_eq!(
            scan,
            Scan::Line {
                line: Bytes::from_static(b"Host: a"),
                consumed: 9
            }
        );
        assert_eq!(buf.as_slice(), b"Next");
    }

    #[test]
    fn test_scan_bare_lf() {
        let mut buf = acc(b"abc\ndef");
        match scan_line(&mut buf, LineLimit::Line(100)).unwrap() {
            Scan::Line { line, consumed } => {
                assert_eq!(&line[..], b"abc");
                assert_eq!(consumed, 4);
            }
            Scan::NeedMoreData => panic!("expected a line"),
        }
    }

    #[test]
    fn test_scan_empty_line() {
        let mut buf = acc(b"\r\nbody");
        match scan_line(&mut buf, LineLimit::Line(100)).unwrap() {
            Scan::Line { line, consumed } => {
                assert!(line.is_empty());
                assert_eq!(consumed, 2);
            }
            Scan::NeedMoreData => panic!("expected a line"),
        }
    }

    #[test]
    fn test_need_more_data_consumes_nothing() {
        let mut buf = acc(b"partial\r");
        assert_eq!(
            scan_line(&mut buf, LineLimit::Line(100)).unwrap(),
            Scan::NeedMoreData
        );
        assert_eq!(buf.as_slice(), b"partial\r");
    }

    #[test]
    fn test_line_too_long() {
        let mut buf = acc(b"0123456789");
        assert_eq!(
            scan_line(&mut buf, LineLimit::Line(10)),
            Err(Error::LineTooLong { limit: 10 })
        );
        assert_eq!(buf.len(), 10);
    }

    #[test]
    fn test_terminator_beyond_limit() {
        let mut buf = acc(b"0123456789\r\n");
        assert!(scan_line(&mut buf, LineLimit::Line(5)).is_err());

        // Terminator exactly at the limit still fits
        let mut buf = acc(b"0123\n");
        assert!(matches!(
            scan_line(&mut buf, LineLimit::Line(5)),
            Ok(Scan::Line { consumed: 5, .. })
        ));
    }

    #[test]
    fn test_budget_limit() {
        let limit = LineLimit::tighter(100, 4, 50);
        assert_eq!(limit, LineLimit::Budget { remaining: 4, total: 50 });

        let mut buf = acc(b"abcdef");
        assert_eq!(
            scan_line(&mut buf, limit),
            Err(Error::HeaderBudgetExceeded { limit: 50 })
        );

        assert_eq!(LineLimit::tighter(100, 400, 500), LineLimit::Line(100));
    }
}
