//! h1stream - incremental HTTP/1.x message parser
//!
//! This crate turns a stream of byte chunks, split arbitrarily, into
//! start-line / header / body events for one connection. It is decode-only
//! and does no I/O.

pub mod http;
