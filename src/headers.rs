//! Header block scanning
//!
//! The protocol state machine only needs three facts from the response
//! headers: the body length (if any), whether the body is chunked and
//! what the peer said about connection persistence. Everything here is
//! best-effort: a malformed block leaves fields at their defaults.
use std::str::from_utf8;

use httparse;


/// Number of headers parsed without a heap allocation
const MIN_HEADERS: usize = 16;


/// Body framing and persistence facts extracted from a response header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Value of `Content-Length`, `None` when absent or unparseable
    pub content_length: Option<u64>,
    /// Last `Transfer-Encoding` coding is `chunked`
    pub chunked: bool,
    /// `Connection: keep-alive` has been seen
    pub keep_alive: bool,
    /// `Connection: close` has been seen
    pub close: bool,
}

pub fn is_transfer_encoding(val: &str) -> bool {
    val.eq_ignore_ascii_case("Transfer-Encoding")
}

pub fn is_content_length(val: &str) -> bool {
    val.eq_ignore_ascii_case("Content-Length")
}

pub fn is_connection(val: &str) -> bool {
    val.eq_ignore_ascii_case("Connection")
}

fn is_ws(ch: u8) -> bool {
    matches!(ch, b'\r' | b'\n' | b' ' | b'\t')
}

// header value is byte sequence
// we need case insensitive comparison and strip out of the whitespace
fn is_token(val: &[u8], token: &[u8]) -> bool {
    let start = match val.iter().position(|&ch| !is_ws(ch)) {
        Some(x) => x,
        None => return false,
    };
    let end = val.iter().rposition(|&ch| !is_ws(ch)).unwrap_or(start) + 1;
    val[start..end].eq_ignore_ascii_case(token)
}

pub fn is_chunked(val: &[u8]) -> bool {
    is_token(val, b"chunked")
}

pub fn is_close(val: &[u8]) -> bool {
    is_token(val, b"close")
}

pub fn is_keep_alive(val: &[u8]) -> bool {
    is_token(val, b"keep-alive")
}

/// Parses a raw header block (everything after the status line, up to and
/// including the terminating empty line)
///
/// Never fails. Unparseable input yields `ResponseHeader::default()`, so
/// the caller falls back to read-until-close framing. There is no limit on
/// the number of headers.
pub fn parse_headers(block: &[u8]) -> ResponseHeader {
    let mut headers = [httparse::EMPTY_HEADER; MIN_HEADERS];
    let mut result = httparse::parse_headers(block, &mut headers);
    let mut vec;
    if matches!(result, Err(httparse::Error::TooManyHeaders)) {
        // every header takes at least one line
        let lines = block.iter().filter(|&&x| x == b'\n').count();
        vec = vec![httparse::EMPTY_HEADER; lines];
        result = httparse::parse_headers(block, &mut vec);
    }
    match result {
        Ok(httparse::Status::Complete((_, parsed))) => scan(parsed),
        Ok(httparse::Status::Partial) | Err(_) => {
            trace!("header block is not parseable, using defaults");
            ResponseHeader::default()
        }
    }
}

fn scan(parsed: &[httparse::Header]) -> ResponseHeader {
    let mut result = ResponseHeader::default();
    for header in parsed.iter() {
        if is_transfer_encoding(header.name) {
            // only the last coding determines framing
            if let Some(enc) = header.value.split(|&x| x == b',').last() {
                result.chunked = is_chunked(enc);
            }
        } else if is_content_length(header.name) {
            let len = from_utf8(header.value).ok()
                .and_then(|s| s.trim().parse().ok());
            if len.is_some() {
                result.content_length = len;
            }
        } else if is_connection(header.name) {
            for item in header.value.split(|&x| x == b',') {
                if is_close(item) {
                    result.close = true;
                } else if is_keep_alive(item) {
                    result.keep_alive = true;
                }
            }
        }
    }
    return result;
}
