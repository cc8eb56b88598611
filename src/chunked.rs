//! Chunk size lines of the chunked transfer coding
//!
//! ```text
//! chunk          = chunk-size [ chunk-extension ] CRLF
//!                  chunk-data CRLF
//! last-chunk     = 1*("0") [ chunk-extension ] CRLF
//! ```


/// Parses the leading hexadecimal digits of a chunk-size line
///
/// Extensions and anything after the digits are ignored. A line without
/// digits reads as zero, i.e. the last chunk. Sizes that don't fit into
/// `u64` saturate, so the following read fails on end of stream instead
/// of wrapping around.
pub fn parse_size(line: &[u8]) -> u64 {
    let mut size = 0u64;
    let digits = line.iter().skip_while(|&&ch| ch == b' ' || ch == b'\t');
    for &ch in digits {
        let digit = match (ch as char).to_digit(16) {
            Some(d) => d as u64,
            None => break,
        };
        size = size.checked_mul(16)
            .and_then(|x| x.checked_add(digit))
            .unwrap_or(u64::max_value());
    }
    return size;
}

/// Encodes data as a chunked body, `chunk` bytes per chunk
///
/// Used by tests to produce well-formed responses.
pub fn encode(data: &[u8], chunk: usize, trailers: &[&str]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 32);
    for piece in data.chunks(chunk.max(1)) {
        out.extend_from_slice(format!("{:x}\r\n", piece.len()).as_bytes());
        out.extend_from_slice(piece);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n");
    for line in trailers {
        out.extend_from_slice(line.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"\r\n");
    return out;
}
