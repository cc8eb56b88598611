use std::fmt::Display;
use std::io::{self, Write};

use netbuf::Buf;

use enums::Version;
use headers::{is_content_length, is_transfer_encoding};


quick_error! {
    #[derive(Debug)]
    pub enum HeaderError {
        DuplicateContentLength {
            description("Content-Length is added twice")
        }
        InvalidHeaderName {
            description("Header name contains invalid characters")
        }
        InvalidHeaderValue {
            description("Header value contains invalid characters")
        }
        BodyLengthHeader {
            description("Content-Length must be set using `add_length`, \
                Transfer-Encoding is not supported for requests")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageState {
    RequestLine,
    Headers { content_length: Option<u64> },
    Body { left: u64 },
}

/// Output sink passed to a request writer
///
/// Everything is put into the connection's output buffer and sent after
/// the writer returns. Methods check that the request is well-formed,
/// while the `io::Write` implementation puts raw bytes into the buffer
/// bypassing any checks (useful for prerecorded requests).
pub struct Encoder<'a> {
    buf: &'a mut Buf,
    state: MessageState,
}

fn invalid_header(value: &[u8]) -> bool {
    return value.iter().any(|&x| x == b'\r' || x == b'\n')
}

fn invalid_name(name: &str) -> bool {
    name.is_empty() || name.bytes().any(|x| {
        x <= b' ' || x >= 0x7F || x == b':'
    })
}

impl<'a> Encoder<'a> {
    /// Write request line.
    ///
    /// # Panics
    ///
    /// When request line is already written. It's expected that your request
    /// writer will never call the method twice.
    pub fn request_line(&mut self, method: &str, path: &str, version: Version)
    {
        assert_eq!(self.state, MessageState::RequestLine,
            "Request line in wrong state");
        // Buf's `io::Write` never fails
        write!(self.buf, "{} {} {}\r\n", method, path, version).ok();
        self.state = MessageState::Headers { content_length: None };
    }
    /// Add a header to the message.
    ///
    /// `Content-Length` header must be send using the `add_length` method.
    ///
    /// # Panics
    ///
    /// Panics when `add_header` is called before `request_line` or after
    /// `done_headers`.
    pub fn add_header<V: AsRef<[u8]>>(&mut self, name: &str, value: V)
        -> Result<(), HeaderError>
    {
        self.check_header(name)?;
        let value = value.as_ref();
        if invalid_header(value) {
            return Err(HeaderError::InvalidHeaderValue);
        }
        self.buf.extend(name.as_bytes());
        self.buf.extend(b": ");
        self.buf.extend(value);
        self.buf.extend(b"\r\n");
        Ok(())
    }
    /// Same as `add_header` but allows value to be formatted directly into
    /// the buffer
    ///
    /// The formatted value is not validated, so it must not contain
    /// newlines.
    pub fn format_header<D: Display>(&mut self, name: &str, value: D)
        -> Result<(), HeaderError>
    {
        self.check_header(name)?;
        write!(self.buf, "{}: {}\r\n", name, value).ok();
        Ok(())
    }
    /// Add a content length to the message.
    ///
    /// After `done_headers` exactly this number of bytes must be written
    /// with `write_body`.
    pub fn add_length(&mut self, n: u64) -> Result<(), HeaderError> {
        match self.state {
            MessageState::Headers { content_length: Some(_) } => {
                Err(HeaderError::DuplicateContentLength)
            }
            MessageState::Headers { content_length: None } => {
                write!(self.buf, "Content-Length: {}\r\n", n).ok();
                self.state = MessageState::Headers { content_length: Some(n) };
                Ok(())
            }
            ref state => {
                panic!("Called add_length() method on request \
                    in state {:?}", state)
            }
        }
    }
    /// Closes the HTTP header
    ///
    /// # Panics
    ///
    /// Panics when the request line is not written yet or headers are
    /// already closed.
    pub fn done_headers(&mut self) {
        match self.state {
            MessageState::Headers { content_length } => {
                self.buf.extend(b"\r\n");
                self.state = MessageState::Body {
                    left: content_length.unwrap_or(0),
                };
            }
            ref state => {
                panic!("Called done_headers() method on request \
                    in state {:?}", state)
            }
        }
    }
    /// Write a chunk of the request body
    ///
    /// # Panics
    ///
    /// Panics when headers are not closed yet or when data exceeds the
    /// length declared with `add_length`.
    pub fn write_body(&mut self, data: &[u8]) {
        match self.state {
            MessageState::Body { left } if left >= data.len() as u64 => {
                self.buf.extend(data);
                self.state = MessageState::Body {
                    left: left - data.len() as u64,
                };
            }
            ref state => {
                panic!("Can't write {} bytes of body in state {:?}",
                    data.len(), state)
            }
        }
    }
    /// Returns true if headers are closed and the whole body is written
    pub fn is_complete(&self) -> bool {
        self.state == MessageState::Body { left: 0 }
    }
    fn check_header(&self, name: &str) -> Result<(), HeaderError> {
        match self.state {
            MessageState::Headers { .. } => {}
            ref state => {
                panic!("Called add_header() method on request \
                    in state {:?}", state)
            }
        }
        if invalid_name(name) {
            return Err(HeaderError::InvalidHeaderName);
        }
        if is_content_length(name) || is_transfer_encoding(name) {
            return Err(HeaderError::BodyLengthHeader);
        }
        Ok(())
    }
}

impl<'a> Write for Encoder<'a> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend(data);
        Ok(data.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn new(buf: &mut Buf) -> Encoder {
    Encoder {
        buf: buf,
        state: MessageState::RequestLine,
    }
}
