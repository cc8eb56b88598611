//! Incremental reading of protocol frames over a non-blocking stream
//!
//! All `poll_*` methods follow the futures convention: `NotReady` means
//! the stream returned `WouldBlock` and the current task will be woken up
//! by the reactor, the call should be repeated with the same arguments.
//! Unconsumed bytes stay in the buffer between calls.
use std::io::{self, Read};

use futures::{Async, Poll};
use netbuf::Buf;


/// Owns the stream and the receive buffer of a connection
pub struct FrameReader<S> {
    sock: S,
    buf: Buf,
    eof: bool,
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn unexpected_eof(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof,
        format!("connection closed while reading {}", what))
}

impl<S> FrameReader<S> {
    pub fn new(sock: S) -> FrameReader<S> {
        FrameReader {
            sock: sock,
            buf: Buf::new(),
            eof: false,
        }
    }
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.sock
    }
    /// Number of bytes received but not consumed yet
    #[cfg(test)]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
    /// Peer has closed its side of the stream
    pub fn is_eof(&self) -> bool {
        self.eof
    }
    /// Drops any unconsumed bytes
    pub fn discard(&mut self) {
        let n = self.buf.len();
        self.buf.consume(n);
    }
}

impl<S: Read> FrameReader<S> {
    /// Issues a single read on the stream
    ///
    /// Returns `Ready(0)` at the end of stream.
    fn fill(&mut self) -> Poll<usize, io::Error> {
        if self.eof {
            return Ok(Async::Ready(0));
        }
        loop {
            match self.buf.read_from(&mut self.sock) {
                Ok(0) => {
                    trace!("end of stream, {} bytes buffered", self.buf.len());
                    self.eof = true;
                    return Ok(Async::Ready(0));
                }
                Ok(n) => {
                    trace!("read {} bytes", n);
                    return Ok(Async::Ready(n));
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(Async::NotReady);
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Reads whatever is available without waiting and reports whether
    /// the stream is unusable
    ///
    /// Used on an idle connection, where any received bytes are garbage
    /// and an error means the socket can't be reused either.
    pub fn check_closed(&mut self) -> bool {
        loop {
            match self.fill() {
                Ok(Async::Ready(0)) => return true,
                Ok(Async::Ready(_)) => continue,
                Ok(Async::NotReady) => return false,
                Err(e) => {
                    trace!("error on idle socket: {}", e);
                    return true;
                }
            }
        }
    }

    /// Reads until `locate` finds a frame in the buffer
    ///
    /// `locate` returns the length passed to `f` and the number of bytes
    /// to consume afterwards.
    fn poll_frame<L, F, R>(&mut self, what: &str, locate: L, f: F)
        -> Poll<R, io::Error>
        where L: Fn(&[u8]) -> Option<(usize, usize)>,
              F: FnOnce(&[u8]) -> R,
    {
        loop {
            if let Some((len, consumed)) = locate(&self.buf[..]) {
                let result = f(&self.buf[..len]);
                self.buf.consume(consumed);
                return Ok(Async::Ready(result));
            }
            if self.eof {
                return Err(unexpected_eof(what));
            }
            match self.fill()? {
                Async::Ready(_) => continue,
                Async::NotReady => return Ok(Async::NotReady),
            }
        }
    }

    /// Passes bytes before `delimiter` to `f` and consumes them together
    /// with the delimiter
    ///
    /// The delimiter may span any number of underlying reads.
    pub fn poll_until<F, R>(&mut self, delimiter: &[u8], f: F)
        -> Poll<R, io::Error>
        where F: FnOnce(&[u8]) -> R,
    {
        self.poll_frame("line",
            |buf| find(buf, delimiter).map(|x| (x, x + delimiter.len())),
            f)
    }

    /// Passes a complete header block to `f`
    ///
    /// The block includes the terminating empty line, so it's either
    /// a bare `\r\n` (no headers) or ends with `\r\n\r\n`.
    pub fn poll_header_block<F, R>(&mut self, f: F) -> Poll<R, io::Error>
        where F: FnOnce(&[u8]) -> R,
    {
        self.poll_frame("headers", |buf| {
            if buf.starts_with(b"\r\n") {
                Some((2, 2))
            } else {
                find(buf, b"\r\n\r\n").map(|x| (x + 4, x + 4))
            }
        }, f)
    }

    /// Passes exactly `n` bytes to `f` and consumes them
    ///
    /// Resolves without touching the stream if enough bytes are buffered.
    pub fn poll_exact<F, R>(&mut self, n: usize, f: F) -> Poll<R, io::Error>
        where F: FnOnce(&[u8]) -> R,
    {
        self.poll_frame("fixed size frame", |buf| {
            if buf.len() >= n { Some((n, n)) } else { None }
        }, f)
    }

    /// Moves up to `remaining` bytes into `out` as they arrive
    ///
    /// `remaining` is decremented by the number of bytes moved, so partial
    /// data is in `out` even if the stream fails later.
    pub fn poll_exact_into(&mut self, remaining: &mut u64, out: &mut Vec<u8>)
        -> Poll<(), io::Error>
    {
        loop {
            let take = if (self.buf.len() as u64) < *remaining {
                self.buf.len()
            } else {
                *remaining as usize
            };
            if take > 0 {
                out.extend_from_slice(&self.buf[..take]);
                self.buf.consume(take);
                *remaining -= take as u64;
            }
            if *remaining == 0 {
                return Ok(Async::Ready(()));
            }
            if self.eof {
                return Err(unexpected_eof("body"));
            }
            match self.fill()? {
                Async::Ready(_) => continue,
                Async::NotReady => return Ok(Async::NotReady),
            }
        }
    }

    /// Moves everything into `out` until the peer closes the stream
    pub fn poll_until_close(&mut self, out: &mut Vec<u8>)
        -> Poll<(), io::Error>
    {
        loop {
            let n = self.buf.len();
            if n > 0 {
                out.extend_from_slice(&self.buf[..]);
                self.buf.consume(n);
            }
            if self.eof {
                return Ok(Async::Ready(()));
            }
            match self.fill()? {
                Async::Ready(_) => continue,
                Async::NotReady => return Ok(Async::NotReady),
            }
        }
    }
}
