use std::io::{self, Write};
use std::mem;
use std::net::SocketAddr;
use std::rc::Rc;
use std::sync::Arc;
use std::vec;

use futures::{Async, Future, Poll};
use netbuf::Buf;
use tokio_core::reactor::Handle;

use chunked;
use enums::Version;
use frame::FrameReader;
use headers::parse_headers;
use client::encoder;
use client::handle::Control;
use client::{Config, ConnectionRef, Error, Job, Response, Transport};
use client::{RequestWriter, ResponseHandler};


type Resolving = Box<Future<Item=Vec<SocketAddr>, Error=io::Error>>;
type Connecting<S> = Box<Future<Item=S, Error=io::Error>>;

enum State<S> {
    Idle,
    Resolving(Resolving),
    Connecting(Connecting<S>, vec::IntoIter<SocketAddr>),
    WritingRequest,
    ReadingStatusLine,
    ReadingHeaders,
    ReadingBody(Body),
    Done,
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Body {
    ContentLength { left: u64 },
    ChunkSize,
    ChunkData { left: u64 },
    ChunkEnd,
    Trailer,
    UntilClose,
}

/// A single HTTP/1.1 connection driven by the reactor
///
/// Runs one job at a time: resolves the host, connects, writes the
/// request, reads the response and calls the response handler. After that
/// it asks its feeder for the next job and runs it on the same socket if
/// the previous response allows it. The future resolves when there are no
/// more jobs, which also expires all `ConnectionRef`s.
///
/// Requests are never pipelined.
pub struct Connection<T: Transport> {
    transport: T,
    host: String,
    port: u16,
    config: Arc<Config>,
    control: Rc<Control>,
    feeder: Option<Box<FnMut() -> Option<Job>>>,
    state: State<T::Stream>,
    io: Option<FrameReader<T::Stream>>,
    out_buf: Buf,
    writer: Option<RequestWriter>,
    handler: Option<ResponseHandler>,
    response: Response,
    close_delimited: bool,
}

/// Best-effort parsing of `HTTP/1.x NNN reason`
///
/// Anything unrecognizable leaves respective values unset.
fn parse_status_line(line: &[u8]) -> (Option<Version>, Option<u16>) {
    if line.len() < 8 || !line.starts_with(b"HTTP/1.") {
        return (None, None);
    }
    let version = Version::from_minor(line[7]);
    if version.is_none() || line.len() < 12 || line[8] != b' ' {
        return (version, None);
    }
    let digits = &line[9..12];
    let terminated = line.get(12).map(|x| !x.is_ascii_digit()).unwrap_or(true);
    if !terminated || !digits.iter().all(|x| x.is_ascii_digit()) {
        return (version, None);
    }
    let code = digits.iter().fold(0u16, |acc, x| acc*10 + (x - b'0') as u16);
    return (version, Some(code));
}

fn write_zero() -> io::Error {
    io::Error::new(io::ErrorKind::WriteZero, "connection accepts no data")
}

impl<T: Transport> Connection<T> {
    /// Create a connection to the specified host
    ///
    /// Nothing happens until the connection is started with a job.
    pub fn new(transport: T, host: &str, port: u16, config: &Arc<Config>)
        -> Connection<T>
    {
        Connection {
            transport: transport,
            host: host.to_string(),
            port: port,
            config: config.clone(),
            control: Control::new(),
            feeder: None,
            state: State::Idle,
            io: None,
            out_buf: Buf::new(),
            writer: None,
            handler: None,
            response: Response::default(),
            close_delimited: false,
        }
    }
    /// Sets the source of jobs to run after the current one
    ///
    /// The closure is called after each response handler, and the
    /// connection closes when it returns `None`.
    pub fn feed_from<F>(&mut self, feeder: F)
        where F: FnMut() -> Option<Job> + 'static
    {
        self.feeder = Some(Box::new(feeder));
    }
    /// Returns a non-owning reference to this connection
    pub fn reference(&self) -> ConnectionRef {
        Control::reference(&self.control)
    }
    /// Starts a job and spawns the connection on the reactor
    ///
    /// The reactor owns the connection from now on. Returned reference
    /// may be used to cancel the request.
    pub fn start(mut self, job: Job, handle: &Handle) -> ConnectionRef {
        self.begin(job);
        let cref = self.reference();
        handle.spawn(self);
        return cref;
    }

    fn begin(&mut self, job: Job) {
        let Job { writer, handler } = job;
        self.control.activate();
        self.writer = Some(writer);
        self.handler = Some(handler);
        self.response = Response::default();
        self.close_delimited = false;
        let reuse = match self.io {
            // peer might have closed the socket while it was idle
            Some(ref mut io) => {
                if !io.check_closed() {
                    io.discard();
                    true
                } else {
                    false
                }
            }
            None => false,
        };
        if reuse {
            debug!("connection {}: reusing socket to {}:{}",
                self.control.id(), self.host, self.port);
            self.encode_request();
            self.state = State::WritingRequest;
        } else {
            debug!("connection {}: resolving {}:{}",
                self.control.id(), self.host, self.port);
            self.io = None;
            self.state = State::Resolving(
                self.transport.resolve(&self.host, self.port));
        }
    }

    fn encode_request(&mut self) {
        let cref = self.reference();
        let len = self.out_buf.len();
        self.out_buf.consume(len);
        if let Some(writer) = self.writer.take() {
            let mut e = encoder::new(&mut self.out_buf);
            writer(&cref, &mut e, &self.host, self.port);
            if !e.is_complete() {
                debug!("connection {}: request writer finished without \
                    completing the request", cref.id());
            }
        }
        trace!("connection {}: request of {} bytes",
            cref.id(), self.out_buf.len());
    }

    fn flush(&mut self) -> Poll<(), io::Error> {
        let io = self.io.as_mut().expect("socket is connected");
        while self.out_buf.len() > 0 {
            match self.out_buf.write_to(io.get_mut()) {
                Ok(0) => return Err(write_zero()),
                Ok(_) => continue,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(Async::NotReady);
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        match io.get_mut().flush() {
            Ok(()) => Ok(Async::Ready(())),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                Ok(Async::NotReady)
            }
            Err(e) => Err(e),
        }
    }

    fn poll_body(&mut self, body: &mut Body) -> Poll<(), io::Error> {
        let io = self.io.as_mut().expect("socket is connected");
        let out = &mut self.response.body;
        loop {
            match *body {
                Body::ContentLength { ref mut left } => {
                    return io.poll_exact_into(left, out);
                }
                Body::UntilClose => {
                    return io.poll_until_close(out);
                }
                Body::ChunkSize => {
                    match io.poll_until(b"\r\n", chunked::parse_size)? {
                        Async::NotReady => return Ok(Async::NotReady),
                        Async::Ready(0) => {
                            trace!("last chunk");
                            *body = Body::Trailer;
                        }
                        Async::Ready(size) => {
                            trace!("chunk of {} bytes", size);
                            *body = Body::ChunkData { left: size };
                        }
                    }
                }
                Body::ChunkData { ref mut left } => {
                    if io.poll_exact_into(left, out)?.is_not_ready() {
                        return Ok(Async::NotReady);
                    }
                    *body = Body::ChunkEnd;
                }
                Body::ChunkEnd => {
                    // CRLF after chunk data, contents are not checked
                    if io.poll_exact(2, |_| ())?.is_not_ready() {
                        return Ok(Async::NotReady);
                    }
                    *body = Body::ChunkSize;
                }
                Body::Trailer => {
                    match io.poll_until(b"\r\n", |line| line.is_empty())? {
                        Async::NotReady => return Ok(Async::NotReady),
                        Async::Ready(true) => return Ok(Async::Ready(())),
                        Async::Ready(false) => trace!("trailer line"),
                    }
                }
            }
        }
    }

    /// Drives the current job until it's done or would block
    fn advance(&mut self) -> Poll<(), Error> {
        loop {
            self.state = match mem::replace(&mut self.state, State::Void) {
                State::Idle => {
                    self.state = State::Idle;
                    return Ok(Async::Ready(()));
                }
                State::Resolving(mut fut) => {
                    match fut.poll().map_err(Error::Resolve)? {
                        Async::NotReady => {
                            self.state = State::Resolving(fut);
                            return Ok(Async::NotReady);
                        }
                        Async::Ready(addrs) => {
                            debug!("connection {}: {} resolved into {:?}",
                                self.control.id(), self.host, addrs);
                            let mut addrs = addrs.into_iter();
                            match addrs.next() {
                                Some(addr) => State::Connecting(
                                    self.transport.connect(&addr), addrs),
                                None => {
                                    return Err(Error::Resolve(io::Error::new(
                                        io::ErrorKind::NotFound,
                                        "no addresses found")));
                                }
                            }
                        }
                    }
                }
                State::Connecting(mut fut, mut addrs) => {
                    match fut.poll() {
                        Ok(Async::NotReady) => {
                            self.state = State::Connecting(fut, addrs);
                            return Ok(Async::NotReady);
                        }
                        Ok(Async::Ready(sock)) => {
                            debug!("connection {}: connected",
                                self.control.id());
                            self.io = Some(FrameReader::new(sock));
                            self.encode_request();
                            State::WritingRequest
                        }
                        Err(e) => match addrs.next() {
                            Some(addr) => {
                                debug!("connection {}: {}, trying {}",
                                    self.control.id(), e, addr);
                                State::Connecting(
                                    self.transport.connect(&addr), addrs)
                            }
                            None => return Err(Error::Connect(e)),
                        },
                    }
                }
                State::WritingRequest => {
                    match self.flush().map_err(Error::Write)? {
                        Async::NotReady => {
                            self.state = State::WritingRequest;
                            return Ok(Async::NotReady);
                        }
                        Async::Ready(()) => State::ReadingStatusLine,
                    }
                }
                State::ReadingStatusLine => {
                    let line = self.io.as_mut().expect("socket is connected")
                        .poll_until(b"\r\n", parse_status_line)
                        .map_err(Error::Read)?;
                    match line {
                        Async::NotReady => {
                            self.state = State::ReadingStatusLine;
                            return Ok(Async::NotReady);
                        }
                        Async::Ready((version, status)) => {
                            trace!("connection {}: status {:?} {:?}",
                                self.control.id(), version, status);
                            self.response.version = version;
                            self.response.status = status;
                            State::ReadingHeaders
                        }
                    }
                }
                State::ReadingHeaders => {
                    let header = self.io.as_mut().expect("socket is connected")
                        .poll_header_block(parse_headers)
                        .map_err(Error::Read)?;
                    match header {
                        Async::NotReady => {
                            self.state = State::ReadingHeaders;
                            return Ok(Async::NotReady);
                        }
                        Async::Ready(header) => {
                            trace!("connection {}: {:?}",
                                self.control.id(), header);
                            // chunked takes precedence over content-length
                            let body = if header.chunked {
                                Body::ChunkSize
                            } else if let Some(n) = header.content_length {
                                Body::ContentLength { left: n }
                            } else {
                                Body::UntilClose
                            };
                            self.close_delimited = body == Body::UntilClose;
                            self.response.header = header;
                            State::ReadingBody(body)
                        }
                    }
                }
                State::ReadingBody(mut body) => {
                    match self.poll_body(&mut body).map_err(Error::Read)? {
                        Async::NotReady => {
                            self.state = State::ReadingBody(body);
                            return Ok(Async::NotReady);
                        }
                        Async::Ready(()) => State::Done,
                    }
                }
                State::Done => {
                    self.state = State::Done;
                    return Ok(Async::Ready(()));
                }
                State::Void => unreachable!(),
            }
        }
    }

    fn can_reuse(&self) -> bool {
        let header = &self.response.header;
        self.config.keep_alive && !self.close_delimited && !header.close &&
            (self.response.version == Some(Version::Http11) || header.keep_alive)
    }

    /// Invokes the response handler and resets the state for a next job
    fn finish(&mut self, error: Option<Error>) {
        let reusable = error.is_none() && self.can_reuse();
        self.control.deactivate();
        if !reusable {
            // drops any pending resolve or connect operation too
            self.io = None;
        }
        self.state = State::Idle;
        self.writer = None;
        let response = mem::replace(&mut self.response, Response::default());
        match error {
            Some(ref e) => debug!("connection {}: request failed: {}",
                self.control.id(), e),
            None => debug!("connection {}: response {:?}, {} bytes",
                self.control.id(), response.status, response.body.len()),
        }
        if let Some(handler) = self.handler.take() {
            handler(&self.reference(), error, response);
        }
    }

    fn next_job(&mut self) -> Option<Job> {
        match self.feeder {
            Some(ref mut feeder) => feeder(),
            None => None,
        }
    }
}

impl<T: Transport> Future for Connection<T> {
    type Item = ();
    type Error = ();
    fn poll(&mut self) -> Poll<(), ()> {
        loop {
            let result = if self.control.is_cancelled() {
                Err(Error::Cancelled)
            } else {
                self.advance()
            };
            match result {
                Ok(Async::NotReady) => {
                    self.control.park();
                    return Ok(Async::NotReady);
                }
                Ok(Async::Ready(())) => self.finish(None),
                Err(e) => self.finish(Some(e)),
            }
            match self.next_job() {
                Some(job) => self.begin(job),
                None => {
                    debug!("connection {}: no more jobs, closing",
                        self.control.id());
                    return Ok(Async::Ready(()));
                }
            }
        }
    }
}
