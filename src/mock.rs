//! Scripted stream and transport for unit tests
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::rc::Rc;
use std::sync::Arc;

use futures::{Async, Future, Poll};
use futures::executor::{Notify, Spawn};
use futures::future::{ok, err};
use tokio_io::{AsyncRead, AsyncWrite};

use client::Transport;


#[derive(Debug, Default)]
struct Inner {
    input: VecDeque<Vec<u8>>,
    replies: VecDeque<Vec<u8>>,
    output: Vec<u8>,
    eof: bool,
    error: Option<io::ErrorKind>,
    reads: usize,
}

/// The stream returns queued fragments one per read, `WouldBlock` when
/// there is nothing queued and `Ok(0)` after `close()`
///
/// Replies added with `add_reply` become readable one per write, i.e.
/// after the client has sent a request.
#[derive(Debug, Clone)]
pub struct MockStream {
    inner: Rc<RefCell<Inner>>,
}

impl MockStream {
    pub fn new() -> MockStream {
        MockStream { inner: Rc::new(RefCell::new(Inner::default())) }
    }
    pub fn add_input<T: AsRef<[u8]>>(&self, data: T) {
        self.inner.borrow_mut().input.push_back(data.as_ref().to_vec());
    }
    pub fn add_reply<T: AsRef<[u8]>>(&self, data: T) {
        self.inner.borrow_mut().replies.push_back(data.as_ref().to_vec());
    }
    pub fn close(&self) {
        self.inner.borrow_mut().eof = true;
    }
    pub fn fail(&self, kind: io::ErrorKind) {
        self.inner.borrow_mut().error = Some(kind);
    }
    pub fn output(&self) -> Vec<u8> {
        self.inner.borrow().output.clone()
    }
    pub fn reads(&self) -> usize {
        self.inner.borrow().reads
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.inner.borrow_mut();
        if let Some(kind) = inner.error.take() {
            return Err(io::Error::new(kind, "mock failure"));
        }
        match inner.input.pop_front() {
            Some(chunk) => {
                inner.reads += 1;
                let n = buf.len().min(chunk.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    inner.input.push_front(chunk[n..].to_vec());
                }
                Ok(n)
            }
            None if inner.eof => Ok(0),
            None => Err(io::ErrorKind::WouldBlock.into()),
        }
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.borrow_mut();
        inner.output.extend_from_slice(buf);
        if let Some(reply) = inner.replies.pop_front() {
            inner.input.push_back(reply);
        }
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsyncRead for MockStream {}

impl AsyncWrite for MockStream {
    fn shutdown(&mut self) -> Poll<(), io::Error> {
        Ok(Async::Ready(()))
    }
}

#[derive(Debug, Default)]
struct TransportState {
    streams: VecDeque<MockStream>,
    addresses: Option<Vec<SocketAddr>>,
    refused: Vec<SocketAddr>,
    connected: Vec<SocketAddr>,
    resolves: usize,
    connects: usize,
    fail_resolve: bool,
}

/// Hands out queued `MockStream`s one per connect
///
/// Resolves any name into `127.0.0.1:port` unless an address list is set.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Rc<RefCell<TransportState>>,
}

impl MockTransport {
    pub fn new() -> MockTransport {
        MockTransport::default()
    }
    pub fn push_stream(&self) -> MockStream {
        let stream = MockStream::new();
        self.state.borrow_mut().streams.push_back(stream.clone());
        stream
    }
    /// Addresses returned by every resolve, may be empty
    pub fn set_addresses(&self, addrs: Vec<SocketAddr>) {
        self.state.borrow_mut().addresses = Some(addrs);
    }
    /// Connecting to the address fails without taking a stream
    pub fn refuse(&self, addr: SocketAddr) {
        self.state.borrow_mut().refused.push(addr);
    }
    /// Addresses that have been connected successfully
    pub fn connected(&self) -> Vec<SocketAddr> {
        self.state.borrow().connected.clone()
    }
    pub fn fail_resolve(&self) {
        self.state.borrow_mut().fail_resolve = true;
    }
    pub fn resolves(&self) -> usize {
        self.state.borrow().resolves
    }
    pub fn connects(&self) -> usize {
        self.state.borrow().connects
    }
}

impl Transport for MockTransport {
    type Stream = MockStream;
    fn resolve(&self, _host: &str, port: u16)
        -> Box<Future<Item=Vec<SocketAddr>, Error=io::Error>>
    {
        let mut state = self.state.borrow_mut();
        state.resolves += 1;
        if state.fail_resolve {
            return Box::new(err(io::Error::new(io::ErrorKind::NotFound,
                "mock name not found")));
        }
        let addrs = match state.addresses {
            Some(ref addrs) => addrs.clone(),
            None => vec![SocketAddr::from(([127, 0, 0, 1], port))],
        };
        Box::new(ok(addrs))
    }
    fn connect(&self, addr: &SocketAddr)
        -> Box<Future<Item=MockStream, Error=io::Error>>
    {
        let mut state = self.state.borrow_mut();
        state.connects += 1;
        if state.refused.contains(addr) {
            return Box::new(err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("mock refused {}", addr))));
        }
        match state.streams.pop_front() {
            Some(stream) => {
                state.connected.push(*addr);
                Box::new(ok(stream))
            }
            None => Box::new(err(io::ErrorKind::ConnectionRefused.into())),
        }
    }
}

struct Noop;

impl Notify for Noop {
    fn notify(&self, _id: usize) {}
}

/// Polls a spawned future once with a notifier that does nothing
///
/// Tests add input and poll again by hand.
pub fn poll<F: Future>(task: &mut Spawn<F>) -> Poll<F::Item, F::Error> {
    task.poll_future_notify(&Arc::new(Noop), 0)
}
