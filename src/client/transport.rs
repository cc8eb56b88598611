use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

use futures::Future;
use futures::future::ok;
use futures_cpupool::CpuPool;
use tokio_core::net::TcpStream;
use tokio_core::reactor::Handle;
use tokio_io::{AsyncRead, AsyncWrite};


/// Name resolution and connection establishment for the client
///
/// Reading and writing are done through the non-blocking `Read` and
/// `Write` implementations of the `Stream`, where `WouldBlock` means the
/// current task is woken up when the operation may proceed. Dropping a
/// future or the stream cancels the operation in progress.
pub trait Transport: 'static {
    type Stream: AsyncRead + AsyncWrite + 'static;
    /// Resolve a host name into a list of addresses to try in order
    fn resolve(&self, host: &str, port: u16)
        -> Box<Future<Item=Vec<SocketAddr>, Error=io::Error>>;
    /// Establish a connection to a single address
    fn connect(&self, addr: &SocketAddr)
        -> Box<Future<Item=Self::Stream, Error=io::Error>>;
}

/// Plain TCP transport on top of the tokio reactor
///
/// Host names are resolved by the system resolver in a separate thread
/// so the event loop never blocks. IP literals are returned right away.
#[derive(Clone)]
pub struct TcpTransport {
    handle: Handle,
    resolver: CpuPool,
}

impl TcpTransport {
    /// Create a transport with a single resolver thread
    pub fn new(handle: &Handle) -> TcpTransport {
        TcpTransport::with_resolver(handle, CpuPool::new(1))
    }
    /// Create a transport that resolves names on the specified thread pool
    pub fn with_resolver(handle: &Handle, resolver: CpuPool) -> TcpTransport {
        TcpTransport {
            handle: handle.clone(),
            resolver: resolver,
        }
    }
}

impl Transport for TcpTransport {
    type Stream = TcpStream;
    fn resolve(&self, host: &str, port: u16)
        -> Box<Future<Item=Vec<SocketAddr>, Error=io::Error>>
    {
        let literal = host.trim_matches(|c| c == '[' || c == ']');
        if let Ok(ip) = literal.parse::<IpAddr>() {
            return Box::new(ok(vec![SocketAddr::new(ip, port)]));
        }
        let host = host.to_string();
        Box::new(self.resolver.spawn_fn(move || {
            (&host[..], port).to_socket_addrs().map(|x| x.collect())
        }))
    }
    fn connect(&self, addr: &SocketAddr)
        -> Box<Future<Item=TcpStream, Error=io::Error>>
    {
        Box::new(TcpStream::connect(addr, &self.handle))
    }
}
