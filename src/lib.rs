//! Asynchronous HTTP/1.1 client with a bounded connection pool
//!
//! Connections are futures run by the `tokio-core` reactor. Everything is
//! single-threaded: request writers, response handlers and the pool
//! itself live on the reactor thread.
extern crate futures;
extern crate futures_cpupool;
extern crate httparse;
extern crate netbuf;
extern crate tokio_core;
extern crate tokio_io;
extern crate url;
#[macro_use(quick_error)] extern crate quick_error;
#[macro_use] extern crate log;


pub mod client;
pub mod chunked;
pub mod headers;
mod enums;
mod frame;
#[cfg(test)] mod mock;

pub use enums::Version;
pub use headers::ResponseHeader;
