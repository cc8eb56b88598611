//! Pooled HTTP/1.1 client
//!
//! A `Connection` runs jobs one after another on a single socket, and a
//! `Pool` spreads jobs over a bounded number of connections to one host.
//! Each job is a request writer and a response handler, both called on
//! the reactor thread.
//!
//! ```rust,ignore
//! let pool = Pool::new(TcpTransport::new(&handle), "example.com", 80,
//!                      &Config::new().done(), &handle);
//! pool.submit(client::get("/", true), |_, err, response| {
//!     println!("{:?} {:?}", err, response.status());
//! });
//! ```
mod config;
mod encoder;
mod errors;
mod handle;
mod job;
mod pool;
mod proto;
mod response;
mod simple;
mod transport;

pub use self::errors::Error;
pub use self::encoder::{Encoder, HeaderError};
pub use self::handle::ConnectionRef;
pub use self::job::{Job, RequestWriter, ResponseHandler};
pub use self::pool::Pool;
pub use self::proto::Connection;
pub use self::response::Response;
pub use self::simple::{get, request, fetch_once};
pub use self::transport::{Transport, TcpTransport};


/// Configuration shared by connections and pools
#[derive(Debug, Clone)]
pub struct Config {
    connection_limit: usize,
    keep_alive: bool,
}
