use std::io;

use futures::Future;
use futures::future::err;
use futures::sync::oneshot;
use tokio_core::reactor::Handle;
use url::Url;

use enums::Version;
use client::{Config, Connection, ConnectionRef, Encoder, Error, Job};
use client::{RequestWriter, ResponseHandler, Response};
use client::{Transport, TcpTransport};


fn boxed<F>(f: F) -> RequestWriter
    where F: FnOnce(&ConnectionRef, &mut Encoder, &str, u16) + 'static
{
    Box::new(f)
}

/// Request writer for a bodyless `GET`
///
/// Sends `Host` (with the port unless it's 80), `Accept: */*` and either
/// `Connection: keep-alive` or `Connection: close`.
pub fn get(path: &str, keep_alive: bool) -> RequestWriter {
    let path = path.to_string();
    boxed(move |_, e, host, port| {
        e.request_line("GET", &path, Version::Http11);
        let host_header = if port == 80 {
            e.add_header("Host", host)
        } else {
            e.format_header("Host", format!("{}:{}", host, port))
        };
        if let Err(err) = host_header {
            debug!("can't send host {:?}: {}", host, err);
        }
        e.add_header("Accept", "*/*")
            .expect("static header is valid");
        e.add_header("Connection",
            if keep_alive { "keep-alive" } else { "close" })
            .expect("static header is valid");
        e.done_headers();
    })
}

/// Runs a single request on a fresh connection
///
/// The connection is closed after the handler is called.
pub fn request<T: Transport>(handle: &Handle, transport: T,
    host: &str, port: u16,
    writer: RequestWriter, handler: ResponseHandler)
    -> ConnectionRef
{
    let config = Config::new().keep_alive(false).done();
    Connection::new(transport, host, port, &config)
        .start(Job::from_boxed(writer, handler), handle)
}

/// Fetches a `http://` url into memory
///
/// The returned future resolves to a response of any status, only
/// transport failures are errors. If the connection is destroyed before
/// the response arrives (i.e. the reactor is dropped) the future fails
/// with `Error::Cancelled`.
pub fn fetch_once(url: &Url, handle: &Handle)
    -> Box<Future<Item=Response, Error=Error>>
{
    if url.scheme() != "http" {
        return Box::new(err(Error::Resolve(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported url scheme {:?}", url.scheme())))));
    }
    let host = match url.host_str() {
        Some(host) => host.to_string(),
        None => {
            return Box::new(err(Error::Resolve(io::Error::new(
                io::ErrorKind::InvalidInput, "url has no host"))));
        }
    };
    let port = url.port_or_known_default().unwrap_or(80);
    let mut path = url.path().to_string();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }
    let (tx, rx) = oneshot::channel();
    request(handle, TcpTransport::new(handle), &host, port,
        get(&path, false),
        Box::new(move |_: &ConnectionRef, e: Option<Error>, r: Response| {
            // receiver may be gone already
            tx.send(match e {
                Some(e) => Err(e),
                None => Ok(r),
            }).ok();
        }));
    Box::new(rx.then(|result| match result {
        Ok(result) => result,
        Err(oneshot::Canceled) => Err(Error::Cancelled),
    }))
}
