use std::io;


quick_error! {
    #[derive(Debug)]
    /// Client request error
    ///
    /// Every variant originates from the transport. Malformed responses
    /// are parsed on a best-effort basis and never produce an error
    /// on their own.
    pub enum Error {
        /// Name resolution failed or yielded no addresses
        Resolve(err: io::Error) {
            description("name resolution error")
            display("name resolution error: {}", err)
        }
        /// None of the resolved addresses accepted a connection
        Connect(err: io::Error) {
            description("connection error")
            display("connection error: {}", err)
        }
        /// Error writing request to the socket
        Write(err: io::Error) {
            description("error writing request")
            display("error writing request: {}", err)
        }
        /// Error reading response, including a premature end of stream
        Read(err: io::Error) {
            description("error reading response")
            display("error reading response: {}", err)
        }
        /// Request was cancelled by `ConnectionRef::cancel`
        Cancelled {
            description("request cancelled")
            display("request cancelled")
        }
    }
}

impl Error {
    /// Returns underlying I/O error if there is one
    pub fn io_error(&self) -> Option<&io::Error> {
        match *self {
            Error::Resolve(ref e) | Error::Connect(ref e) |
            Error::Write(ref e) | Error::Read(ref e) => Some(e),
            Error::Cancelled => None,
        }
    }
}

#[cfg(test)]
mod test {
    use std::io;
    use super::Error;

    #[test]
    fn display() {
        let e = Error::Read(io::ErrorKind::UnexpectedEof.into());
        assert!(e.to_string().starts_with("error reading response: "));
        assert_eq!(Error::Cancelled.to_string(), "request cancelled");
    }

    #[test]
    fn io_error() {
        let e = Error::Connect(io::ErrorKind::ConnectionRefused.into());
        assert_eq!(e.io_error().map(|e| e.kind()),
                   Some(io::ErrorKind::ConnectionRefused));
        assert!(Error::Cancelled.io_error().is_none());
    }
}
