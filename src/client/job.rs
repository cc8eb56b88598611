use client::{ConnectionRef, Encoder, Error, Response};


/// Writes a request into the sink
///
/// Arguments are the connection, the sink, host and port of the
/// connection's target. The writer must write a complete request.
pub type RequestWriter = Box<FnOnce(&ConnectionRef, &mut Encoder, &str, u16)>;

/// Receives the outcome of a request
///
/// Called exactly once per job, with `Some(error)` if the request failed
/// and the response received so far.
pub type ResponseHandler = Box<FnOnce(&ConnectionRef, Option<Error>, Response)>;

/// A single request/response exchange waiting for a connection
///
/// Jobs are move-only: once submitted they're owned by the pool and then
/// by the connection that runs them.
pub struct Job {
    pub(crate) writer: RequestWriter,
    pub(crate) handler: ResponseHandler,
}

impl Job {
    pub fn new<W, H>(writer: W, handler: H) -> Job
        where W: FnOnce(&ConnectionRef, &mut Encoder, &str, u16) + 'static,
              H: FnOnce(&ConnectionRef, Option<Error>, Response) + 'static,
    {
        Job {
            writer: Box::new(writer),
            handler: Box::new(handler),
        }
    }
    /// Create a job from already boxed callbacks
    pub fn from_boxed(writer: RequestWriter, handler: ResponseHandler) -> Job {
        Job {
            writer: writer,
            handler: handler,
        }
    }
}
