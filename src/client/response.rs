use enums::Version;
use headers::ResponseHeader;


/// A response accumulated by a connection
///
/// Passed to the response handler both on success and on error. In the
/// latter case it contains whatever was received before the failure.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub(crate) version: Option<Version>,
    pub(crate) status: Option<u16>,
    pub(crate) header: ResponseHeader,
    pub(crate) body: Vec<u8>,
}

impl Response {
    /// Status code, if the status line was recognizable
    pub fn status(&self) -> Option<u16> {
        self.status
    }
    /// Protocol version from the status line, if recognizable
    pub fn version(&self) -> Option<Version> {
        self.version
    }
    /// Framing and persistence info of the response headers
    pub fn header(&self) -> &ResponseHeader {
        &self.header
    }
    /// Response body (decoded from the chunked encoding if needed)
    pub fn body(&self) -> &[u8] {
        &self.body
    }
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}
