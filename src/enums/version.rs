use std::fmt;

/// Protocol version from a response status line
///
/// Only HTTP/1.x is spoken, anything else is not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    Http10,
    Http11,
}

impl Version {
    /// Parses the minor version digit of a `HTTP/1.x` prefix
    pub fn from_minor(v: u8) -> Option<Version> {
        match v {
            b'0' => Some(Version::Http10),
            b'1' => Some(Version::Http11),
            _ => None,
        }
    }
    /// Token as written on the request line
    pub fn as_str(&self) -> &'static str {
        match *self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
