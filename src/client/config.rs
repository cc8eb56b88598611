use std::sync::Arc;

use client::{Config};

impl Config {
    /// Create a config with defaults
    pub fn new() -> Config {
        Config {
            connection_limit: 4,
            keep_alive: true,
        }
    }
    /// Maximum number of connections a `Pool` keeps open simultaneously
    ///
    /// Values below one are treated as one.
    pub fn connection_limit(&mut self, value: usize) -> &mut Self {
        self.connection_limit = value.max(1);
        self
    }
    /// Whether a connection may keep its socket for the next job
    ///
    /// Even when enabled the socket is only reused if the previous
    /// response allows it (no `Connection: close`, not framed by the end
    /// of stream and finished without error). When disabled every job
    /// resolves and connects anew.
    pub fn keep_alive(&mut self, value: bool) -> &mut Self {
        self.keep_alive = value;
        self
    }
    /// Create a Arc'd config clone to pass to the constructor
    ///
    /// This is just a convenience method.
    pub fn done(&mut self) -> Arc<Config> {
        Arc::new(self.clone())
    }
}
