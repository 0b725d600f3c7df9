use hyper::StatusCode;
use std::net::SocketAddr;

pub const DEFAULT_NAME: &str = "mock";

#[derive(Debug, Clone)]
pub struct MockServerConfiguration {
    name: String,
    bind_address: SocketAddr,
    not_configured_status: StatusCode,
}

impl MockServerConfiguration {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            bind_address: SocketAddr::from(([127, 0, 0, 1], 0)),
            not_configured_status: StatusCode::NOT_FOUND,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Port 0 asks the OS for an ephemeral port.
    pub fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    pub fn set_bind_address(&mut self, bind_address: SocketAddr) {
        self.bind_address = bind_address;
    }

    /// Status returned for requests no route matches.
    pub fn not_configured_status(&self) -> StatusCode {
        self.not_configured_status
    }

    pub fn set_not_configured_status(&mut self, status: StatusCode) {
        self.not_configured_status = status;
    }
}

impl Default for MockServerConfiguration {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}
