use crate::utils::error::{FixtureError, Result};
use std::net::{IpAddr, Ipv4Addr, TcpListener};

/// Highest port the allocator will hand out (top of the registered range).
pub const MAX_PORT: u16 = 49151;

/// Finds a TCP port that can be bound at the moment of the call.
///
/// Nothing is reserved: the probe listener is released before returning, so
/// another process may grab the port in between. Acceptable for a test fixture.
#[derive(Debug, Clone)]
pub struct PortAllocator {
    host: IpAddr,
    max_port: u16,
}

impl Default for PortAllocator {
    fn default() -> Self {
        Self::new(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }
}

impl PortAllocator {
    pub fn new(host: IpAddr) -> Self {
        Self {
            host,
            max_port: MAX_PORT,
        }
    }

    pub fn with_max_port(mut self, max_port: u16) -> Self {
        self.max_port = max_port;
        self
    }

    pub fn allocate(&self, floor: u16) -> Result<u16> {
        if floor == 0 || floor > self.max_port {
            return Err(FixtureError::NoPortAvailable { floor });
        }

        for port in floor..=self.max_port {
            if self.is_free(port) {
                tracing::debug!("Port {} is available on {}", port, self.host);
                return Ok(port);
            }
        }

        Err(FixtureError::NoPortAvailable { floor })
    }

    fn is_free(&self, port: u16) -> bool {
        TcpListener::bind((self.host, port)).is_ok()
    }
}
