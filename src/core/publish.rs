use crate::config::DEFAULT_PORT_KEY;

/// Exposes the live port to the rest of the process through an environment
/// variable.
#[derive(Debug, Clone)]
pub struct PortPublisher {
    key: String,
}

impl Default for PortPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_PORT_KEY)
    }
}

impl PortPublisher {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn publish(&self, port: u16) {
        std::env::set_var(&self.key, port.to_string());
    }

    pub fn clear(&self) {
        std::env::remove_var(&self.key);
    }

    pub fn current(&self) -> Option<u16> {
        published_port(&self.key)
    }
}

/// Reads a port published under `key`, if any.
pub fn published_port(key: &str) -> Option<u16> {
    std::env::var(key).ok().and_then(|value| value.parse().ok())
}
