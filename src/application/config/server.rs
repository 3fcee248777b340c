use std::net::{IpAddr, SocketAddr};

use super::{optional, parse, ConfigError, Lookup};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl ServerConfig {
    pub(crate) fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            host: parse("VM_MANAGE_API_HOST", optional(lookup, "VM_MANAGE_API_HOST", "0.0.0.0"))?,
            port: parse("VM_MANAGE_API_PORT", optional(lookup, "VM_MANAGE_API_PORT", "8000"))?,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
