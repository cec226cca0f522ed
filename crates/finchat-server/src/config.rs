//! HTTP server configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Default listen address
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";

/// Settings for the HTTP surface
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to
    pub bind: SocketAddr,

    /// Answer cross-origin requests from any origin
    pub cors_permissive: bool,

    /// Idle time after which a chat session is dropped
    pub session_ttl: Duration,

    /// How often expired sessions are swept
    pub cleanup_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            cors_permissive: true,
            session_ttl: Duration::from_secs(30 * 60),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}
