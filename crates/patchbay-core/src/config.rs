// ── Runtime session configuration ──
//
// Describes *how* to talk to one backend. Never touches disk: the CLI
// builds a `SessionConfig` (usually via patchbay-config) and hands it in.

use std::time::Duration;

use patchbay_api::socket::ReconnectConfig;
use patchbay_api::transport::{TlsMode, TransportConfig};
use url::Url;

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for a session against a single backend.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backend root URL (e.g. `http://studio.local:5000`).
    pub base_url: Url,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Spawn the Socket.IO listener on connect.
    pub events_enabled: bool,
    /// Backoff policy for the event socket.
    pub reconnect: ReconnectConfig,
}

impl SessionConfig {
    /// Config with defaults for everything but the URL.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            events_enabled: false,
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Parse `url` and build a default config around it.
    pub fn from_url(url: &str) -> Result<Self, CoreError> {
        let base_url = Url::parse(url).map_err(|e| CoreError::Config {
            message: format!("invalid server URL '{url}': {e}"),
        })?;
        Ok(Self::new(base_url))
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }
}
