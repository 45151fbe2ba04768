// ── Core error types ──
//
// User-facing errors from patchbay-core. Consumers see a three-way failure
// taxonomy (transport, rejected, malformed) plus a few client-side cases.
// The `From<patchbay_api::Error>` impl folds transport-layer errors into it.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Backend failures ─────────────────────────────────────────────
    /// The backend could not be reached (connection, DNS, TLS).
    #[error("Cannot reach backend: {reason}")]
    Transport { reason: String },

    /// The request was sent but no answer arrived within the timeout.
    #[error("Request timed out: {reason}")]
    Timeout { reason: String },

    /// The backend answered with a non-success status.
    #[error("Backend rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The backend answered, but the body did not have the expected shape.
    #[error("Malformed backend response: {message}")]
    Malformed { message: String },

    // ── Client-side failures ─────────────────────────────────────────
    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Workflow is already closed")]
    WorkflowClosed,

    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Coarse classification of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// Network-level failure; retrying may help.
    Transport,
    /// The backend refused the request.
    Rejected,
    /// The backend response could not be interpreted.
    Malformed,
    /// Raised locally without talking to the backend.
    Client,
}

impl CoreError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => FailureKind::Transport,
            Self::Rejected { .. } => FailureKind::Rejected,
            Self::Malformed { .. } => FailureKind::Malformed,
            Self::NotFound { .. }
            | Self::Validation { .. }
            | Self::WorkflowClosed
            | Self::Config { .. } => FailureKind::Client,
        }
    }

    /// `true` for 404 rejections and local lookups that found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Rejected { status: 404, .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<patchbay_api::Error> for CoreError {
    fn from(err: patchbay_api::Error) -> Self {
        use patchbay_api::Error as Api;

        match err {
            Api::Transport(e) => {
                if let Some(status) = e.status() {
                    CoreError::Rejected {
                        status: status.as_u16(),
                        message: e.to_string(),
                    }
                } else if e.is_timeout() {
                    CoreError::Timeout {
                        reason: e.to_string(),
                    }
                } else if e.is_decode() {
                    CoreError::Malformed {
                        message: e.to_string(),
                    }
                } else {
                    CoreError::Transport {
                        reason: e.to_string(),
                    }
                }
            }
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Tls(msg) => CoreError::Transport {
                reason: format!("TLS error: {msg}"),
            },
            Api::Rejected { status, message } => CoreError::Rejected { status, message },
            Api::Deserialization { message, body: _ } => CoreError::Malformed { message },
            Api::SocketConnect(reason) => CoreError::Transport {
                reason: format!("event socket: {reason}"),
            },
            Api::SocketClosed { code, reason } => CoreError::Transport {
                reason: format!("event socket closed (code {code}): {reason}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_rejection_keeps_status_and_message() {
        let err = CoreError::from(patchbay_api::Error::Rejected {
            status: 400,
            message: "Unknown output type".into(),
        });
        assert!(matches!(
            &err,
            CoreError::Rejected { status: 400, message } if message == "Unknown output type"
        ));
        assert_eq!(err.kind(), FailureKind::Rejected);
        assert!(!err.is_not_found());
    }

    #[test]
    fn bad_body_is_malformed() {
        let err = CoreError::from(patchbay_api::Error::Deserialization {
            message: "invalid type: map, expected a sequence".into(),
            body: "{}".into(),
        });
        assert_eq!(err.kind(), FailureKind::Malformed);
    }

    #[test]
    fn socket_and_tls_failures_are_transport() {
        let tls = CoreError::from(patchbay_api::Error::Tls("bad cert".into()));
        let sock = CoreError::from(patchbay_api::Error::SocketConnect("refused".into()));
        assert_eq!(tls.kind(), FailureKind::Transport);
        assert_eq!(sock.kind(), FailureKind::Transport);
    }

    #[test]
    fn client_side_errors_are_client_kind() {
        assert_eq!(CoreError::WorkflowClosed.kind(), FailureKind::Client);
        assert_eq!(FailureKind::Malformed.to_string(), "malformed");
        let missing = CoreError::NotFound {
            entity: "output".into(),
            identifier: "o-1".into(),
        };
        assert!(missing.is_not_found());
    }
}
