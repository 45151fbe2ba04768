//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use patchbay_config::ConfigError;
use patchbay_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const REJECTED: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const MALFORMED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── Backend ──────────────────────────────────────────────────────

    #[error("Could not reach the backend: {reason}")]
    #[diagnostic(
        code(patchbay::connection_failed),
        help(
            "Check that the backend is running and the URL is right.\n\
             Try: patchbay config show"
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Request timed out: {reason}")]
    #[diagnostic(
        code(patchbay::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { reason: String },

    #[error("Backend rejected the request (HTTP {status}): {message}")]
    #[diagnostic(code(patchbay::rejected))]
    Rejected { status: u16, message: String },

    #[error("Backend sent an unexpected response: {message}")]
    #[diagnostic(
        code(patchbay::malformed),
        help("The backend version may not match this client.")
    )]
    Malformed { message: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(patchbay::not_found),
        help("Run: patchbay {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(patchbay::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(patchbay::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: patchbay config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(patchbay::no_config),
        help(
            "Create a profile with: patchbay config init\n\
             or pass --server <URL>.\n\
             Expected configuration at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(patchbay::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("'{action}' needs an interactive terminal")]
    #[diagnostic(
        code(patchbay::interactive_required),
        help("Pass the values as arguments, or --yes (-y) to skip confirmation.")
    )]
    NonInteractive { action: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(patchbay::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Malformed { .. } => exit_code::MALFORMED,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NonInteractive { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Transport { reason } => Self::ConnectionFailed { reason },

            CoreError::Timeout { reason } => Self::Timeout { reason },

            CoreError::Rejected {
                status: 404,
                message,
            } => Self::NotFound {
                resource_type: "resource".into(),
                identifier: message,
                list_command: "outputs list".into(),
            },

            CoreError::Rejected { status, message } => Self::Rejected { status, message },

            CoreError::Malformed { message } => Self::Malformed { message },

            CoreError::NotFound { entity, identifier } => Self::NotFound {
                list_command: list_command_for(&entity).into(),
                resource_type: entity,
                identifier,
            },

            CoreError::Validation { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::WorkflowClosed => Self::Validation {
                field: "workflow".into(),
                reason: "already closed".into(),
            },

            CoreError::Config { message } => Self::Validation {
                field: "server".into(),
                reason: message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::ProfileNotFound { name } => Self::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(Box::new(other)),
        }
    }
}

fn list_command_for(entity: &str) -> &'static str {
    if entity.starts_with("mixer") {
        "mixers list"
    } else {
        "outputs list"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (
                CoreError::Transport {
                    reason: "refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (
                CoreError::Rejected {
                    status: 400,
                    message: "bad".into(),
                },
                exit_code::REJECTED,
            ),
            (
                CoreError::Rejected {
                    status: 404,
                    message: "gone".into(),
                },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::Malformed {
                    message: "x".into(),
                },
                exit_code::MALFORMED,
            ),
            (
                CoreError::Timeout {
                    reason: "5s".into(),
                },
                exit_code::TIMEOUT,
            ),
            (CoreError::WorkflowClosed, exit_code::USAGE),
        ];

        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }

    #[test]
    fn mixer_not_found_points_at_mixer_list() {
        let err = CliError::from(CoreError::NotFound {
            entity: "mixer channel".into(),
            identifier: "m1/c2".into(),
        });
        assert!(
            matches!(err, CliError::NotFound { ref list_command, .. } if list_command == "mixers list")
        );
    }
}
