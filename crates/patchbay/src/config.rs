//! Flag-aware profile resolution.
//!
//! `patchbay-config` owns the TOML file; this module layers `--server`,
//! `--insecure` and `--timeout` on top and produces a `SessionConfig`.

use std::time::Duration;

use patchbay_config::{Config, Profile, profile_to_session_config};
use patchbay_core::{SessionConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the session config for a command.
///
/// Precedence is flag > env > profile > `[defaults]`. With no matching
/// profile, `--server` alone is enough.
pub fn resolve_session_config(
    global: &GlobalOpts,
    config: &Config,
) -> Result<SessionConfig, CliError> {
    let name = active_profile_name(global, config);

    let profile = match (config.profiles.get(&name), &global.server) {
        (Some(profile), _) => profile.clone(),
        (None, Some(_)) => Profile::default(),
        (None, None) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(config),
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: patchbay_config::config_path().display().to_string(),
            });
        }
    };

    let mut profile = profile;
    if let Some(server) = &global.server {
        profile.server.clone_from(server);
    }

    let mut session = profile_to_session_config(&profile, &config.defaults)?;
    if global.insecure {
        session.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        session.timeout = Duration::from_secs(secs);
    }
    Ok(session)
}

/// Comma-separated profile names, or "(none)".
pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config
            .profiles
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }
}
