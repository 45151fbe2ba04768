//! Command dispatch: bridges CLI args -> session calls -> output formatting.

pub mod config_cmd;
pub mod events;
pub mod mixers;
pub mod outputs;
pub mod util;

use patchbay_core::Session;

use crate::cli::{Command, GlobalOpts, OutputsCommand};
use crate::error::CliError;

/// Commands that follow the backend's event channel.
pub fn needs_events(cmd: &Command) -> bool {
    match cmd {
        Command::Events(_) => true,
        Command::Outputs(args) => matches!(args.command, OutputsCommand::Watch),
        _ => false,
    }
}

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Outputs(args) => outputs::handle(session, args, global).await,
        Command::Mixers(args) => mixers::handle(session, args, global).await,
        Command::Events(args) => events::handle(session, args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "handled before connecting".into(),
        }),
    }
}
