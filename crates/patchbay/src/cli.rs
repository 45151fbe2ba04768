//! Clap derive structures for the `patchbay` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// patchbay -- manage audio outputs and mixers on a routing backend
#[derive(Debug, Parser)]
#[command(
    name = "patchbay",
    version,
    about = "Manage audio outputs and mixers from the command line",
    long_about = "Talks to a patchbay audio-routing backend over HTTP.\n\n\
        Outputs are sound cards, multiplexed channel sets and Icecast\n\
        streams. Mixers combine inputs onto a set of output channels.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "PATCHBAY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, short = 'S', env = "PATCHBAY_SERVER", global = true)]
    pub server: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PATCHBAY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "PATCHBAY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "PATCHBAY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Format ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one id per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage audio outputs
    #[command(alias = "out", alias = "o")]
    Outputs(OutputsArgs),

    /// Manage mixers and their channels
    #[command(alias = "mix", alias = "m")]
    Mixers(MixersArgs),

    /// Stream live backend events
    #[command(alias = "ev")]
    Events(EventsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Outputs ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct OutputsArgs {
    #[command(subcommand)]
    pub command: OutputsCommand,
}

#[derive(Debug, Subcommand)]
pub enum OutputsCommand {
    /// List configured outputs, in backend order
    #[command(alias = "ls")]
    List,

    /// List device names the backend can open
    Devices,

    /// Show one output with all of its parameters
    Get {
        /// Output ID
        id: String,
    },

    /// Create an output (interactive when no variant is given)
    Create {
        #[command(subcommand)]
        variant: Option<CreateOutput>,
    },

    /// Delete an output
    #[command(alias = "rm")]
    Delete {
        /// Output ID
        id: String,
    },

    /// Follow the output list as backend events arrive
    Watch,
}

#[derive(Debug, Subcommand)]
pub enum CreateOutput {
    /// Open a sound device
    Device {
        /// Device name as listed by `outputs devices` (picked interactively when omitted)
        name: Option<String>,
    },

    /// Split channels off an existing device output
    Multiplex {
        /// ID of the parent device output
        #[arg(long)]
        parent: String,

        /// Channel selection, e.g. "0,1"
        #[arg(long)]
        channels: String,
    },

    /// Stream to an Icecast mount
    Icecast {
        /// Mount URL, e.g. http://radio.local:8000/live
        #[arg(long)]
        endpoint: String,

        /// Source password (prompted when omitted)
        #[arg(long, env = "PATCHBAY_ICECAST_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

// ── Mixers ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MixersArgs {
    #[command(subcommand)]
    pub command: MixersCommand,
}

#[derive(Debug, Subcommand)]
pub enum MixersCommand {
    /// List mixers
    #[command(alias = "ls")]
    List,

    /// Show a mixer and its channels
    Get {
        /// Mixer ID
        id: String,
    },

    /// Create a mixer
    Create {
        /// Display name
        name: String,

        /// Number of output channels (backend default: 2)
        #[arg(long)]
        channels: Option<u32>,
    },

    /// Rename a mixer
    Rename {
        /// Mixer ID
        id: String,

        /// New display name
        name: String,
    },

    /// Delete a mixer
    #[command(alias = "rm")]
    Delete {
        /// Mixer ID
        id: String,
    },

    /// Manage a mixer's input channels
    #[command(alias = "ch")]
    Channel(ChannelArgs),
}

#[derive(Debug, Args)]
pub struct ChannelArgs {
    #[command(subcommand)]
    pub command: ChannelCommand,
}

#[derive(Debug, Subcommand)]
pub enum ChannelCommand {
    /// Add an input channel
    Add {
        /// Mixer ID
        mixer: String,
    },

    /// Route an input or change volume
    Set {
        /// Mixer ID
        mixer: String,

        /// Channel ID
        channel: String,

        /// Input source to route into the channel
        #[arg(long)]
        input: Option<String>,

        /// Volume gain (1.0 is unity)
        #[arg(long)]
        volume: Option<f64>,
    },

    /// Remove an input channel
    #[command(alias = "rm")]
    Remove {
        /// Mixer ID
        mixer: String,

        /// Channel ID
        channel: String,
    },
}

// ── Events ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EventsArgs {
    /// Event names to show (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub names: Option<Vec<String>>,

    /// Stop after this many events
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display the resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Key: server, ca_cert, insecure, timeout or events
        key: String,

        /// New value
        value: String,
    },

    /// List profile names
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
