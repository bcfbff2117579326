//! Clap derive structures for the `soractl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use soractl_api::SpeedClass;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// soractl -- fleet console for cellular IoT devices
#[derive(Debug, Parser)]
#[command(
    name = "soractl",
    version,
    about = "Manage a cellular IoT device fleet from the command line",
    long_about = "A fleet console for cellular IoT devices managed through the\n\
        Soracom API: inventory with caching, speed-class control, on-demand\n\
        SSH access, and orchestrated software updates.",
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
    /// Account profile to use
    #[arg(long, short = 'p', env = "SORACOM_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API endpoint (overrides profile)
    #[arg(long, env = "SORACOM_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// API key (skips the email/password login together with --token)
    #[arg(long, env = "SORACOM_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// API token (skips the email/password login together with --api-key)
    #[arg(long, env = "SORACOM_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SORACOM_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Bypass the inventory cache for this invocation
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Request timeout in seconds
    #[arg(long, env = "SORACOM_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse the device inventory
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage device tags
    Tags(TagsArgs),

    /// Change a device's speed class
    Speed(SpeedArgs),

    /// Open an on-demand SSH tunnel to a device
    Tunnel(TunnelArgs),

    /// Run the software update sequence on a device
    Update(UpdateArgs),

    /// Manage the inventory cache
    Cache(CacheArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices
    #[command(alias = "ls")]
    List {
        /// Only show devices currently online
        #[arg(long, conflicts_with = "offline")]
        online: bool,

        /// Only show devices currently offline
        #[arg(long)]
        offline: bool,

        /// Force a fresh fetch even if the cache is valid
        #[arg(long, short = 'r')]
        refresh: bool,
    },

    /// Search devices by name or software version
    Search {
        /// Name or version fragment; exact name matches win
        query: String,

        /// Force a fresh fetch even if the cache is valid
        #[arg(long, short = 'r')]
        refresh: bool,
    },

    /// Show one device in detail
    Show {
        /// Device name or IMSI
        device: String,

        /// Force a fresh fetch even if the cache is valid
        #[arg(long, short = 'r')]
        refresh: bool,
    },

    /// Show online/offline counts
    Summary {
        /// Force a fresh fetch even if the cache is valid
        #[arg(long, short = 'r')]
        refresh: bool,
    },
}

// ── Tags ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TagsArgs {
    #[command(subcommand)]
    pub command: TagsCommand,
}

#[derive(Debug, Subcommand)]
pub enum TagsCommand {
    /// List a device's tags
    #[command(alias = "ls")]
    List {
        /// Device name or IMSI
        device: String,
    },

    /// Set a tag on a device
    Set {
        /// Device name or IMSI
        device: String,
        /// Tag name (e.g. "S/W Version")
        name: String,
        /// Tag value
        value: String,
    },

    /// Delete a tag from a device
    #[command(alias = "rm")]
    Delete {
        /// Device name or IMSI
        device: String,
        /// Tag name
        name: String,
    },
}

// ── Speed ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SpeedArgs {
    #[command(subcommand)]
    pub command: SpeedCommand,
}

#[derive(Debug, Subcommand)]
pub enum SpeedCommand {
    /// Set a device's speed class
    Set {
        /// Device name or IMSI
        device: String,

        /// Target class
        #[arg(value_parser = parse_speed_class)]
        class: SpeedClass,
    },
}

fn parse_speed_class(s: &str) -> Result<SpeedClass, String> {
    s.parse()
}

// ── Tunnel ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TunnelArgs {
    #[command(subcommand)]
    pub command: TunnelCommand,
}

#[derive(Debug, Subcommand)]
pub enum TunnelCommand {
    /// Create a port mapping to the device's SSH port and print the endpoint
    Open {
        /// Device name or IMSI
        device: String,

        /// Mapping lifetime in seconds
        #[arg(long, default_value = "3600")]
        duration: u64,

        /// Allow connections from any source instead of this host's IP
        #[arg(long)]
        open_range: bool,

        /// Leave the mapping open and exit instead of waiting to close it
        #[arg(long)]
        keep: bool,
    },
}

// ── Update ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UpdateArgs {
    #[command(subcommand)]
    pub command: UpdateCommand,
}

#[derive(Debug, Subcommand)]
pub enum UpdateCommand {
    /// Run the update sequence against one device
    Run {
        /// Device name or IMSI
        device: String,

        /// SSH username on the device
        #[arg(long, default_value = "pi")]
        ssh_user: String,

        /// Manual IMSI override for records with no resolvable identity
        #[arg(long)]
        imsi: Option<String>,

        /// Allow connections from any source instead of this host's IP
        #[arg(long)]
        open_range: bool,
    },
}

// ── Cache ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Remove the cached inventory snapshot
    Clear,

    /// Print the cache file location
    Path,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactively create or update a profile
    Init,

    /// Show the effective configuration (secrets masked)
    Show,

    /// Print the config file location
    Path,

    /// Store the account password in the system keyring
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
