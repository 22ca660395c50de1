/// Command-line arguments.
use archivis_core::model::DriveStatus;
use archivis_core::scanner::DEFAULT_MAX_DEPTH;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Catalog your external drives: stable codenames, a registry, and
/// shallow directory snapshots.
#[derive(Debug, Parser)]
#[command(name = "archivis", version)]
pub struct Cli {
    /// Catalog home (holds config/, registry/, snapshots/ and notes/).
    #[arg(long, env = "ARCHIVIS_HOME", default_value = "StorageMap", global = true)]
    pub home: PathBuf,

    /// More log output on stderr (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Detect, identify and snapshot every attached external drive (default).
    Scan(ScanArgs),

    /// Show every registered drive.
    List,

    /// Set a drive's lifecycle status.
    Status {
        /// Drive codename (case-insensitive).
        id: String,
        /// active, retired or missing.
        status: DriveStatus,
    },

    /// Create the catalog layout and a starter naming-rules file.
    Init,
}

#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    /// Deepest directory level that gets its own snapshot record (root = 0).
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Accept every proposed codename without prompting.
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl Default for ScanArgs {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            yes: false,
        }
    }
}

impl Cli {
    /// The subcommand to run; a bare `archivis` means `archivis scan`.
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Scan(ScanArgs::default()))
    }
}
