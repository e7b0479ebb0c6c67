use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a full sync for every table group of a job file
    Run {
        #[arg(long, help = "Job file path")]
        job: PathBuf,

        #[arg(long, help = "State directory (defaults to ~/.syncer/state)")]
        state: Option<PathBuf>,

        #[arg(
            long,
            help = "Discard saved progress and sync every table group from the first page"
        )]
        restart: bool,
    },
    Progress {
        #[arg(long, help = "Meta ID to inspect")]
        meta: String,

        #[arg(long, help = "State directory (defaults to ~/.syncer/state)")]
        state: Option<PathBuf>,

        #[arg(
            long,
            help = "If set, prints the progress information as JSON instead of a table"
        )]
        json: bool,
    },
    /// Check that a connector is reachable and list its tables
    Probe {
        /// Connector definition file
        #[arg(long)]
        connector: PathBuf,
    },
}
