//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Fetch a video resource over HTTP and save it under a readable name.
///
/// The resource must declare its exact size (Content-Length); progress is
/// reported as a percentage of that size.
#[derive(Parser, Debug)]
#[command(name = "clipfetch")]
#[command(author, version, about)]
pub struct Args {
    /// URL of the resource to fetch
    pub url: String,

    /// Directory to save the artifact to [default: .]
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Display name for the saved file (skips the described title)
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// MIME type attached to the artifact [default: video/mp4]
    #[arg(long)]
    pub mime_type: Option<String>,

    /// Endpoint of a JSON describer returning {"title", "summary"}
    #[arg(long)]
    pub describe_endpoint: Option<String>,

    /// Cancel the transfer after this many seconds (0 disables, max 86400)
    #[arg(long, value_parser = clap::value_parser!(u64).range(0..=86_400))]
    pub deadline: Option<u64>,

    /// Connect timeout in seconds (1-3600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// Read timeout in seconds (1-3600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: Option<u64>,

    /// Config file to load instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Do not draw a progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
