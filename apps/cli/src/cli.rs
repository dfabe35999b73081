//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "docbatch",
    about = "Batch file uploader for a document repository server",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Probe the server connection.
    Status,

    /// List children of a repository path.
    Ls {
        /// Repository path (defaults to the configured path filter).
        path: Option<String>,
    },

    /// List writable destination folders under the configured path filter.
    Folders,

    /// Upload files into a repository folder.
    Upload(UploadArgs),

    /// Print the URL for acquiring an authentication token.
    TokenLink,

    /// Show or update stored configuration.
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Files to upload, in submission order.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Destination folder in the repository.
    #[arg(long)]
    pub dest: String,

    /// Maximum concurrent transfers (defaults to the configured value).
    #[arg(long)]
    pub concurrent: Option<usize>,

    /// Upload even when a document of the same name already exists.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args, Default)]
pub struct ConfigArgs {
    /// Repository server base URL.
    #[arg(long)]
    pub server: Option<String>,

    /// Authentication token.
    #[arg(long)]
    pub token: Option<String>,

    /// Repository path prefix for browsing and destinations.
    #[arg(long)]
    pub path_filter: Option<String>,

    /// Default maximum concurrent transfers.
    #[arg(long)]
    pub concurrent: Option<usize>,

    /// Skip files whose name already exists in the destination.
    #[arg(long)]
    pub skip_reupload: Option<bool>,
}
