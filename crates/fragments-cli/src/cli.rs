use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "fragments",
    about = "Fragments: a multi-user content store with format conversion",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Convert a local file the way the server would
    Convert(ConvertArgs),
    /// List the formats a media type can be served as
    Formats(FormatsArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Address to bind, overriding the configuration
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Store fragments on disk under this directory instead of in memory
    #[arg(long)]
    pub storage_root: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConvertArgs {
    pub input: PathBuf,
    /// Target extension (html, txt, png, jpg, ...)
    #[arg(long)]
    pub to: String,
    /// Media type of the input; guessed from its extension when omitted
    #[arg(long = "type")]
    pub content_type: Option<String>,
    /// Write here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct FormatsArgs {
    pub content_type: String,
}
