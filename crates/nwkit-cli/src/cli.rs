//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

/// nwkit - typed HTTP requests from the command line
#[derive(Debug, Parser)]
#[command(name = "nwkit", author, version, about, long_about = None, propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "NWKIT_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a request and print the response
    Get(GetCommand),

    /// Save a response body to a file
    Download(DownloadCommand),

    /// Send files as a multipart form
    Upload(UploadCommand),

    /// Write the response body to stdout as it arrives
    Stream(StreamCommand),

    /// Send a HEAD request and print the response headers
    Headers(HeadersCommand),
}

/// Options shared by every request.
#[derive(Debug, Clone, Args)]
pub struct RequestArgs {
    /// Absolute URL to request
    #[arg(value_hint = ValueHint::Url)]
    pub url: String,

    /// Request header as `Name: value`; repeatable
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Per-request timeout in seconds
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Args)]
pub struct GetCommand {
    #[command(flatten)]
    pub request: RequestArgs,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// JSON object sent as the request body
    #[arg(short, long, value_name = "JSON")]
    pub data: Option<String>,

    /// Print response headers before the body
    #[arg(short, long)]
    pub include: bool,

    /// Print the canonical form of this response header instead of the body
    #[arg(long, value_name = "NAME")]
    pub canonical: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct DownloadCommand {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Destination file; defaults to the temporary directory
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Replace an existing destination
    #[arg(short, long)]
    pub force: bool,

    /// Create missing parent directories
    #[arg(long)]
    pub mkdir: bool,
}

#[derive(Debug, Clone, Args)]
pub struct UploadCommand {
    #[command(flatten)]
    pub request: RequestArgs,

    /// File to send as `[field=]path`; the field defaults to `file`
    #[arg(long = "file", value_name = "FIELD=PATH", required = true, value_parser = parse_file)]
    pub files: Vec<(String, PathBuf)>,

    /// Text field as `name=value`; repeatable
    #[arg(long = "field", value_name = "NAME=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "POST")]
    pub method: String,
}

#[derive(Debug, Clone, Args)]
pub struct StreamCommand {
    #[command(flatten)]
    pub request: RequestArgs,
}

#[derive(Debug, Clone, Args)]
pub struct HeadersCommand {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Only print the canonical form of this header
    #[arg(long, value_name = "NAME")]
    pub canonical: Option<String>,
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected `Name: value`, got `{s}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing header name in `{s}`"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected `name=value`, got `{s}`"))
}

fn parse_file(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((field, path)) if !field.is_empty() => Ok((field.to_string(), PathBuf::from(path))),
        Some(_) => Err(format!("missing field name in `{s}`")),
        None => Ok(("file".to_string(), PathBuf::from(s))),
    }
}
