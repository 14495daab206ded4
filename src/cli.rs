//! Command-line interface and configuration resolution
//!
//! Parses CLI arguments with clap and resolves them into a `ServerConfig`.
//! The YouTube API key is resolved exactly once here (flag first, then the
//! `YOUTUBE_API_KEY` environment variable) and injected downstream, so
//! nothing else in the crate touches process environment.

use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

use crate::cache::SnapshotCache;

/// Environment variable consulted when `--api-key` is not given
pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// Error types for configuration resolution
#[derive(Debug, Error)]
pub enum CliError {
    /// No usable cache directory: no --cache-dir and no home directory
    #[error("could not determine a cache directory; pass --cache-dir")]
    NoCacheDir,
}

/// TinyTunes API server - serves aggregated YouTube channel video data
#[derive(Parser, Debug)]
#[command(name = "tinytunes-server")]
#[command(about = "API server for the TinyTunes kids' music channel page")]
#[command(version)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, default_value_t = 8787)]
    pub port: u16,

    /// Directory for snapshot cache files (defaults to the XDG cache dir)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// YouTube Data API key (falls back to $YOUTUBE_API_KEY)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,
}

/// Resolved configuration for server startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind
    pub addr: SocketAddr,
    /// Directory for snapshot cache files
    pub cache_dir: PathBuf,
    /// YouTube Data API key; empty when none was supplied, in which case
    /// every fetch attempt fails and only cached data can be served
    pub api_key: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8787),
            cache_dir: PathBuf::from("."),
            api_key: String::new(),
        }
    }
}

impl ServerConfig {
    /// Resolves a ServerConfig from parsed CLI arguments.
    ///
    /// # Errors
    /// * `CliError::NoCacheDir` if no cache directory was given and the
    ///   platform default cannot be determined
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let cache_dir = match &cli.cache_dir {
            Some(dir) => dir.clone(),
            None => SnapshotCache::new()
                .ok_or(CliError::NoCacheDir)?
                .cache_dir()
                .to_path_buf(),
        };

        let api_key = cli
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .unwrap_or_default();

        Ok(Self {
            addr: SocketAddr::new(cli.host, cli.port),
            cache_dir,
            api_key,
        })
    }
}
