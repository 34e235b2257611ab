//! Command line and environment configuration.

use clap::{Args, Parser, Subcommand};
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

use crate::room_url::AllowList;

pub const DEFAULT_TRACKER_DOMAIN: &str = "archipelago.gg";
pub const DEFAULT_API_BASE: &str = "https://archipelago.gg/api/";
pub const DEFAULT_USER_AGENT: &str = "ArchiTracker/1.0";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_DEADLINE_SECS: u64 = 20;

// ============================================================================
// CLI
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "architracker", version, about = "Archipelago room tracker service")]
pub struct Cli {
    #[command(flatten)]
    pub tracker: TrackerArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the REST API
    Serve(ServeArgs),
    /// Fetch one room snapshot and print it
    Fetch(FetchArgs),
}

#[derive(Debug, Args)]
pub struct TrackerArgs {
    /// Canonical tracker domain
    #[arg(long, global = true, env = "ARCHITRACKER_TRACKER_DOMAIN", default_value = DEFAULT_TRACKER_DOMAIN)]
    pub tracker_domain: String,

    /// Base URL of the tracker's JSON API
    #[arg(long, global = true, env = "ARCHITRACKER_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: Url,

    /// Timeout for each outbound request, in seconds
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub request_timeout_secs: u64,

    /// Deadline for a whole snapshot fetch, in seconds
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_DEADLINE_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub deadline_secs: u64,

    /// User-Agent sent to the tracker
    #[arg(long, global = true, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "ARCHITRACKER_BIND", default_value = "127.0.0.1:5080")]
    pub bind: String,

    /// SQLite database holding registered rooms
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://architracker.db?mode=rwc")]
    pub database_url: String,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Room URL, e.g. https://archipelago.gg/room/XXXX
    pub url: String,

    /// Write players.csv and hints.csv into this directory
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Print the snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// RESOLVED CONFIGURATION
// ============================================================================

/// Read-only settings used by the tracker pipeline
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub domain: String,
    pub api_base: Url,
    pub request_timeout: Duration,
    pub deadline: Duration,
    pub user_agent: String,
}

impl TrackerConfig {
    pub fn submission_allow_list(&self) -> AllowList {
        AllowList::submission(&self.domain)
    }

    pub fn stored_allow_list(&self) -> AllowList {
        AllowList::stored(&self.domain)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            domain: DEFAULT_TRACKER_DOMAIN.to_string(),
            api_base: Url::parse(DEFAULT_API_BASE).expect("default API base is a valid URL"),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            deadline: Duration::from_secs(DEFAULT_DEADLINE_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&TrackerArgs> for TrackerConfig {
    fn from(args: &TrackerArgs) -> Self {
        TrackerConfig {
            domain: args.tracker_domain.trim().to_ascii_lowercase(),
            api_base: with_trailing_slash(args.api_base.clone()),
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            deadline: Duration::from_secs(args.deadline_secs),
            user_agent: args.user_agent.clone(),
        }
    }
}

/// `Url::join` drops the last segment unless the base ends in '/'.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
