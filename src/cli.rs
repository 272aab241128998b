use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// esmon - search cluster overview
/// Polls cluster health, node stats and shard movement and serves the latest snapshot
#[derive(Parser)]
#[command(name = "esmon")]
#[command(author = "esmon Team")]
#[command(version = "0.1.0")]
#[command(about = "Search cluster overview - health, heap, GC and shard movement at a glance")]
#[command(long_about = "
esmon polls every configured cluster once per interval and shows:
- cluster health, document count and store size
- shard movement over the last minute
- per-node heap, disk usage and GC time since the previous poll

Usage examples:
  esmon serve                          # read hosts.cfg, listen on :8080
  esmon serve --config esmon.toml      # TOML configuration
  esmon serve --host es1:9200 --listen 127.0.0.1:9000
  esmon check es1:9200 es2:9200        # one poll, print JSON
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available commands for the esmon CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Poll clusters continuously and serve the overview
    Serve {
        /// Config file: `.toml`, or a host list with one host per line
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Cluster host, may be repeated; added to the configured hosts
        #[arg(long = "host", value_name = "HOST")]
        hosts: Vec<String>,

        /// Listener address
        #[arg(short, long)]
        listen: Option<SocketAddr>,

        /// Poll period in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Upstream request timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Poll each host once and print the snapshots as JSON
    Check {
        /// Cluster hosts
        #[arg(value_name = "HOST", required = true)]
        hosts: Vec<String>,

        /// Scheme for hosts given without one
        #[arg(long, default_value = "http")]
        scheme: String,

        /// Upstream request timeout in milliseconds
        #[arg(long, default_value = "5000")]
        timeout_ms: u64,

        /// Pretty-print the JSON
        #[arg(short, long)]
        pretty: bool,
    },
}

/// Host list read when `serve` gets neither `--config` nor `--host`
pub const DEFAULT_HOSTS_FILE: &str = "hosts.cfg";

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::parse_from([
            "esmon", "serve", "--host", "a:9200", "--host", "b:9200", "--listen", "127.0.0.1:9000", "-v",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Serve { hosts, listen, config, .. } => {
                assert_eq!(hosts, vec!["a:9200", "b:9200"]);
                assert_eq!(listen, Some("127.0.0.1:9000".parse().unwrap()));
                assert!(config.is_none());
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_check_requires_host() {
        assert!(Cli::try_parse_from(["esmon", "check"]).is_err());
        let cli = Cli::parse_from(["esmon", "check", "es1:9200", "--pretty"]);
        match cli.command {
            Commands::Check { hosts, timeout_ms, pretty, .. } => {
                assert_eq!(hosts, vec!["es1:9200"]);
                assert_eq!(timeout_ms, 5000);
                assert!(pretty);
            }
            _ => panic!("expected check"),
        }
    }
}
