//! Command line definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "conflux", author, version, about = "Named-function workers with caching, coalescing, and supervision", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a worker runtime hosting the configured functions
    Worker {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,

        /// Print the resolved configuration snapshot and exit without serving
        #[arg(long)]
        print_config: bool,

        /// Log errors only
        #[arg(long)]
        silent: bool,
    },

    /// Run the supervisor control plane
    Supervisor {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Override the control API bind address
        #[arg(long, value_name = "HOST:PORT")]
        bind: Option<String>,
    },

    /// Talk to a running supervisor
    Control {
        /// Control API base URL
        #[arg(long, default_value = "http://127.0.0.1:4000")]
        url: String,

        #[command(subcommand)]
        command: ControlCommands,
    },
}

#[derive(Subcommand)]
pub enum ControlCommands {
    /// Start a worker from a configuration file
    Start {
        /// Configuration file identifying the worker
        config: PathBuf,
    },

    /// Stop a worker by its configuration file
    Stop {
        /// Configuration file identifying the worker
        config: PathBuf,

        /// Shut the supervisor down if this stop empties its registry
        #[arg(long)]
        exit_if_last: bool,
    },

    /// Show the supervisor's worker registry
    Status,

    /// Shut the supervisor down
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_worker_args() {
        let cli = Cli::parse_from([
            "conflux",
            "worker",
            "--config",
            "worker.yaml",
            "--port",
            "4200",
            "--silent",
        ]);
        match cli.command {
            Commands::Worker {
                config,
                port,
                print_config,
                silent,
            } => {
                assert_eq!(config, Some(PathBuf::from("worker.yaml")));
                assert_eq!(port, Some(4200));
                assert!(!print_config);
                assert!(silent);
            }
            _ => panic!("expected worker subcommand"),
        }
    }

    #[test]
    fn test_control_stop_flag() {
        let cli = Cli::parse_from([
            "conflux",
            "control",
            "stop",
            "worker.yaml",
            "--exit-if-last",
        ]);
        match cli.command {
            Commands::Control { command, url } => {
                assert_eq!(url, "http://127.0.0.1:4000");
                match command {
                    ControlCommands::Stop {
                        config,
                        exit_if_last,
                    } => {
                        assert_eq!(config, PathBuf::from("worker.yaml"));
                        assert!(exit_if_last);
                    }
                    _ => panic!("expected stop subcommand"),
                }
            }
            _ => panic!("expected control subcommand"),
        }
    }
}
