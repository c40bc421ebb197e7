use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the Libero binary.
#[derive(Debug, Parser)]
#[command(name = "libero", version, about = "Libero sports data cache")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "LIBERO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve the sports API and run the background refresh scheduler.
    Serve(Box<ServeArgs>),
    /// Delete expired cache rows once and exit.
    Sweep(MaintenanceArgs),
    /// Refresh today's fixtures and every configured summary once and exit.
    Warm(MaintenanceArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct UpstreamOverrides {
    /// Override the upstream provider base URL.
    #[arg(long = "upstream-base-url", value_name = "URL")]
    pub upstream_base_url: Option<String>,

    /// Provider API token sent as `X-Auth-Token`.
    #[arg(
        long = "upstream-api-key",
        env = "LIBERO_UPSTREAM_API_KEY",
        value_name = "TOKEN",
        hide_env_values = true
    )]
    pub upstream_api_key: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct MaintenanceArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    #[command(flatten)]
    pub upstream: UpstreamOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    #[command(flatten)]
    pub database: DatabaseOverride,

    #[command(flatten)]
    pub upstream: UpstreamOverrides,

    /// Enable or disable the background refresh scheduler.
    #[arg(
        long = "scheduler-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub scheduler_enabled: Option<bool>,
}
