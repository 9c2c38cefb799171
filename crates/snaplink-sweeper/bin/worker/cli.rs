use clap::{Parser, ValueEnum};

pub const DATABASE_URL_ENV: &str = "SNAPLINK_DATABASE_URL";
pub const INTERVAL_SECS_ENV: &str = "SNAPLINK_SWEEPER_INTERVAL_SECS";
pub const BATCH_SIZE_ENV: &str = "SNAPLINK_SWEEPER_BATCH_SIZE";
pub const CYCLE_TIMEOUT_SECS_ENV: &str = "SNAPLINK_SWEEPER_CYCLE_TIMEOUT_SECS";
pub const RETENTION_HOURS_ENV: &str = "SNAPLINK_SWEEPER_RETENTION_HOURS";
pub const LOG_FORMAT_ENV: &str = "SNAPLINK_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "snaplink-sweeper")]
pub struct Cli {
    #[arg(long, env = DATABASE_URL_ENV)]
    pub database_url: String,

    /// Seconds between cleanup cycles.
    #[arg(long, env = INTERVAL_SECS_ENV, default_value_t = 60 * 60)]
    pub interval_secs: u64,

    /// Maximum short links reclaimed per cycle.
    #[arg(long, env = BATCH_SIZE_ENV, default_value_t = 1000)]
    pub batch_size: usize,

    /// Upper bound, in seconds, on one cycle's runtime.
    #[arg(long, env = CYCLE_TIMEOUT_SECS_ENV, default_value_t = 60)]
    pub cycle_timeout_secs: u64,

    /// Hours a short link may go unaccessed before it is reclaimed.
    #[arg(long, env = RETENTION_HOURS_ENV, default_value_t = 24)]
    pub retention_hours: u64,

    /// Log output format.
    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}
