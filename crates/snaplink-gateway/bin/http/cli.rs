use clap::{Parser, ValueEnum};

pub const DATABASE_URL_ENV: &str = "SNAPLINK_DATABASE_URL";
pub const REDIS_URL_ENV: &str = "SNAPLINK_REDIS_URL";
pub const LISTEN_ADDR_ENV: &str = "SNAPLINK_LISTEN_ADDR";
pub const PUBLIC_BASE_URL_ENV: &str = "SNAPLINK_PUBLIC_BASE_URL";
pub const LOG_FORMAT_ENV: &str = "SNAPLINK_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "snaplink")]
pub struct Cli {
    #[arg(long, env = DATABASE_URL_ENV)]
    pub database_url: String,

    /// Redis connection URL. When absent the gateway falls back to an
    /// in-process cache.
    #[arg(long, env = REDIS_URL_ENV)]
    pub redis_url: Option<String>,

    #[arg(long, env = LISTEN_ADDR_ENV, default_value = "127.0.0.1:8080")]
    pub listen_addr: String,

    /// Base used when rendering short URLs in responses.
    #[arg(long, env = PUBLIC_BASE_URL_ENV, default_value = "http://localhost:8080")]
    pub public_base_url: String,

    /// Log output format.
    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}
