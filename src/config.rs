use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DB_PATH: &str = "movies.sled";
/// Access tokens live for 15 minutes unless configured otherwise.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 15 * 60;
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;
pub const DEFAULT_TEMPLATES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*");

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("secret key must not be empty")]
    EmptySecret,
    #[error("bcrypt cost must be between 4 and 31, got {0}")]
    BcryptCost(u32),
    #[error("token lifetime must be at least one second")]
    ZeroTokenTtl,
    #[error("token lifetime must be at most one year, got {0} seconds")]
    TokenTtlTooLong(u64),
}

/// Movie catalog API server.
#[derive(Parser, Debug, Clone)]
#[command(name = "movie-catalog")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "MOVIES_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "MOVIES_PORT")]
    pub port: u16,

    /// Directory of the sled database.
    #[arg(long, default_value = DEFAULT_DB_PATH, env = "MOVIES_DB_PATH")]
    pub db_path: PathBuf,

    /// Keep the database in memory and discard it on exit.
    #[arg(long, env = "MOVIES_TEMPORARY")]
    pub temporary: bool,

    /// Secret used to sign access tokens.
    #[arg(long, env = "MOVIES_SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,

    /// Access token lifetime in seconds.
    #[arg(long, default_value_t = DEFAULT_TOKEN_TTL_SECS, env = "MOVIES_TOKEN_TTL")]
    pub token_ttl: u64,

    /// bcrypt work factor for new password hashes.
    #[arg(long, default_value_t = bcrypt::DEFAULT_COST, env = "MOVIES_BCRYPT_COST")]
    pub bcrypt_cost: u32,

    /// JSON file of movies loaded into an empty database at startup.
    #[arg(long, env = "MOVIES_SEED")]
    pub seed: Option<PathBuf>,

    /// Glob matching the page templates.
    #[arg(long, default_value = DEFAULT_TEMPLATES, env = "MOVIES_TEMPLATES")]
    pub templates: String,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret_key.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::BcryptCost(self.bcrypt_cost));
        }
        if self.token_ttl == 0 {
            return Err(ConfigError::ZeroTokenTtl);
        }
        if self.token_ttl > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::TokenTtlTooLong(self.token_ttl));
        }
        Ok(())
    }

    pub fn open_store(&self) -> sled::Result<sled::Db> {
        if self.temporary {
            sled::Config::new().temporary(true).open()
        } else {
            sled::Config::new().path(&self.db_path).open()
        }
    }

    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "movie_catalog=debug,actix_web=info"
        } else {
            "movie_catalog=info,actix_web=info"
        }
    }
}
