use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable not set: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// Runtime settings read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub cors_allow_origin: Option<String>,
    pub admin_seed: Option<AdminSeed>,
    /// Populate an empty database with demo courses, groups and accounts.
    pub seed_demo_data: bool,
}

/// Credentials of the admin account created at startup when missing.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let host = match env::var("HOST") {
            Ok(host) => host
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::Invalid("HOST", host))?,
            Err(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };
        let port = parse_or("PORT", 3000u16)?;

        let admin_seed = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
            (Ok(username), Ok(password)) => Some(AdminSeed {
                email: env::var("ADMIN_EMAIL").unwrap_or_else(|_| format!("{}@campus.local", username)),
                username,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            bind_addr: SocketAddr::new(host, port),
            cors_allow_origin: env::var("CORS_ALLOW_ORIGIN").ok(),
            admin_seed,
            seed_demo_data: parse_or("SEED_DEMO_DATA", false)?,
        })
    }
}

/// Reads `key` and parses it, falling back to `default` when unset.
pub fn parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().map_err(|_| ConfigError::Invalid(key, raw)),
        Err(_) => Ok(default),
    }
}
