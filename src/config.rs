//! Process configuration, read once from the environment at start-up.

use std::net::{Ipv4Addr, SocketAddr};

use anyhow::{bail, Context, Result};
use ::http::HeaderValue;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://todos.db";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// The only origin permitted to make cross-origin requests.
    pub allowed_origin: HeaderValue,
}

impl Config {
    /// Reads `PORT`, `DATABASE_URL` and `CORS_ALLOWED_ORIGIN`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().with_context(|| format!("PORT must be a valid port number, got {raw:?}"))?,
            None => DEFAULT_PORT,
        };
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let origin = lookup("CORS_ALLOWED_ORIGIN").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string());
        if origin.trim() == "*" {
            bail!("CORS_ALLOWED_ORIGIN must name a single origin, not \"*\"");
        }
        let allowed_origin = HeaderValue::from_str(origin.trim())
            .with_context(|| format!("CORS_ALLOWED_ORIGIN is not a valid header value: {origin:?}"))?;
        Ok(Self { port, database_url, allowed_origin })
    }

    pub fn listen_addr(&self) -> SocketAddr { SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port)) }
}
