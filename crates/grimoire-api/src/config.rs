//! Server configuration from the environment.
//!
//! All knobs come in as `GRIMOIRE_*` variables (plus the conventional
//! `DATABASE_URL`), loaded once at startup into an explicit struct — no
//! globals read at require time.

use grimoire_core::{Error, Result};

/// Which store backend the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgreSQL via `DATABASE_URL`.
    Postgres,
    /// Process-local in-memory store. Data does not survive a restart;
    /// meant for demos and smoke tests.
    Memory,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind host (`GRIMOIRE_HOST`, default `0.0.0.0`).
    pub host: String,
    /// Bind port (`GRIMOIRE_PORT`, default `8080`; `0` picks a free port).
    pub port: u16,
    /// Store backend (`GRIMOIRE_STORE`: `postgres` | `memory`).
    pub store: StoreBackend,
    /// PostgreSQL connection string (`DATABASE_URL`), required for the
    /// postgres backend.
    pub database_url: Option<String>,
    /// Secret keying the HMAC token verifier (`GRIMOIRE_AUTH_SECRET`).
    pub auth_secret: String,
    /// CORS allow-list (`GRIMOIRE_ALLOWED_ORIGINS`, comma-separated).
    pub allowed_origins: Vec<String>,
}

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ORIGIN: &str = "http://localhost:3000";

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("GRIMOIRE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = match std::env::var("GRIMOIRE_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("GRIMOIRE_PORT is not a port: {raw}")))?,
            Err(_) => DEFAULT_PORT,
        };

        let store = match std::env::var("GRIMOIRE_STORE").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("postgres") | Err(_) => StoreBackend::Postgres,
            Ok(other) => {
                return Err(Error::Config(format!(
                    "GRIMOIRE_STORE must be `postgres` or `memory`, got `{other}`"
                )))
            }
        };

        let database_url = std::env::var("DATABASE_URL").ok();
        if store == StoreBackend::Postgres && database_url.is_none() {
            return Err(Error::Config(
                "DATABASE_URL is required for the postgres store".to_string(),
            ));
        }

        let auth_secret = std::env::var("GRIMOIRE_AUTH_SECRET")
            .map_err(|_| Error::Config("GRIMOIRE_AUTH_SECRET is required".to_string()))?;

        let allowed_origins = parse_allowed_origins(
            &std::env::var("GRIMOIRE_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| DEFAULT_ORIGIN.to_string()),
        );

        Ok(Self {
            host,
            port,
            store,
            database_url,
            auth_secret,
            allowed_origins,
        })
    }
}

fn parse_allowed_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allowed_origins_splits_and_trims() {
        let origins = parse_allowed_origins("http://a.example , http://b.example,,");
        assert_eq!(origins, vec!["http://a.example", "http://b.example"]);
    }

    #[test]
    fn test_parse_allowed_origins_single_default() {
        assert_eq!(
            parse_allowed_origins(DEFAULT_ORIGIN),
            vec![DEFAULT_ORIGIN.to_string()]
        );
    }
}
