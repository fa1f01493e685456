use jsonwebtoken::Algorithm;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    /// Optional bootstrap admin account, created at startup if absent.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

/// Parse a signing algorithm name. A misconfigured value is a startup
/// error, not something to silently downgrade at verification time.
pub fn parse_algorithm(name: &str) -> anyhow::Result<Algorithm> {
    Algorithm::from_str(name).map_err(|_| anyhow::anyhow!("unsupported JWT algorithm: {name}"))
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let algorithm_name =
            std::env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            algorithm: parse_algorithm(&algorithm_name)?,
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
        };
        Ok(Self {
            database_url,
            jwt,
            admin_username: std::env::var("ADMIN_USERNAME").ok(),
            admin_password: std::env::var("ADMIN_PASSWORD").ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_algorithms_parse() {
        assert_eq!(parse_algorithm("HS256").unwrap(), Algorithm::HS256);
        assert_eq!(parse_algorithm("HS384").unwrap(), Algorithm::HS384);
        assert_eq!(parse_algorithm("HS512").unwrap(), Algorithm::HS512);
    }

    #[test]
    fn unknown_algorithm_is_an_error() {
        let err = parse_algorithm("none").unwrap_err();
        assert!(err.to_string().contains("unsupported JWT algorithm"));
        assert!(parse_algorithm("").is_err());
        assert!(parse_algorithm("hs256").is_err());
    }
}
