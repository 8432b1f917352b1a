//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use anyhow::{anyhow, Context, Result};
use std::env;

/// Duración por defecto del access token (1 hora)
const DEFAULT_ACCESS_TTL_SECS: u64 = 60 * 60;
/// Duración por defecto del refresh token (7 días)
const DEFAULT_REFRESH_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_access_ttl: u64,
    pub jwt_refresh_ttl: u64,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub media_base_url: Option<String>,
}

impl EnvironmentConfig {
    /// Leer la configuración desde las variables de entorno del proceso
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construir la configuración a partir de una función de búsqueda de claves
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{} must be set", key))
        };

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a valid number, got '{}'", raw))?,
            None => 3000,
        };

        let jwt_access_ttl = parse_secs(&lookup, "JWT_ACCESS_TTL_SECS", DEFAULT_ACCESS_TTL_SECS)?;
        let jwt_refresh_ttl = parse_secs(&lookup, "JWT_REFRESH_TTL_SECS", DEFAULT_REFRESH_TTL_SECS)?;

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            port,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_access_ttl,
            jwt_refresh_ttl,
            cors_origins,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            media_base_url: lookup("MEDIA_BASE_URL").map(|u| u.trim_end_matches('/').to_string()),
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Nivel máximo de logging para tracing
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level
            .parse()
            .unwrap_or(tracing::Level::INFO)
    }
}

fn parse_secs<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number of seconds, got '{}'", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = EnvironmentConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/maintenance"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.port, 3000);
        assert!(config.is_development());
        assert_eq!(config.jwt_access_ttl, DEFAULT_ACCESS_TTL_SECS);
        assert_eq!(config.jwt_refresh_ttl, DEFAULT_REFRESH_TTL_SECS);
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.tracing_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let err = EnvironmentConfig::from_lookup(lookup_from(&[(
            "DATABASE_URL",
            "postgres://localhost/maintenance",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let result = EnvironmentConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/maintenance"),
            ("JWT_SECRET", "secret"),
            ("PORT", "not-a-port"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_cors_origins_and_media_url() {
        let config = EnvironmentConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/maintenance"),
            ("JWT_SECRET", "secret"),
            ("ENVIRONMENT", "production"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("MEDIA_BASE_URL", "https://cdn.example/media/"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();

        assert!(config.is_production());
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.media_base_url.as_deref(), Some("https://cdn.example/media"));
        assert_eq!(config.tracing_level(), tracing::Level::DEBUG);
    }
}
