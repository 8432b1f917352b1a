use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::config::EnvironmentConfig;
use crate::utils::errors::AppError;
use crate::utils::jwt::{JwtClaims, TokenType};

/// Configuración JWT
pub struct JwtConfig {
    pub algorithm: Algorithm,
    pub access_token_duration: Duration,
    pub refresh_token_duration: Duration,
}

impl JwtConfig {
    pub fn from_environment(config: &EnvironmentConfig) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            access_token_duration: Duration::seconds(config.jwt_access_ttl as i64),
            refresh_token_duration: Duration::seconds(config.jwt_refresh_ttl as i64),
        }
    }
}

/// Servicio JWT
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(environment: &EnvironmentConfig) -> Self {
        Self {
            config: JwtConfig::from_environment(environment),
            encoding_key: EncodingKey::from_secret(environment.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(environment.jwt_secret.as_bytes()),
        }
    }

    /// Genera un token de acceso
    pub fn generate_access_token(&self, user_id: Uuid) -> Result<String, AppError> {
        self.generate(user_id, TokenType::Access, self.config.access_token_duration)
    }

    /// Genera un token de refresh
    pub fn generate_refresh_token(&self, user_id: Uuid) -> Result<String, AppError> {
        self.generate(user_id, TokenType::Refresh, self.config.refresh_token_duration)
    }

    fn generate(&self, user_id: Uuid, token_type: TokenType, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            token_type,
            jti: Uuid::new_v4().to_string(),
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::new(self.config.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Error generating token: {}", e)))
    }

    /// Valida firma, expiración y tipo del token
    pub fn validate_token(&self, token: &str, expected: TokenType) -> Result<JwtClaims, AppError> {
        let validation = Validation::new(self.config.algorithm);

        let claims = decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Jwt(format!("Invalid token: {}", e)))?;

        if claims.token_type != expected {
            return Err(AppError::Jwt("Token has wrong type".to_string()));
        }

        Ok(claims)
    }
}
