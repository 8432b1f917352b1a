use bcrypt::{hash, verify, DEFAULT_COST};
use tracing::{info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::dto::auth_dto::{
    AuthUser, LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse,
    RegisterRequest, RegisterResponse,
};
use crate::repositories::token_repository::TokenRepository;
use crate::repositories::user_repository::UserRepository;
use crate::services::JwtService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::TokenType;
use crate::utils::validation::{normalize_email, validate_password_strength};

pub struct AuthController {
    users: UserRepository,
    tokens: TokenRepository,
    jwt: JwtService,
}

impl AuthController {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: UserRepository::new(state.pool.clone()),
            tokens: TokenRepository::new(state.pool.clone()),
            jwt: JwtService::new(&state.config),
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<RegisterResponse, AppError> {
        request.validate()?;

        let email = normalize_email(&request.email);
        if let Err(e) = validate_password_strength(&request.password, Some(&email)) {
            let mut errors = ValidationErrors::new();
            errors.add("password", e);
            return Err(AppError::Validation(errors));
        }

        // Verificar que el email no exista
        if self.users.email_exists(&email).await? {
            return Err(AppError::Conflict("A user with this email already exists.".to_string()));
        }

        // Hash de la contraseña
        let password_hash = hash(&request.password, DEFAULT_COST)
            .map_err(|e| AppError::Hash(format!("Error hashing password: {}", e)))?;

        let user = self
            .users
            .create(&email, request.first_name.trim(), request.last_name.trim(), &password_hash)
            .await?;

        info!("👤 Usuario registrado: {}", user.id);

        Ok(RegisterResponse {
            refresh: self.jwt.generate_refresh_token(user.id)?,
            access: self.jwt.generate_access_token(user.id)?,
            user: user.into(),
            message: "User registered successfully.".to_string(),
        })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        request.validate()?;

        let invalid = || {
            AppError::Unauthorized("No active account found with the given credentials".to_string())
        };

        // Buscar usuario por email
        let user = self
            .users
            .find_by_email(&normalize_email(&request.email))
            .await?
            .ok_or_else(invalid)?;

        // Verificar contraseña
        let valid = verify(&request.password, &user.password_hash)
            .map_err(|e| AppError::Hash(format!("Error verifying password: {}", e)))?;

        if !valid || !user.is_active {
            warn!("Login fallido para {}", user.id);
            return Err(invalid());
        }

        Ok(LoginResponse {
            refresh: self.jwt.generate_refresh_token(user.id)?,
            access: self.jwt.generate_access_token(user.id)?,
            user: AuthUser::from(&user),
        })
    }

    /// Nuevo access token a partir de un refresh token no revocado
    pub async fn refresh(&self, request: RefreshTokenRequest) -> Result<RefreshTokenResponse, AppError> {
        let claims = self.jwt.validate_token(&request.refresh, TokenType::Refresh)?;

        if self.tokens.is_blacklisted(claims.token_id()?).await? {
            return Err(AppError::Jwt("Token is blacklisted".to_string()));
        }

        let user = self
            .users
            .find_by_id(claims.user_id()?)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        Ok(RefreshTokenResponse {
            access: self.jwt.generate_access_token(user.id)?,
        })
    }

    /// Revoca el refresh token; cualquier token inválido es un 400
    pub async fn logout(&self, user_id: Uuid, request: RefreshTokenRequest) -> Result<(), AppError> {
        let claims = self
            .jwt
            .validate_token(&request.refresh, TokenType::Refresh)
            .map_err(|e| {
                warn!("Logout fallido para {}: {}", user_id, e);
                AppError::BadRequest("Invalid refresh token".to_string())
            })?;

        let jti = claims
            .token_id()
            .map_err(|_| AppError::BadRequest("Invalid refresh token".to_string()))?;

        self.tokens
            .blacklist(jti, claims.user_id()?, claims.expires_at())
            .await?;

        let purged = self.tokens.purge_expired().await?;
        if purged > 0 {
            info!("🧹 {} tokens expirados eliminados de la lista negra", purged);
        }

        Ok(())
    }
}
