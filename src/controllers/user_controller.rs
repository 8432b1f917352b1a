use bcrypt::{hash, verify, DEFAULT_COST};
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::dto::user_dto::{
    ChangePasswordRequest, ChangePasswordResponse, UpdateProfileRequest, UserProfileResponse,
};
use crate::repositories::user_repository::UserRepository;
use crate::utils::errors::{validation_error, AppError};
use crate::utils::validation::validate_password_strength;
use sqlx::PgPool;

pub struct UserController {
    repository: UserRepository,
}

impl UserController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: UserRepository::new(pool),
        }
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfileResponse, AppError> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user.into())
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<UserProfileResponse, AppError> {
        request.validate()?;

        let user = self
            .repository
            .update_profile(
                user_id,
                request.first_name.map(|s| s.trim().to_string()),
                request.last_name.map(|s| s.trim().to_string()),
            )
            .await?;

        Ok(user.into())
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> Result<ChangePasswordResponse, AppError> {
        request.validate()?;

        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let valid = verify(&request.old_password, &user.password_hash)
            .map_err(|e| AppError::Hash(format!("Error verifying password: {}", e)))?;
        if !valid {
            return Err(validation_error("old_password", "Wrong password."));
        }

        if let Err(e) = validate_password_strength(&request.new_password, Some(&user.email)) {
            let mut errors = ValidationErrors::new();
            errors.add("new_password", e);
            return Err(AppError::Validation(errors));
        }

        let password_hash = hash(&request.new_password, DEFAULT_COST)
            .map_err(|e| AppError::Hash(format!("Error hashing password: {}", e)))?;
        self.repository.update_password(user_id, &password_hash).await?;

        info!("🔑 Contraseña actualizada para {}", user_id);

        Ok(ChangePasswordResponse {
            status: "success".to_string(),
            code: 200,
            message: "Password updated successfully".to_string(),
            data: Vec::new(),
        })
    }

    pub async fn delete_account(&self, user_id: Uuid) -> Result<(), AppError> {
        if !self.repository.delete(user_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        info!("🗑️ Cuenta eliminada: {}", user_id);
        Ok(())
    }
}
