use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};

use crate::controllers::auth_controller::AuthController;
use crate::controllers::user_controller::UserController;
use crate::dto::auth_dto::{
    LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse, RegisterRequest,
    RegisterResponse,
};
use crate::dto::user_dto::{
    ChangePasswordRequest, ChangePasswordResponse, UpdateProfileRequest, UserProfileResponse,
};
use crate::middleware::{auth_middleware, AuthenticatedUser};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Configura las rutas de autenticación y perfil
pub fn create_auth_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/token/refresh", post(refresh_token));

    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/profile", get(get_profile).put(update_profile).patch(update_profile))
        .route("/change-password", put(change_password).patch(change_password))
        .route("/delete-account", delete(delete_account))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let response = AuthController::new(&state).register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AuthController::new(&state).login(request).await?;
    Ok(Json(response))
}

async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<RefreshTokenResponse>, AppError> {
    let response = AuthController::new(&state).refresh(request).await?;
    Ok(Json(response))
}

async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<StatusCode, AppError> {
    AuthController::new(&state).logout(user.user_id, request).await?;
    Ok(StatusCode::RESET_CONTENT)
}

async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<UserProfileResponse>, AppError> {
    let response = UserController::new(state.pool.clone()).profile(user.user_id).await?;
    Ok(Json(response))
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfileResponse>, AppError> {
    let response = UserController::new(state.pool.clone())
        .update_profile(user.user_id, request)
        .await?;
    Ok(Json(response))
}

async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, AppError> {
    let response = UserController::new(state.pool.clone())
        .change_password(user.user_id, request)
        .await?;
    Ok(Json(response))
}

async fn delete_account(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<StatusCode, AppError> {
    UserController::new(state.pool.clone())
        .delete_account(user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
