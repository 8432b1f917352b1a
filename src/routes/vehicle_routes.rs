use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::common_dto::{ApiResponse, Paginated, StatusResponse};
use crate::dto::vehicle_dto::{
    CreateVehicleImageRequest, CreateVehicleRequest, UpdateVehicleRequest, VehicleFilters,
    VehicleImageResponse, VehicleListItem, VehicleResponse,
};
use crate::middleware::{auth_middleware, AuthenticatedUser};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route(
            "/:id",
            get(get_vehicle)
                .put(update_vehicle)
                .patch(update_vehicle)
                .delete(delete_vehicle),
        )
        .route("/:id/images", get(list_images).post(upload_image))
        .route("/:id/upload-image", post(upload_image))
        .route("/:id/set-primary-image/:image_id", post(set_primary_image))
        .route("/:id/delete-image/:image_id", delete(delete_image))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VehicleResponse>>), AppError> {
    let response = VehicleController::new(&state).create(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<VehicleResponse>, AppError> {
    let response = VehicleController::new(&state).get_by_id(id, user.user_id).await?;
    Ok(Json(response))
}

async fn list_vehicles(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(filters): Query<VehicleFilters>,
) -> Result<Json<Paginated<VehicleListItem>>, AppError> {
    let response = VehicleController::new(&state).list(user.user_id, filters).await?;
    Ok(Json(response))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let response = VehicleController::new(&state)
        .update(id, user.user_id, request)
        .await?;
    Ok(Json(response))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    VehicleController::new(&state).delete(id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_images(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<VehicleImageResponse>>, AppError> {
    let response = VehicleController::new(&state).list_images(id, user.user_id).await?;
    Ok(Json(response))
}

async fn upload_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateVehicleImageRequest>,
) -> Result<(StatusCode, Json<VehicleImageResponse>), AppError> {
    let response = VehicleController::new(&state)
        .add_image(id, user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn set_primary_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<StatusResponse>, AppError> {
    let response = VehicleController::new(&state)
        .set_primary_image(id, user.user_id, image_id)
        .await?;
    Ok(Json(response))
}

async fn delete_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    VehicleController::new(&state)
        .delete_image(id, user.user_id, image_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
