use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::maintenance_record_controller::MaintenanceRecordController;
use crate::controllers::maintenance_type_controller::MaintenanceTypeController;
use crate::controllers::reminder_controller::ReminderController;
use crate::dto::common_dto::{ApiResponse, PageQuery, Paginated, StatusResponse};
use crate::dto::maintenance_dto::{
    CreateMaintenanceRecordRequest, CreateMaintenanceTypeRequest, CreateReminderRequest,
    MaintenanceRecordFilters, MaintenanceRecordListItem, MaintenanceRecordResponse,
    MaintenanceTypeFilters, ReminderFilters, ReminderListItem, UpdateMaintenanceRecordRequest,
    UpdateMaintenanceTypeRequest, UpdateReminderRequest,
};
use crate::middleware::{auth_middleware, AuthenticatedUser};
use crate::models::{MaintenanceType, Reminder};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_maintenance_router(state: AppState) -> Router<AppState> {
    Router::new()
        // Tipos de mantenimiento
        .route("/maintenance-types", get(list_types).post(create_type))
        .route(
            "/maintenance-types/:id",
            get(get_type).put(update_type).patch(update_type).delete(delete_type),
        )
        // Registros
        .route("/records", get(list_records).post(create_record))
        .route("/records/upcoming", get(upcoming_records))
        .route(
            "/records/:id",
            get(get_record)
                .put(update_record)
                .patch(update_record)
                .delete(delete_record),
        )
        .route("/records/:id/create-reminder", post(create_reminder))
        // Recordatorios
        .route("/reminders", get(list_reminders))
        .route("/reminders/upcoming", get(upcoming_reminders))
        .route(
            "/reminders/:id",
            get(get_reminder)
                .put(update_reminder)
                .patch(update_reminder)
                .delete(delete_reminder),
        )
        .route("/reminders/:id/mark-completed", post(mark_completed))
        .route("/reminders/:id/mark-uncompleted", post(mark_uncompleted))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

// ---------------------------------------------------------------------------
// Tipos de mantenimiento
// ---------------------------------------------------------------------------

async fn list_types(
    State(state): State<AppState>,
    Query(filters): Query<MaintenanceTypeFilters>,
) -> Result<Json<Paginated<MaintenanceType>>, AppError> {
    let response = MaintenanceTypeController::new(state.pool.clone()).list(filters).await?;
    Ok(Json(response))
}

async fn create_type(
    State(state): State<AppState>,
    Json(request): Json<CreateMaintenanceTypeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MaintenanceType>>), AppError> {
    let response = MaintenanceTypeController::new(state.pool.clone()).create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MaintenanceType>, AppError> {
    let response = MaintenanceTypeController::new(state.pool.clone()).get_by_id(id).await?;
    Ok(Json(response))
}

async fn update_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMaintenanceTypeRequest>,
) -> Result<Json<ApiResponse<MaintenanceType>>, AppError> {
    let response = MaintenanceTypeController::new(state.pool.clone())
        .update(id, request)
        .await?;
    Ok(Json(response))
}

async fn delete_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    MaintenanceTypeController::new(state.pool.clone()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Registros de mantenimiento
// ---------------------------------------------------------------------------

async fn list_records(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(filters): Query<MaintenanceRecordFilters>,
) -> Result<Json<Paginated<MaintenanceRecordListItem>>, AppError> {
    let response = MaintenanceRecordController::new(&state)
        .list(user.user_id, filters)
        .await?;
    Ok(Json(response))
}

async fn upcoming_records(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<MaintenanceRecordListItem>>, AppError> {
    let response = MaintenanceRecordController::new(&state)
        .upcoming(user.user_id, page.limit, page.offset)
        .await?;
    Ok(Json(response))
}

async fn create_record(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateMaintenanceRecordRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MaintenanceRecordResponse>>), AppError> {
    let response = MaintenanceRecordController::new(&state)
        .create(user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_record(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MaintenanceRecordResponse>, AppError> {
    let response = MaintenanceRecordController::new(&state)
        .get_by_id(id, user.user_id)
        .await?;
    Ok(Json(response))
}

async fn update_record(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMaintenanceRecordRequest>,
) -> Result<Json<ApiResponse<MaintenanceRecordResponse>>, AppError> {
    let response = MaintenanceRecordController::new(&state)
        .update(id, user.user_id, request)
        .await?;
    Ok(Json(response))
}

async fn delete_record(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    MaintenanceRecordController::new(&state)
        .delete(id, user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_reminder(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateReminderRequest>,
) -> Result<(StatusCode, Json<Reminder>), AppError> {
    let response = MaintenanceRecordController::new(&state)
        .create_reminder(id, user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

// ---------------------------------------------------------------------------
// Recordatorios
// ---------------------------------------------------------------------------

async fn list_reminders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(filters): Query<ReminderFilters>,
) -> Result<Json<Paginated<ReminderListItem>>, AppError> {
    let response = ReminderController::new(state.pool.clone())
        .list(user.user_id, filters)
        .await?;
    Ok(Json(response))
}

async fn upcoming_reminders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<ReminderListItem>>, AppError> {
    let response = ReminderController::new(state.pool.clone())
        .upcoming(user.user_id, page.limit, page.offset)
        .await?;
    Ok(Json(response))
}

async fn get_reminder(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Reminder>, AppError> {
    let response = ReminderController::new(state.pool.clone())
        .get_by_id(id, user.user_id)
        .await?;
    Ok(Json(response))
}

async fn update_reminder(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateReminderRequest>,
) -> Result<Json<ApiResponse<Reminder>>, AppError> {
    let response = ReminderController::new(state.pool.clone())
        .update(id, user.user_id, request)
        .await?;
    Ok(Json(response))
}

async fn delete_reminder(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ReminderController::new(state.pool.clone())
        .delete(id, user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn mark_completed(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, AppError> {
    let response = ReminderController::new(state.pool.clone())
        .set_completed(id, user.user_id, true)
        .await?;
    Ok(Json(response))
}

async fn mark_uncompleted(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, AppError> {
    let response = ReminderController::new(state.pool.clone())
        .set_completed(id, user.user_id, false)
        .await?;
    Ok(Json(response))
}
