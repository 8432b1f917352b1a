use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::{ApiResponse, Paginated};
use crate::dto::maintenance_dto::{
    CreateMaintenanceTypeRequest, MaintenanceTypeFilters, UpdateMaintenanceTypeRequest,
};
use crate::models::MaintenanceType;
use crate::repositories::maintenance_type_repository::MaintenanceTypeRepository;
use crate::utils::errors::{not_found_error, validation_error, AppError};
use crate::utils::validation::{page_bounds, resolve_ordering};

const TYPE_ORDERING: &[(&str, &str)] = &[("name", "mt.name")];

pub struct MaintenanceTypeController {
    repository: MaintenanceTypeRepository,
}

impl MaintenanceTypeController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: MaintenanceTypeRepository::new(pool),
        }
    }

    pub async fn create(
        &self,
        request: CreateMaintenanceTypeRequest,
    ) -> Result<ApiResponse<MaintenanceType>, AppError> {
        request.validate()?;

        let maintenance_type = self
            .repository
            .create(
                request.name.trim(),
                request.description.as_deref().unwrap_or_default(),
                request.recommended_interval_km,
                request.recommended_interval_months,
            )
            .await?;

        info!("🔧 Tipo de mantenimiento creado: {}", maintenance_type.name);
        Ok(ApiResponse::success_with_message(
            maintenance_type,
            "Maintenance type created successfully",
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<MaintenanceType, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Maintenance type", id))
    }

    pub async fn list(&self, filters: MaintenanceTypeFilters) -> Result<Paginated<MaintenanceType>, AppError> {
        let order_by = resolve_ordering(filters.ordering.as_deref(), TYPE_ORDERING, "name")?;
        let (limit, offset) = page_bounds(filters.limit, filters.offset);

        let (results, count) = self
            .repository
            .list(filters.search.as_deref(), &order_by, limit, offset)
            .await?;

        Ok(Paginated {
            count,
            limit,
            offset,
            results,
        })
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateMaintenanceTypeRequest,
    ) -> Result<ApiResponse<MaintenanceType>, AppError> {
        request.validate()?;

        let mut maintenance_type = self.get_by_id(id).await?;

        if let Some(name) = request.name {
            maintenance_type.name = name.trim().to_string();
        }
        if let Some(description) = request.description {
            maintenance_type.description = description;
        }
        if let Some(km) = request.recommended_interval_km {
            if matches!(km, Some(v) if v < 0) {
                return Err(validation_error(
                    "recommended_interval_km",
                    "Ensure this value is greater than or equal to 0.",
                ));
            }
            maintenance_type.recommended_interval_km = km;
        }
        if let Some(months) = request.recommended_interval_months {
            if matches!(months, Some(v) if v < 0) {
                return Err(validation_error(
                    "recommended_interval_months",
                    "Ensure this value is greater than or equal to 0.",
                ));
            }
            maintenance_type.recommended_interval_months = months;
        }

        let maintenance_type = self.repository.update(&maintenance_type).await?;
        Ok(ApiResponse::success_with_message(
            maintenance_type,
            "Maintenance type updated successfully",
        ))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repository.delete(id).await? {
            return Err(not_found_error("Maintenance type", id));
        }
        Ok(())
    }
}
