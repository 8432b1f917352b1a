use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::{ApiResponse, Paginated, StatusResponse};
use crate::dto::vehicle_dto::{
    CreateVehicleImageRequest, CreateVehicleRequest, UpdateVehicleRequest, VehicleFilters,
    VehicleImageResponse, VehicleListItem, VehicleResponse,
};
use crate::models::vehicle::media_url;
use crate::models::Vehicle;
use crate::repositories::vehicle_repository::{NewVehicle, VehicleRepository};
use crate::state::AppState;
use crate::utils::errors::{validation_error, AppError};
use crate::utils::validation::{normalize_vin, page_bounds, resolve_ordering};

const VEHICLE_ORDERING: &[(&str, &str)] = &[
    ("make", "v.make"),
    ("model_name", "v.model_name"),
    ("year", "v.year"),
    ("purchase_date", "v.purchase_date"),
    ("created_at", "v.created_at"),
];

pub struct VehicleController {
    repository: VehicleRepository,
    media_base_url: Option<String>,
}

impl VehicleController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: VehicleRepository::new(state.pool.clone()),
            media_base_url: state.media_base_url().map(str::to_string),
        }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        request: CreateVehicleRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        request.validate()?;

        let new_vehicle = NewVehicle {
            make: request.make.trim().to_string(),
            model_name: request.model_name.trim().to_string(),
            registration_number: request.registration_number.trim().to_string(),
            vehicle_type: request.vehicle_type.unwrap_or_default(),
            year: request.year,
            color: request.color.unwrap_or_default(),
            vin_number: request.vin_number.as_deref().map(normalize_vin).unwrap_or_default(),
            purchase_date: request.purchase_date,
            current_mileage: request.current_mileage.unwrap_or(0),
        };

        let vehicle = self
            .repository
            .create(user_id, &new_vehicle, &request.uploaded_images)
            .await?;

        info!("🚗 Vehículo creado: {} ({})", vehicle, vehicle.id);

        let response = self.detail(vehicle).await?;
        Ok(ApiResponse::success_with_message(response, "Vehicle created successfully"))
    }

    pub async fn get_by_id(&self, id: Uuid, user_id: Uuid) -> Result<VehicleResponse, AppError> {
        let vehicle = self.find_owned(id, user_id).await?;
        self.detail(vehicle).await
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        filters: VehicleFilters,
    ) -> Result<Paginated<VehicleListItem>, AppError> {
        let order_by = resolve_ordering(filters.ordering.as_deref(), VEHICLE_ORDERING, "-created_at")?;
        let (limit, offset) = page_bounds(filters.limit, filters.offset);

        let count = self.repository.count(user_id, &filters).await?;
        let vehicles = self
            .repository
            .list(user_id, &filters, &order_by, limit, offset)
            .await?;

        let results = self.list_items(vehicles).await?;
        debug!("Listados {} de {} vehículos para {}", results.len(), count, user_id);

        Ok(Paginated {
            count,
            limit,
            offset,
            results,
        })
    }

    /// Items ligeros de listado, con la URL de la imagen principal
    pub async fn list_items(&self, vehicles: Vec<Vehicle>) -> Result<Vec<VehicleListItem>, AppError> {
        let ids: Vec<Uuid> = vehicles.iter().map(|v| v.id).collect();
        let mut primary = self.repository.primary_images_for(&ids).await?;

        Ok(vehicles
            .into_iter()
            .map(|vehicle| {
                let image = primary
                    .remove(&vehicle.id)
                    .map(|path| self.image_url(&path));
                VehicleListItem::new(vehicle, image)
            })
            .collect())
    }

    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        request: UpdateVehicleRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        request.validate()?;

        let mut vehicle = self.find_owned(id, user_id).await?;

        if let Some(make) = request.make {
            vehicle.make = make.trim().to_string();
        }
        if let Some(model_name) = request.model_name {
            vehicle.model_name = model_name.trim().to_string();
        }
        if let Some(registration_number) = request.registration_number {
            vehicle.registration_number = registration_number.trim().to_string();
        }
        if let Some(vehicle_type) = request.vehicle_type {
            vehicle.vehicle_type = vehicle_type;
        }
        if let Some(year) = request.year {
            if matches!(year, Some(y) if !(1886..=2100).contains(&y)) {
                return Err(validation_error("year", "Ensure this value is between 1886 and 2100."));
            }
            vehicle.year = year;
        }
        if let Some(color) = request.color {
            vehicle.color = color;
        }
        if let Some(vin) = request.vin_number {
            vehicle.vin_number = normalize_vin(&vin);
        }
        if let Some(purchase_date) = request.purchase_date {
            vehicle.purchase_date = purchase_date;
        }
        if let Some(mileage) = request.current_mileage {
            // El kilometraje sólo sube
            if mileage < vehicle.current_mileage {
                return Err(validation_error(
                    "current_mileage",
                    "Mileage cannot be lower than the current mileage.",
                ));
            }
            vehicle.current_mileage = mileage;
        }

        let vehicle = self
            .repository
            .update(&vehicle, &request.uploaded_images)
            .await?;

        let response = self.detail(vehicle).await?;
        Ok(ApiResponse::success_with_message(response, "Vehicle updated successfully"))
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        if !self.repository.delete(id, user_id).await? {
            return Err(AppError::NotFound("Vehicle not found".to_string()));
        }

        info!("🗑️ Vehículo eliminado: {}", id);
        Ok(())
    }

    pub async fn list_images(&self, id: Uuid, user_id: Uuid) -> Result<Vec<VehicleImageResponse>, AppError> {
        let vehicle = self.find_owned(id, user_id).await?;
        self.images(vehicle.id).await
    }

    pub async fn add_image(
        &self,
        id: Uuid,
        user_id: Uuid,
        request: CreateVehicleImageRequest,
    ) -> Result<VehicleImageResponse, AppError> {
        request.validate()?;

        let vehicle = self.find_owned(id, user_id).await?;
        let image = self
            .repository
            .add_image(
                vehicle.id,
                request.image.trim(),
                request.caption.as_deref().unwrap_or_default(),
                request.is_primary,
            )
            .await?;

        Ok(VehicleImageResponse::from_image(image, self.media_base_url.as_deref()))
    }

    pub async fn set_primary_image(
        &self,
        id: Uuid,
        user_id: Uuid,
        image_id: Uuid,
    ) -> Result<StatusResponse, AppError> {
        let vehicle = self.find_owned(id, user_id).await?;

        self.repository
            .set_primary_image(vehicle.id, image_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

        Ok(StatusResponse::new("primary image set"))
    }

    pub async fn delete_image(&self, id: Uuid, user_id: Uuid, image_id: Uuid) -> Result<(), AppError> {
        let vehicle = self.find_owned(id, user_id).await?;

        if !self.repository.delete_image(vehicle.id, image_id).await? {
            return Err(AppError::NotFound("Image not found".to_string()));
        }
        Ok(())
    }

    async fn find_owned(&self, id: Uuid, user_id: Uuid) -> Result<Vehicle, AppError> {
        self.repository
            .find_owned(id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))
    }

    async fn detail(&self, vehicle: Vehicle) -> Result<VehicleResponse, AppError> {
        let images = self.images(vehicle.id).await?;
        Ok(VehicleResponse::new(vehicle, images))
    }

    async fn images(&self, vehicle_id: Uuid) -> Result<Vec<VehicleImageResponse>, AppError> {
        let images = self.repository.list_images(vehicle_id).await?;
        Ok(images
            .into_iter()
            .map(|image| VehicleImageResponse::from_image(image, self.media_base_url.as_deref()))
            .collect())
    }

    fn image_url(&self, path: &str) -> String {
        media_url(path, self.media_base_url.as_deref())
    }
}
