use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::nullable;
use crate::models::{Vehicle, VehicleImage, VehicleType};
use crate::utils::validation::{validate_image_paths, validate_vin};

// Request para crear un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 100))]
    pub make: String,

    #[validate(length(min = 1, max = 100))]
    pub model_name: String,

    #[validate(length(min = 1, max = 50))]
    pub registration_number: String,

    pub vehicle_type: Option<VehicleType>,

    #[validate(range(min = 1886, max = 2100))]
    pub year: Option<i32>,

    #[validate(length(max = 50))]
    pub color: Option<String>,

    #[validate(custom = "validate_vin")]
    pub vin_number: Option<String>,

    pub purchase_date: Option<NaiveDate>,

    #[validate(range(min = 0))]
    pub current_mileage: Option<i32>,

    // Rutas de imágenes ya almacenadas
    #[serde(default)]
    #[validate(custom = "validate_image_paths")]
    pub uploaded_images: Vec<String>,
}

// Request para actualizar un vehículo (PUT y PATCH son parciales)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 100))]
    pub make: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub model_name: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub registration_number: Option<String>,

    pub vehicle_type: Option<VehicleType>,

    // Validado en el controller (admite null)
    #[serde(default, deserialize_with = "nullable")]
    pub year: Option<Option<i32>>,

    #[validate(length(max = 50))]
    pub color: Option<String>,

    #[validate(custom = "validate_vin")]
    pub vin_number: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub purchase_date: Option<Option<NaiveDate>>,

    #[validate(range(min = 0))]
    pub current_mileage: Option<i32>,

    #[serde(default)]
    #[validate(custom = "validate_image_paths")]
    pub uploaded_images: Vec<String>,
}

/// Filtros para búsqueda de vehículos
#[derive(Debug, Default, Deserialize)]
pub struct VehicleFilters {
    pub vehicle_type: Option<VehicleType>,
    pub make: Option<String>,
    pub year: Option<i32>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// Request para registrar una imagen
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleImageRequest {
    #[validate(length(min = 1, max = 500))]
    pub image: String,

    #[validate(length(max = 255))]
    pub caption: Option<String>,

    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Serialize)]
pub struct VehicleImageResponse {
    pub id: Uuid,
    pub image: String,
    pub image_url: String,
    pub caption: String,
    pub is_primary: bool,
    pub uploaded_at: DateTime<Utc>,
}

impl VehicleImageResponse {
    pub fn from_image(image: VehicleImage, media_base_url: Option<&str>) -> Self {
        Self {
            id: image.id,
            image_url: image.url(media_base_url),
            image: image.image_path,
            caption: image.caption,
            is_primary: image.is_primary,
            uploaded_at: image.uploaded_at,
        }
    }
}

// Response de vehículo con imágenes
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub make: String,
    pub model_name: String,
    pub registration_number: String,
    pub vehicle_type: VehicleType,
    pub year: Option<i32>,
    pub color: String,
    pub vin_number: String,
    pub purchase_date: Option<NaiveDate>,
    pub current_mileage: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub images: Vec<VehicleImageResponse>,
}

impl VehicleResponse {
    pub fn new(vehicle: Vehicle, images: Vec<VehicleImageResponse>) -> Self {
        Self {
            id: vehicle.id,
            user: vehicle.user_id,
            make: vehicle.make,
            model_name: vehicle.model_name,
            registration_number: vehicle.registration_number,
            vehicle_type: vehicle.vehicle_type,
            year: vehicle.year,
            color: vehicle.color,
            vin_number: vehicle.vin_number,
            purchase_date: vehicle.purchase_date,
            current_mileage: vehicle.current_mileage,
            created_at: vehicle.created_at,
            updated_at: vehicle.updated_at,
            images,
        }
    }
}

// Response de vehículo para listados
#[derive(Debug, Serialize)]
pub struct VehicleListItem {
    pub id: Uuid,
    pub make: String,
    pub model_name: String,
    pub registration_number: String,
    pub vehicle_type: VehicleType,
    pub year: Option<i32>,
    pub primary_image: Option<String>,
}

impl VehicleListItem {
    pub fn new(vehicle: Vehicle, primary_image: Option<String>) -> Self {
        Self {
            id: vehicle.id,
            make: vehicle.make,
            model_name: vehicle.model_name,
            registration_number: vehicle.registration_number,
            vehicle_type: vehicle.vehicle_type,
            year: vehicle.year,
            primary_image,
        }
    }
}
