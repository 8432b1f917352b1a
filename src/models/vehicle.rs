//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle, sus imágenes y el enum de tipo.
//! Mapea exactamente al schema PostgreSQL con primary key 'id'.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use uuid::Uuid;

/// Tipo de vehículo - mapea al ENUM vehicle_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "vehicle_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    #[default]
    Car,
    Motorcycle,
    Truck,
    Suv,
    Van,
    Other,
}

/// Vehicle principal - mapea exactamente a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub user_id: Uuid,
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
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&vehicle_label(
            self.year,
            &self.make,
            &self.model_name,
            &self.registration_number,
        ))
    }
}

/// Etiqueta legible de un vehículo: `2019 Toyota Corolla (AB-123-CD)`
pub fn vehicle_label(year: Option<i32>, make: &str, model_name: &str, registration_number: &str) -> String {
    match year {
        Some(year) => format!("{} {} {} ({})", year, make, model_name, registration_number),
        None => format!("{} {} ({})", make, model_name, registration_number),
    }
}

/// Imagen asociada a un vehículo
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VehicleImage {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub image_path: String,
    pub caption: String,
    pub is_primary: bool,
    pub uploaded_at: DateTime<Utc>,
}

impl VehicleImage {
    /// URL pública de la imagen, relativa a la base de media si existe
    pub fn url(&self, media_base_url: Option<&str>) -> String {
        media_url(&self.image_path, media_base_url)
    }
}

/// URL pública de una ruta almacenada; las URLs absolutas se devuelven tal cual
pub fn media_url(path: &str, media_base_url: Option<&str>) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    match media_base_url {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/')),
        None => path.to_string(),
    }
}
