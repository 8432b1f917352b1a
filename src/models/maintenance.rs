//! Modelos de mantenimiento
//!
//! Tipos de mantenimiento, registros de servicio y recordatorios.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado de un registro - mapea al ENUM maintenance_status.
/// No hay reglas de transición: cualquier estado puede seguir a cualquier otro.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "maintenance_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Pending,
    InProgress,
    #[default]
    Completed,
    Cancelled,
}

/// Tipo de mantenimiento (cambio de aceite, frenos...)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MaintenanceType {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub recommended_interval_km: Option<i32>,
    pub recommended_interval_months: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registro de mantenimiento realizado sobre un vehículo
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MaintenanceRecord {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub maintenance_type_id: Uuid,
    pub date_performed: NaiveDate,
    pub mileage_at_service: i32,
    pub cost: Decimal,
    pub service_provider: String,
    pub notes: String,
    pub next_due_date: Option<NaiveDate>,
    pub next_due_mileage: Option<i32>,
    pub status: MaintenanceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Recordatorio derivado de `next_due_date` de un registro
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reminder {
    pub id: Uuid,
    pub maintenance_record_id: Uuid,
    pub due_date: NaiveDate,
    pub is_completed: bool,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Etiqueta legible de un registro: "{tipo} - {vehículo} ({fecha})"
pub fn record_label(type_name: &str, vehicle_label: &str, date_performed: NaiveDate) -> String {
    format!("{} - {} ({})", type_name, vehicle_label, date_performed)
}

/// Nota del recordatorio generado para un registro
pub fn reminder_note(vehicle_label: &str, type_name: &str) -> String {
    format!("Upcoming maintenance for {} - {}", vehicle_label, type_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&MaintenanceStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(MaintenanceStatus::default(), MaintenanceStatus::Completed);
    }

    #[test]
    fn test_labels() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(
            record_label("Oil change", "2019 Toyota Corolla (AB-123-CD)", date),
            "Oil change - 2019 Toyota Corolla (AB-123-CD) (2025-06-01)"
        );
        assert_eq!(
            reminder_note("2019 Toyota Corolla (AB-123-CD)", "Oil change"),
            "Upcoming maintenance for 2019 Toyota Corolla (AB-123-CD) - Oil change"
        );
    }
}
