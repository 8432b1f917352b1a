use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::nullable;
use crate::dto::vehicle_dto::VehicleListItem;
use crate::models::{MaintenanceRecord, MaintenanceStatus, MaintenanceType, Reminder};

// ---------------------------------------------------------------------------
// Tipos de mantenimiento
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMaintenanceTypeRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    pub description: Option<String>,

    #[validate(range(min = 0))]
    pub recommended_interval_km: Option<i32>,

    #[validate(range(min = 0))]
    pub recommended_interval_months: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMaintenanceTypeRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub recommended_interval_km: Option<Option<i32>>,

    #[serde(default, deserialize_with = "nullable")]
    pub recommended_interval_months: Option<Option<i32>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MaintenanceTypeFilters {
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ---------------------------------------------------------------------------
// Registros de mantenimiento
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMaintenanceRecordRequest {
    pub vehicle_id: Uuid,

    pub maintenance_type_id: Uuid,

    pub date_performed: NaiveDate,

    pub mileage_at_service: i32,

    pub cost: Option<Decimal>,

    #[validate(length(max = 200))]
    pub service_provider: Option<String>,

    pub notes: Option<String>,

    pub next_due_date: Option<NaiveDate>,

    #[validate(range(min = 0))]
    pub next_due_mileage: Option<i32>,

    pub status: Option<MaintenanceStatus>,
}

// PUT y PATCH son parciales; null en next_due_* limpia el valor
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMaintenanceRecordRequest {
    pub vehicle_id: Option<Uuid>,

    pub maintenance_type_id: Option<Uuid>,

    pub date_performed: Option<NaiveDate>,

    pub mileage_at_service: Option<i32>,

    pub cost: Option<Decimal>,

    #[validate(length(max = 200))]
    pub service_provider: Option<String>,

    pub notes: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub next_due_date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "nullable")]
    pub next_due_mileage: Option<Option<i32>>,

    pub status: Option<MaintenanceStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MaintenanceRecordFilters {
    pub vehicle: Option<Uuid>,
    pub maintenance_type: Option<Uuid>,
    pub status: Option<MaintenanceStatus>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// Registro en listados
#[derive(Debug, Serialize)]
pub struct MaintenanceRecordListItem {
    pub id: Uuid,
    pub vehicle: String,
    pub maintenance_type: MaintenanceType,
    pub date_performed: NaiveDate,
    pub mileage_at_service: i32,
    pub cost: Decimal,
    pub status: MaintenanceStatus,
    pub next_due_date: Option<NaiveDate>,
}

// Registro completo con vehículo, tipo y recordatorios
#[derive(Debug, Serialize)]
pub struct MaintenanceRecordResponse {
    pub id: Uuid,
    pub vehicle: VehicleListItem,
    pub maintenance_type: MaintenanceType,
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
    pub reminders: Vec<Reminder>,
}

impl MaintenanceRecordResponse {
    pub fn new(
        record: MaintenanceRecord,
        vehicle: VehicleListItem,
        maintenance_type: MaintenanceType,
        reminders: Vec<Reminder>,
    ) -> Self {
        Self {
            id: record.id,
            vehicle,
            maintenance_type,
            date_performed: record.date_performed,
            mileage_at_service: record.mileage_at_service,
            cost: record.cost,
            service_provider: record.service_provider,
            notes: record.notes,
            next_due_date: record.next_due_date,
            next_due_mileage: record.next_due_mileage,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
            reminders,
        }
    }
}

// ---------------------------------------------------------------------------
// Recordatorios
// ---------------------------------------------------------------------------

// Creación manual de recordatorio para un registro
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReminderRequest {
    pub due_date: NaiveDate,
    #[serde(default)]
    pub is_completed: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateReminderRequest {
    pub due_date: Option<NaiveDate>,
    pub is_completed: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReminderFilters {
    pub is_completed: Option<bool>,
    pub ordering: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// Recordatorio en listados, con el registro como texto
#[derive(Debug, Serialize)]
pub struct ReminderListItem {
    pub id: Uuid,
    pub maintenance_record: String,
    pub due_date: NaiveDate,
    pub is_completed: bool,
    pub notes: String,
}
