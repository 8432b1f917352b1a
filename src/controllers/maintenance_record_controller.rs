use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::common_dto::{ApiResponse, Paginated};
use crate::dto::maintenance_dto::{
    CreateMaintenanceRecordRequest, CreateReminderRequest, MaintenanceRecordFilters,
    MaintenanceRecordListItem, MaintenanceRecordResponse, UpdateMaintenanceRecordRequest,
};
use crate::models::{MaintenanceRecord, MaintenanceType, Reminder};
use crate::repositories::maintenance_record_repository::MaintenanceRecordRepository;
use crate::repositories::maintenance_type_repository::MaintenanceTypeRepository;
use crate::repositories::record_writer::PgRecordWriter;
use crate::repositories::reminder_repository::ReminderRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::maintenance_consistency::{
    apply_record_write, RecordDraft, ReminderSync, WriteMode, WriteOutcome,
};
use crate::state::AppState;
use crate::utils::errors::{not_found_error, validation_error, AppError, AppResult};
use crate::utils::validation::{page_bounds, resolve_ordering};

const RECORD_ORDERING: &[(&str, &str)] = &[
    ("date_performed", "r.date_performed"),
    ("created_at", "r.created_at"),
    ("cost", "r.cost"),
];

/// NUMERIC(10, 2): como mucho 8 dígitos enteros
const MAX_COST_EXCLUSIVE: i64 = 100_000_000;

pub struct MaintenanceRecordController {
    pool: PgPool,
    records: MaintenanceRecordRepository,
    types: MaintenanceTypeRepository,
    reminders: ReminderRepository,
    vehicles: VehicleRepository,
    vehicle_views: VehicleController,
}

impl MaintenanceRecordController {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.pool.clone(),
            records: MaintenanceRecordRepository::new(state.pool.clone()),
            types: MaintenanceTypeRepository::new(state.pool.clone()),
            reminders: ReminderRepository::new(state.pool.clone()),
            vehicles: VehicleRepository::new(state.pool.clone()),
            vehicle_views: VehicleController::new(state),
        }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        request: CreateMaintenanceRecordRequest,
    ) -> Result<ApiResponse<MaintenanceRecordResponse>, AppError> {
        request.validate()?;

        let draft = RecordDraft {
            vehicle_id: request.vehicle_id,
            maintenance_type_id: request.maintenance_type_id,
            date_performed: request.date_performed,
            mileage_at_service: request.mileage_at_service,
            cost: validate_cost(request.cost.unwrap_or(Decimal::ZERO))?,
            service_provider: request.service_provider.unwrap_or_default(),
            notes: request.notes.unwrap_or_default(),
            next_due_date: request.next_due_date,
            next_due_mileage: request.next_due_mileage,
            status: request.status.unwrap_or_default(),
        };

        let outcome = self.write(user_id, WriteMode::Create, &draft).await?;
        info!("🛠️ Registro de mantenimiento creado: {}", outcome.record.id);

        let response = self.detail(outcome.record).await?;
        Ok(ApiResponse::success_with_message(
            response,
            "Maintenance record created successfully",
        ))
    }

    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        request: UpdateMaintenanceRecordRequest,
    ) -> Result<ApiResponse<MaintenanceRecordResponse>, AppError> {
        request.validate()?;

        let record = self.find_owned(id, user_id).await?;
        let mut draft = RecordDraft::from_record(&record);

        if let Some(vehicle_id) = request.vehicle_id {
            draft.vehicle_id = vehicle_id;
        }
        if let Some(type_id) = request.maintenance_type_id {
            draft.maintenance_type_id = type_id;
        }
        if let Some(date) = request.date_performed {
            draft.date_performed = date;
        }
        if let Some(mileage) = request.mileage_at_service {
            draft.mileage_at_service = mileage;
        }
        if let Some(cost) = request.cost {
            draft.cost = validate_cost(cost)?;
        }
        if let Some(provider) = request.service_provider {
            draft.service_provider = provider;
        }
        if let Some(notes) = request.notes {
            draft.notes = notes;
        }
        if let Some(next_due_date) = request.next_due_date {
            draft.next_due_date = next_due_date;
        }
        if let Some(next_due_mileage) = request.next_due_mileage {
            if matches!(next_due_mileage, Some(v) if v < 0) {
                return Err(validation_error(
                    "next_due_mileage",
                    "Ensure this value is greater than or equal to 0.",
                ));
            }
            draft.next_due_mileage = next_due_mileage;
        }
        if let Some(status) = request.status {
            draft.status = status;
        }

        let outcome = self.write(user_id, WriteMode::Update(record.id), &draft).await?;

        let response = self.detail(outcome.record).await?;
        Ok(ApiResponse::success_with_message(
            response,
            "Maintenance record updated successfully",
        ))
    }

    /// Escritura orquestada: una transacción, el motor justo antes del commit
    async fn write(&self, user_id: Uuid, mode: WriteMode, draft: &RecordDraft) -> AppResult<WriteOutcome> {
        // El vehículo tiene que ser del usuario
        if self.vehicles.find_owned(draft.vehicle_id, user_id).await?.is_none() {
            return Err(validation_error("vehicle_id", "Invalid vehicle."));
        }
        if self.types.find_by_id(draft.maintenance_type_id).await?.is_none() {
            return Err(validation_error("maintenance_type_id", "Invalid maintenance type."));
        }

        let mut tx = self.pool.begin().await?;
        let outcome = {
            let mut writer = PgRecordWriter::new(&mut *tx);
            apply_record_write(&mut writer, mode, draft).await?
        };
        tx.commit().await?;

        if outcome.mileage_raised {
            info!(
                "📈 Kilometraje del vehículo {} elevado a {}",
                draft.vehicle_id, outcome.vehicle_mileage
            );
        }
        if let ReminderSync::Upserted(reminder) = &outcome.reminder {
            info!("⏰ Recordatorio {} para el {}", reminder.id, reminder.due_date);
        }

        Ok(outcome)
    }

    pub async fn get_by_id(&self, id: Uuid, user_id: Uuid) -> Result<MaintenanceRecordResponse, AppError> {
        let record = self.find_owned(id, user_id).await?;
        self.detail(record).await
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        filters: MaintenanceRecordFilters,
    ) -> Result<Paginated<MaintenanceRecordListItem>, AppError> {
        let order_by = resolve_ordering(filters.ordering.as_deref(), RECORD_ORDERING, "-date_performed")?;
        let (limit, offset) = page_bounds(filters.limit, filters.offset);

        let (records, count) = self
            .records
            .list(user_id, &filters, &order_by, limit, offset)
            .await?;

        Ok(Paginated {
            count,
            limit,
            offset,
            results: self.list_items(records).await?,
        })
    }

    pub async fn upcoming(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Paginated<MaintenanceRecordListItem>, AppError> {
        let (limit, offset) = page_bounds(limit, offset);
        let today = Utc::now().date_naive();

        let (records, count) = self.records.upcoming(user_id, today, limit, offset).await?;

        Ok(Paginated {
            count,
            limit,
            offset,
            results: self.list_items(records).await?,
        })
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        if !self.records.delete(id, user_id).await? {
            return Err(not_found_error("Maintenance record", id));
        }

        info!("🗑️ Registro de mantenimiento eliminado: {}", id);
        Ok(())
    }

    /// Alta manual de recordatorio; 409 si el registro ya tiene uno
    pub async fn create_reminder(
        &self,
        id: Uuid,
        user_id: Uuid,
        request: CreateReminderRequest,
    ) -> Result<Reminder, AppError> {
        request.validate()?;

        let record = self.find_owned(id, user_id).await?;
        self.reminders
            .create_for_record(
                record.id,
                request.due_date,
                request.is_completed,
                request.notes.as_deref().unwrap_or_default(),
            )
            .await
    }

    async fn find_owned(&self, id: Uuid, user_id: Uuid) -> Result<MaintenanceRecord, AppError> {
        self.records
            .find_owned(id, user_id)
            .await?
            .ok_or_else(|| not_found_error("Maintenance record", id))
    }

    async fn detail(&self, record: MaintenanceRecord) -> Result<MaintenanceRecordResponse, AppError> {
        let vehicle = self
            .vehicles
            .find_by_ids(&[record.vehicle_id])
            .await?
            .remove(&record.vehicle_id)
            .ok_or_else(|| not_found_error("Vehicle", record.vehicle_id))?;
        let vehicle = self
            .vehicle_views
            .list_items(vec![vehicle])
            .await?
            .pop()
            .ok_or_else(|| not_found_error("Vehicle", record.vehicle_id))?;

        let maintenance_type = self
            .types
            .find_by_id(record.maintenance_type_id)
            .await?
            .ok_or_else(|| not_found_error("Maintenance type", record.maintenance_type_id))?;

        let reminders = self.reminders.find_for_record(record.id).await?;

        Ok(MaintenanceRecordResponse::new(record, vehicle, maintenance_type, reminders))
    }

    async fn list_items(&self, records: Vec<MaintenanceRecord>) -> Result<Vec<MaintenanceRecordListItem>, AppError> {
        let vehicle_ids: Vec<Uuid> = records.iter().map(|r| r.vehicle_id).collect();
        let type_ids: Vec<Uuid> = records.iter().map(|r| r.maintenance_type_id).collect();

        let vehicles = self.vehicles.find_by_ids(&vehicle_ids).await?;
        let types: HashMap<Uuid, MaintenanceType> = self
            .types
            .find_by_ids(&type_ids)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        records
            .into_iter()
            .map(|record| {
                let vehicle = vehicles
                    .get(&record.vehicle_id)
                    .map(|v| v.to_string())
                    .ok_or_else(|| not_found_error("Vehicle", record.vehicle_id))?;
                let maintenance_type = types
                    .get(&record.maintenance_type_id)
                    .cloned()
                    .ok_or_else(|| not_found_error("Maintenance type", record.maintenance_type_id))?;

                Ok(MaintenanceRecordListItem {
                    id: record.id,
                    vehicle,
                    maintenance_type,
                    date_performed: record.date_performed,
                    mileage_at_service: record.mileage_at_service,
                    cost: record.cost,
                    status: record.status,
                    next_due_date: record.next_due_date,
                })
            })
            .collect()
    }
}

/// Coste no negativo que cabe en NUMERIC(10, 2)
pub fn validate_cost(cost: Decimal) -> AppResult<Decimal> {
    if cost.is_sign_negative() && !cost.is_zero() {
        return Err(validation_error("cost", "Ensure this value is greater than or equal to 0."));
    }
    if cost.normalize().scale() > 2 {
        return Err(validation_error("cost", "Ensure that there are no more than 2 decimal places."));
    }
    if cost >= Decimal::from(MAX_COST_EXCLUSIVE) {
        return Err(validation_error("cost", "Ensure that there are no more than 10 digits in total."));
    }
    Ok(cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_cost() {
        assert!(validate_cost(Decimal::ZERO).is_ok());
        assert!(validate_cost(Decimal::from_str("49.90").unwrap()).is_ok());
        assert!(validate_cost(Decimal::from_str("12.500").unwrap()).is_ok());
        assert!(validate_cost(Decimal::from_str("99999999.99").unwrap()).is_ok());

        assert!(validate_cost(Decimal::from_str("-0.01").unwrap()).is_err());
        assert!(validate_cost(Decimal::from_str("1.999").unwrap()).is_err());
        assert!(validate_cost(Decimal::from_str("100000000").unwrap()).is_err());
    }
}
