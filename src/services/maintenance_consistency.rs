//! Consistencia de registros de mantenimiento
//!
//! Toda escritura de un `MaintenanceRecord` pasa por [`apply_record_write`],
//! que el orquestador llama dentro de su transacción justo antes del commit:
//!
//! 1. sube `vehicles.current_mileage` si el kilometraje del servicio es mayor
//!    (antes de persistir el registro),
//! 2. persiste el registro,
//! 3. sincroniza el recordatorio: upsert si hay `next_due_date`, borrado de
//!    todos los recordatorios del registro si no lo hay.
//!
//! Si cualquier paso falla el error se devuelve tal cual y el orquestador
//! descarta la transacción completa.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::maintenance::{reminder_note, MaintenanceRecord, MaintenanceStatus, Reminder};
use crate::models::Vehicle;
use crate::utils::errors::{validation_error, AppError};

/// Errores del motor de consistencia
#[derive(Error, Debug)]
pub enum ConsistencyError {
    #[error("mileage at service must be non-negative, got {0}")]
    InvalidMileage(i32),

    #[error("vehicle '{0}' does not exist")]
    VehicleUnresolved(Uuid),

    #[error("storage failure: {0}")]
    StorageFailure(#[from] sqlx::Error),
}

impl From<ConsistencyError> for AppError {
    fn from(e: ConsistencyError) -> Self {
        match e {
            ConsistencyError::InvalidMileage(_) => {
                validation_error("mileage_at_service", "Ensure this value is greater than or equal to 0.")
            }
            ConsistencyError::VehicleUnresolved(id) => {
                AppError::BadRequest(format!("Vehicle '{}' does not exist", id))
            }
            ConsistencyError::StorageFailure(e) => AppError::Database(e),
        }
    }
}

/// Campos escribibles de un registro de mantenimiento
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
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
}

impl RecordDraft {
    /// Borrador con los valores actuales de un registro existente
    pub fn from_record(record: &MaintenanceRecord) -> Self {
        Self {
            vehicle_id: record.vehicle_id,
            maintenance_type_id: record.maintenance_type_id,
            date_performed: record.date_performed,
            mileage_at_service: record.mileage_at_service,
            cost: record.cost,
            service_provider: record.service_provider.clone(),
            notes: record.notes.clone(),
            next_due_date: record.next_due_date,
            next_due_mileage: record.next_due_mileage,
            status: record.status,
        }
    }
}

/// Alta o actualización
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update(Uuid),
}

/// Qué le pasó al recordatorio del registro
#[derive(Debug, Clone)]
pub enum ReminderSync {
    Upserted(Reminder),
    Cleared { removed: u64 },
}

/// Resultado de una escritura ya consistente
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    pub record: MaintenanceRecord,
    pub vehicle_mileage: i32,
    pub mileage_raised: bool,
    pub reminder: ReminderSync,
}

/// Acceso a vehículos dentro de la transacción
#[async_trait]
pub trait VehicleStore: Send {
    /// Lectura del vehículo bloqueando su fila hasta el fin de la transacción
    async fn lock_vehicle(&mut self, vehicle_id: Uuid) -> Result<Option<Vehicle>, sqlx::Error>;

    /// `current_mileage = max(current_mileage, mileage)`; devuelve el valor resultante
    async fn raise_mileage(&mut self, vehicle_id: Uuid, mileage: i32) -> Result<i32, sqlx::Error>;
}

/// Acceso a registros dentro de la transacción
#[async_trait]
pub trait RecordStore: Send {
    async fn maintenance_type_name(&mut self, type_id: Uuid) -> Result<Option<String>, sqlx::Error>;

    async fn insert_record(&mut self, id: Uuid, draft: &RecordDraft) -> Result<MaintenanceRecord, sqlx::Error>;

    async fn update_record(&mut self, id: Uuid, draft: &RecordDraft) -> Result<MaintenanceRecord, sqlx::Error>;
}

/// Acceso a recordatorios dentro de la transacción
#[async_trait]
pub trait ReminderStore: Send {
    /// Crea o actualiza el recordatorio del registro; siempre queda `is_completed = false`
    async fn upsert_for_record(
        &mut self,
        record_id: Uuid,
        due_date: NaiveDate,
        notes: &str,
    ) -> Result<Reminder, sqlx::Error>;

    /// Borra todos los recordatorios del registro
    async fn delete_for_record(&mut self, record_id: Uuid) -> Result<u64, sqlx::Error>;
}

/// Aplica una escritura de registro manteniendo kilometraje y recordatorio consistentes.
///
/// No hace commit ni rollback: eso es responsabilidad de quien abrió la transacción.
pub async fn apply_record_write<S>(
    store: &mut S,
    mode: WriteMode,
    draft: &RecordDraft,
) -> Result<WriteOutcome, ConsistencyError>
where
    S: VehicleStore + RecordStore + ReminderStore + ?Sized,
{
    if draft.mileage_at_service < 0 {
        return Err(ConsistencyError::InvalidMileage(draft.mileage_at_service));
    }

    let vehicle = store
        .lock_vehicle(draft.vehicle_id)
        .await?
        .ok_or(ConsistencyError::VehicleUnresolved(draft.vehicle_id))?;

    // Paso 1: kilometraje, antes de persistir el registro
    let mileage_raised = draft.mileage_at_service > vehicle.current_mileage;
    let vehicle_mileage = if mileage_raised {
        let updated = store
            .raise_mileage(vehicle.id, draft.mileage_at_service)
            .await?;
        debug!(
            "Kilometraje de {} actualizado: {} -> {}",
            vehicle.id, vehicle.current_mileage, updated
        );
        updated
    } else {
        vehicle.current_mileage
    };

    let record = match mode {
        WriteMode::Create => store.insert_record(Uuid::new_v4(), draft).await?,
        WriteMode::Update(id) => store.update_record(id, draft).await?,
    };

    // Paso 2: recordatorio, con el registro ya persistido
    let reminder = match record.next_due_date {
        Some(due_date) => {
            let type_name = store
                .maintenance_type_name(record.maintenance_type_id)
                .await?
                .ok_or(ConsistencyError::StorageFailure(sqlx::Error::RowNotFound))?;
            let notes = reminder_note(&vehicle.to_string(), &type_name);
            let reminder = store.upsert_for_record(record.id, due_date, &notes).await?;
            ReminderSync::Upserted(reminder)
        }
        None => {
            let removed = store.delete_for_record(record.id).await?;
            if removed > 0 {
                debug!("{} recordatorio(s) eliminados del registro {}", removed, record.id);
            }
            ReminderSync::Cleared { removed }
        }
    };

    Ok(WriteOutcome {
        record,
        vehicle_mileage,
        mileage_raised,
        reminder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;

    use crate::models::VehicleType;

    /// Punto donde la tienda en memoria simula un fallo
    #[derive(Debug, Clone, Copy, PartialEq)]
    enum FailPoint {
        RecordWrite,
        ReminderSync,
    }

    #[derive(Debug, Clone, Default)]
    struct MemoryState {
        vehicles: HashMap<Uuid, Vehicle>,
        types: HashMap<Uuid, String>,
        records: HashMap<Uuid, MaintenanceRecord>,
        reminders: Vec<Reminder>,
    }

    impl MemoryState {
        fn reminders_for(&self, record_id: Uuid) -> Vec<&Reminder> {
            self.reminders
                .iter()
                .filter(|r| r.maintenance_record_id == record_id)
                .collect()
        }
    }

    /// Transacción en memoria: copia del estado que sólo se publica al hacer commit
    struct MemoryTx {
        state: MemoryState,
        fail_on: Option<FailPoint>,
    }

    impl MemoryTx {
        fn check(&self, point: FailPoint) -> Result<(), sqlx::Error> {
            if self.fail_on == Some(point) {
                return Err(sqlx::Error::Protocol(format!("injected failure at {:?}", point)));
            }
            Ok(())
        }

        fn materialize(&self, id: Uuid, draft: &RecordDraft, created_at: chrono::DateTime<Utc>) -> MaintenanceRecord {
            MaintenanceRecord {
                id,
                vehicle_id: draft.vehicle_id,
                maintenance_type_id: draft.maintenance_type_id,
                date_performed: draft.date_performed,
                mileage_at_service: draft.mileage_at_service,
                cost: draft.cost,
                service_provider: draft.service_provider.clone(),
                notes: draft.notes.clone(),
                next_due_date: draft.next_due_date,
                next_due_mileage: draft.next_due_mileage,
                status: draft.status,
                created_at,
                updated_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl VehicleStore for MemoryTx {
        async fn lock_vehicle(&mut self, vehicle_id: Uuid) -> Result<Option<Vehicle>, sqlx::Error> {
            Ok(self.state.vehicles.get(&vehicle_id).cloned())
        }

        async fn raise_mileage(&mut self, vehicle_id: Uuid, mileage: i32) -> Result<i32, sqlx::Error> {
            let vehicle = self
                .state
                .vehicles
                .get_mut(&vehicle_id)
                .ok_or(sqlx::Error::RowNotFound)?;
            vehicle.current_mileage = vehicle.current_mileage.max(mileage);
            Ok(vehicle.current_mileage)
        }
    }

    #[async_trait]
    impl RecordStore for MemoryTx {
        async fn maintenance_type_name(&mut self, type_id: Uuid) -> Result<Option<String>, sqlx::Error> {
            Ok(self.state.types.get(&type_id).cloned())
        }

        async fn insert_record(&mut self, id: Uuid, draft: &RecordDraft) -> Result<MaintenanceRecord, sqlx::Error> {
            self.check(FailPoint::RecordWrite)?;
            let record = self.materialize(id, draft, Utc::now());
            self.state.records.insert(id, record.clone());
            Ok(record)
        }

        async fn update_record(&mut self, id: Uuid, draft: &RecordDraft) -> Result<MaintenanceRecord, sqlx::Error> {
            self.check(FailPoint::RecordWrite)?;
            let created_at = self
                .state
                .records
                .get(&id)
                .map(|r| r.created_at)
                .ok_or(sqlx::Error::RowNotFound)?;
            let record = self.materialize(id, draft, created_at);
            self.state.records.insert(id, record.clone());
            Ok(record)
        }
    }

    #[async_trait]
    impl ReminderStore for MemoryTx {
        async fn upsert_for_record(
            &mut self,
            record_id: Uuid,
            due_date: NaiveDate,
            notes: &str,
        ) -> Result<Reminder, sqlx::Error> {
            self.check(FailPoint::ReminderSync)?;
            if let Some(existing) = self
                .state
                .reminders
                .iter_mut()
                .find(|r| r.maintenance_record_id == record_id)
            {
                existing.due_date = due_date;
                existing.is_completed = false;
                existing.notes = notes.to_string();
                existing.updated_at = Utc::now();
                return Ok(existing.clone());
            }
            let reminder = Reminder {
                id: Uuid::new_v4(),
                maintenance_record_id: record_id,
                due_date,
                is_completed: false,
                notes: notes.to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            self.state.reminders.push(reminder.clone());
            Ok(reminder)
        }

        async fn delete_for_record(&mut self, record_id: Uuid) -> Result<u64, sqlx::Error> {
            self.check(FailPoint::ReminderSync)?;
            let before = self.state.reminders.len();
            self.state
                .reminders
                .retain(|r| r.maintenance_record_id != record_id);
            Ok((before - self.state.reminders.len()) as u64)
        }
    }

    struct MemoryStore {
        committed: MemoryState,
        vehicle_id: Uuid,
        type_id: Uuid,
    }

    impl MemoryStore {
        fn with_vehicle(current_mileage: i32) -> Self {
            let vehicle = Vehicle {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                make: "Toyota".to_string(),
                model_name: "Corolla".to_string(),
                registration_number: "AB-123-CD".to_string(),
                vehicle_type: VehicleType::Car,
                year: Some(2019),
                color: String::new(),
                vin_number: String::new(),
                purchase_date: None,
                current_mileage,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            let type_id = Uuid::new_v4();
            let mut committed = MemoryState::default();
            let vehicle_id = vehicle.id;
            committed.vehicles.insert(vehicle.id, vehicle);
            committed.types.insert(type_id, "Oil change".to_string());
            Self {
                committed,
                vehicle_id,
                type_id,
            }
        }

        fn mileage(&self) -> i32 {
            self.committed.vehicles[&self.vehicle_id].current_mileage
        }

        fn draft(&self, mileage: i32, next_due_date: Option<NaiveDate>) -> RecordDraft {
            RecordDraft {
                vehicle_id: self.vehicle_id,
                maintenance_type_id: self.type_id,
                date_performed: date(2025, 1, 15),
                mileage_at_service: mileage,
                cost: Decimal::new(4999, 2),
                service_provider: "Garage Central".to_string(),
                notes: String::new(),
                next_due_date,
                next_due_mileage: None,
                status: MaintenanceStatus::Completed,
            }
        }

        /// Orquestador de prueba: transacción, motor y commit sólo si todo fue bien
        async fn write(
            &mut self,
            mode: WriteMode,
            draft: &RecordDraft,
            fail_on: Option<FailPoint>,
        ) -> Result<WriteOutcome, ConsistencyError> {
            let mut tx = MemoryTx {
                state: self.committed.clone(),
                fail_on,
            };
            let outcome = apply_record_write(&mut tx, mode, draft).await?;
            self.committed = tx.state;
            Ok(outcome)
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_higher_mileage_raises_vehicle_and_creates_reminder() {
        let mut store = MemoryStore::with_vehicle(10_000);
        let draft = store.draft(12_000, Some(date(2025, 6, 1)));

        let outcome = store.write(WriteMode::Create, &draft, None).await.unwrap();

        assert!(outcome.mileage_raised);
        assert_eq!(outcome.vehicle_mileage, 12_000);
        assert_eq!(store.mileage(), 12_000);

        let reminders = store.committed.reminders_for(outcome.record.id);
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].due_date, date(2025, 6, 1));
        assert!(!reminders[0].is_completed);
        assert_eq!(
            reminders[0].notes,
            "Upcoming maintenance for 2019 Toyota Corolla (AB-123-CD) - Oil change"
        );
    }

    #[tokio::test]
    async fn test_lower_mileage_without_due_date_changes_nothing() {
        let mut store = MemoryStore::with_vehicle(12_000);
        let draft = store.draft(9_000, None);

        let outcome = store.write(WriteMode::Create, &draft, None).await.unwrap();

        assert!(!outcome.mileage_raised);
        assert_eq!(store.mileage(), 12_000);
        assert!(store.committed.reminders_for(outcome.record.id).is_empty());
        assert!(matches!(outcome.reminder, ReminderSync::Cleared { removed: 0 }));
        assert!(store.committed.records.contains_key(&outcome.record.id));
    }

    #[tokio::test]
    async fn test_equal_mileage_is_not_a_raise() {
        let mut store = MemoryStore::with_vehicle(12_000);
        let draft = store.draft(12_000, None);

        let outcome = store.write(WriteMode::Create, &draft, None).await.unwrap();

        assert!(!outcome.mileage_raised);
        assert_eq!(store.mileage(), 12_000);
    }

    #[tokio::test]
    async fn test_mileage_is_running_maximum_in_any_order() {
        let mut forward = MemoryStore::with_vehicle(0);
        let low = forward.draft(5_000, None);
        let high = forward.draft(8_000, None);
        forward.write(WriteMode::Create, &low, None).await.unwrap();
        forward.write(WriteMode::Create, &high, None).await.unwrap();
        assert_eq!(forward.mileage(), 8_000);

        let mut backward = MemoryStore::with_vehicle(0);
        let low = backward.draft(5_000, None);
        let high = backward.draft(8_000, None);
        backward.write(WriteMode::Create, &high, None).await.unwrap();
        backward.write(WriteMode::Create, &low, None).await.unwrap();
        assert_eq!(backward.mileage(), 8_000);
    }

    #[tokio::test]
    async fn test_clearing_due_date_removes_reminder() {
        let mut store = MemoryStore::with_vehicle(10_000);
        let draft = store.draft(12_000, Some(date(2025, 6, 1)));
        let created = store.write(WriteMode::Create, &draft, None).await.unwrap();
        let record_id = created.record.id;

        let cleared = RecordDraft {
            next_due_date: None,
            ..draft
        };
        let outcome = store
            .write(WriteMode::Update(record_id), &cleared, None)
            .await
            .unwrap();

        assert!(matches!(outcome.reminder, ReminderSync::Cleared { removed: 1 }));
        assert!(store.committed.reminders_for(record_id).is_empty());
        assert_eq!(store.committed.records[&record_id].next_due_date, None);
        assert_eq!(store.mileage(), 12_000);
    }

    #[tokio::test]
    async fn test_resave_resets_completed_reminder_without_duplicating() {
        let mut store = MemoryStore::with_vehicle(0);
        let draft = store.draft(1_000, Some(date(2025, 6, 1)));
        let created = store.write(WriteMode::Create, &draft, None).await.unwrap();
        let record_id = created.record.id;
        let reminder_id = store.committed.reminders_for(record_id)[0].id;

        // El usuario marca el recordatorio como completado
        store
            .committed
            .reminders
            .iter_mut()
            .for_each(|r| r.is_completed = true);

        store
            .write(WriteMode::Update(record_id), &draft, None)
            .await
            .unwrap();

        let reminders = store.committed.reminders_for(record_id);
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].id, reminder_id);
        assert!(!reminders[0].is_completed);
    }

    #[tokio::test]
    async fn test_changing_due_date_moves_existing_reminder() {
        let mut store = MemoryStore::with_vehicle(0);
        let draft = store.draft(1_000, Some(date(2025, 6, 1)));
        let created = store.write(WriteMode::Create, &draft, None).await.unwrap();

        let moved = RecordDraft {
            next_due_date: Some(date(2025, 9, 1)),
            ..draft
        };
        store
            .write(WriteMode::Update(created.record.id), &moved, None)
            .await
            .unwrap();

        let reminders = store.committed.reminders_for(created.record.id);
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].due_date, date(2025, 9, 1));
    }

    #[tokio::test]
    async fn test_clearing_due_date_removes_every_duplicate() {
        let mut store = MemoryStore::with_vehicle(0);
        let draft = store.draft(1_000, Some(date(2025, 6, 1)));
        let created = store.write(WriteMode::Create, &draft, None).await.unwrap();
        let record_id = created.record.id;

        let mut duplicate = store.committed.reminders_for(record_id)[0].clone();
        duplicate.id = Uuid::new_v4();
        store.committed.reminders.push(duplicate);
        assert_eq!(store.committed.reminders_for(record_id).len(), 2);

        let cleared = RecordDraft {
            next_due_date: None,
            ..draft
        };
        let outcome = store
            .write(WriteMode::Update(record_id), &cleared, None)
            .await
            .unwrap();

        assert!(matches!(outcome.reminder, ReminderSync::Cleared { removed: 2 }));
        assert!(store.committed.reminders_for(record_id).is_empty());
    }

    #[tokio::test]
    async fn test_negative_mileage_rejected_before_any_mutation() {
        let mut store = MemoryStore::with_vehicle(10_000);
        let draft = store.draft(-1, Some(date(2025, 6, 1)));

        let err = store.write(WriteMode::Create, &draft, None).await.unwrap_err();

        assert!(matches!(err, ConsistencyError::InvalidMileage(-1)));
        assert!(store.committed.records.is_empty());
        assert!(store.committed.reminders.is_empty());
        assert_eq!(store.mileage(), 10_000);
    }

    #[tokio::test]
    async fn test_unknown_vehicle_is_unresolved() {
        let mut store = MemoryStore::with_vehicle(0);
        let mut draft = store.draft(100, None);
        let ghost = Uuid::new_v4();
        draft.vehicle_id = ghost;

        let err = store.write(WriteMode::Create, &draft, None).await.unwrap_err();

        assert!(matches!(err, ConsistencyError::VehicleUnresolved(id) if id == ghost));
        assert!(store.committed.records.is_empty());
    }

    #[tokio::test]
    async fn test_reminder_failure_rolls_back_mileage_and_record() {
        let mut store = MemoryStore::with_vehicle(10_000);
        let draft = store.draft(12_000, Some(date(2025, 6, 1)));

        let err = store
            .write(WriteMode::Create, &draft, Some(FailPoint::ReminderSync))
            .await
            .unwrap_err();

        assert!(matches!(err, ConsistencyError::StorageFailure(_)));
        assert_eq!(store.mileage(), 10_000);
        assert!(store.committed.records.is_empty());
        assert!(store.committed.reminders.is_empty());
    }

    #[tokio::test]
    async fn test_record_failure_rolls_back_mileage() {
        let mut store = MemoryStore::with_vehicle(10_000);
        let draft = store.draft(15_000, None);

        let err = store
            .write(WriteMode::Create, &draft, Some(FailPoint::RecordWrite))
            .await
            .unwrap_err();

        assert!(matches!(err, ConsistencyError::StorageFailure(_)));
        assert_eq!(store.mileage(), 10_000);
    }

    #[test]
    fn test_consistency_errors_map_to_http_errors() {
        use axum::http::StatusCode;
        use axum::response::IntoResponse;

        let status = |e: ConsistencyError| AppError::from(e).into_response().status();
        assert_eq!(status(ConsistencyError::InvalidMileage(-5)), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(ConsistencyError::VehicleUnresolved(Uuid::new_v4())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(ConsistencyError::StorageFailure(sqlx::Error::RowNotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
