//! Implementación PostgreSQL de las tiendas del motor de consistencia
//!
//! Opera sobre la conexión de una transacción abierta por el orquestador;
//! nunca hace commit por su cuenta.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::{MaintenanceRecord, Reminder, Vehicle};
use crate::services::maintenance_consistency::{RecordDraft, RecordStore, ReminderStore, VehicleStore};

pub struct PgRecordWriter<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgRecordWriter<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl VehicleStore for PgRecordWriter<'_> {
    async fn lock_vehicle(&mut self, vehicle_id: Uuid) -> Result<Option<Vehicle>, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1 FOR UPDATE")
            .bind(vehicle_id)
            .fetch_optional(&mut *self.conn)
            .await
    }

    async fn raise_mileage(&mut self, vehicle_id: Uuid, mileage: i32) -> Result<i32, sqlx::Error> {
        // Sólo se toca current_mileage
        let (current,): (i32,) = sqlx::query_as(
            r#"
            UPDATE vehicles
            SET current_mileage = GREATEST(current_mileage, $2)
            WHERE id = $1
            RETURNING current_mileage
            "#,
        )
        .bind(vehicle_id)
        .bind(mileage)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(current)
    }
}

#[async_trait]
impl RecordStore for PgRecordWriter<'_> {
    async fn maintenance_type_name(&mut self, type_id: Uuid) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT name FROM maintenance_types WHERE id = $1")
            .bind(type_id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row.map(|(name,)| name))
    }

    async fn insert_record(&mut self, id: Uuid, draft: &RecordDraft) -> Result<MaintenanceRecord, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, MaintenanceRecord>(
            r#"
            INSERT INTO maintenance_records (
                id, vehicle_id, maintenance_type_id, date_performed, mileage_at_service,
                cost, service_provider, notes, next_due_date, next_due_mileage, status,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(draft.vehicle_id)
        .bind(draft.maintenance_type_id)
        .bind(draft.date_performed)
        .bind(draft.mileage_at_service)
        .bind(draft.cost)
        .bind(&draft.service_provider)
        .bind(&draft.notes)
        .bind(draft.next_due_date)
        .bind(draft.next_due_mileage)
        .bind(draft.status)
        .bind(now)
        .fetch_one(&mut *self.conn)
        .await
    }

    async fn update_record(&mut self, id: Uuid, draft: &RecordDraft) -> Result<MaintenanceRecord, sqlx::Error> {
        sqlx::query_as::<_, MaintenanceRecord>(
            r#"
            UPDATE maintenance_records
            SET vehicle_id = $2, maintenance_type_id = $3, date_performed = $4,
                mileage_at_service = $5, cost = $6, service_provider = $7, notes = $8,
                next_due_date = $9, next_due_mileage = $10, status = $11, updated_at = $12
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(draft.vehicle_id)
        .bind(draft.maintenance_type_id)
        .bind(draft.date_performed)
        .bind(draft.mileage_at_service)
        .bind(draft.cost)
        .bind(&draft.service_provider)
        .bind(&draft.notes)
        .bind(draft.next_due_date)
        .bind(draft.next_due_mileage)
        .bind(draft.status)
        .bind(Utc::now())
        .fetch_one(&mut *self.conn)
        .await
    }
}

#[async_trait]
impl ReminderStore for PgRecordWriter<'_> {
    async fn upsert_for_record(
        &mut self,
        record_id: Uuid,
        due_date: NaiveDate,
        notes: &str,
    ) -> Result<Reminder, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Reminder>(
            r#"
            INSERT INTO reminders (id, maintenance_record_id, due_date, is_completed, notes, created_at, updated_at)
            VALUES ($1, $2, $3, FALSE, $4, $5, $5)
            ON CONFLICT (maintenance_record_id) DO UPDATE
            SET due_date = EXCLUDED.due_date,
                is_completed = FALSE,
                notes = EXCLUDED.notes,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record_id)
        .bind(due_date)
        .bind(notes)
        .bind(now)
        .fetch_one(&mut *self.conn)
        .await
    }

    async fn delete_for_record(&mut self, record_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reminders WHERE maintenance_record_id = $1")
            .bind(record_id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected())
    }
}
