use chrono::{NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::maintenance::record_label;
use crate::models::vehicle::vehicle_label;
use crate::models::Reminder;
use crate::utils::errors::{conflict_on_unique, AppError};

const REMINDER_LABEL_SELECT: &str = r#"
    SELECT rem.id, rem.due_date, rem.is_completed, rem.notes,
           mt.name AS type_name, r.date_performed,
           v.year, v.make, v.model_name, v.registration_number
    FROM reminders rem
    JOIN maintenance_records r ON r.id = rem.maintenance_record_id
    JOIN maintenance_types mt ON mt.id = r.maintenance_type_id
    JOIN vehicles v ON v.id = r.vehicle_id
"#;

/// Fila de listado: recordatorio más los datos para etiquetar su registro
#[derive(Debug, FromRow)]
pub struct ReminderLabelRow {
    pub id: Uuid,
    pub due_date: NaiveDate,
    pub is_completed: bool,
    pub notes: String,
    pub type_name: String,
    pub date_performed: NaiveDate,
    pub year: Option<i32>,
    pub make: String,
    pub model_name: String,
    pub registration_number: String,
}

impl ReminderLabelRow {
    pub fn record_label(&self) -> String {
        let vehicle = vehicle_label(self.year, &self.make, &self.model_name, &self.registration_number);
        record_label(&self.type_name, &vehicle, self.date_performed)
    }
}

pub struct ReminderRepository {
    pool: PgPool,
}

impl ReminderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Recordatorio cuyo registro pertenece a un vehículo del usuario
    pub async fn find_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Reminder>, AppError> {
        let reminder = sqlx::query_as::<_, Reminder>(
            r#"
            SELECT rem.* FROM reminders rem
            JOIN maintenance_records r ON r.id = rem.maintenance_record_id
            JOIN vehicles v ON v.id = r.vehicle_id
            WHERE rem.id = $1 AND v.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reminder)
    }

    pub async fn find_for_record(&self, record_id: Uuid) -> Result<Vec<Reminder>, AppError> {
        let reminders = sqlx::query_as::<_, Reminder>(
            "SELECT * FROM reminders WHERE maintenance_record_id = $1 ORDER BY due_date",
        )
        .bind(record_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reminders)
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        is_completed: Option<bool>,
        order_by: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ReminderLabelRow>, i64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new(
            r#"
            SELECT COUNT(*) FROM reminders rem
            JOIN maintenance_records r ON r.id = rem.maintenance_record_id
            JOIN vehicles v ON v.id = r.vehicle_id
            "#,
        );
        push_filters(&mut count, user_id, is_completed);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut builder = QueryBuilder::<Postgres>::new(REMINDER_LABEL_SELECT);
        push_filters(&mut builder, user_id, is_completed);
        builder.push(" ORDER BY ").push(order_by).push(", rem.id");
        builder.push(" LIMIT ").push_bind(limit);
        builder.push(" OFFSET ").push_bind(offset);

        let rows = builder
            .build_query_as::<ReminderLabelRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Pendientes con fecha a partir de `today`, en orden ascendente
    pub async fn upcoming(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ReminderLabelRow>, i64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new(
            r#"
            SELECT COUNT(*) FROM reminders rem
            JOIN maintenance_records r ON r.id = rem.maintenance_record_id
            JOIN vehicles v ON v.id = r.vehicle_id
            "#,
        );
        push_filters(&mut count, user_id, Some(false));
        count.push(" AND rem.due_date >= ").push_bind(today);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut builder = QueryBuilder::<Postgres>::new(REMINDER_LABEL_SELECT);
        push_filters(&mut builder, user_id, Some(false));
        builder.push(" AND rem.due_date >= ").push_bind(today);
        builder.push(" ORDER BY rem.due_date ASC, rem.id");
        builder.push(" LIMIT ").push_bind(limit);
        builder.push(" OFFSET ").push_bind(offset);

        let rows = builder
            .build_query_as::<ReminderLabelRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Alta manual; un segundo recordatorio para el mismo registro es un 409
    pub async fn create_for_record(
        &self,
        record_id: Uuid,
        due_date: NaiveDate,
        is_completed: bool,
        notes: &str,
    ) -> Result<Reminder, AppError> {
        sqlx::query_as::<_, Reminder>(
            r#"
            INSERT INTO reminders (id, maintenance_record_id, due_date, is_completed, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record_id)
        .bind(due_date)
        .bind(is_completed)
        .bind(notes)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "This maintenance record already has a reminder."))
    }

    pub async fn update(&self, reminder: &Reminder) -> Result<Reminder, AppError> {
        sqlx::query_as::<_, Reminder>(
            r#"
            UPDATE reminders
            SET due_date = $2, is_completed = $3, notes = $4, updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(reminder.id)
        .bind(reminder.due_date)
        .bind(reminder.is_completed)
        .bind(&reminder.notes)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Reminder not found".to_string()))
    }

    pub async fn set_completed(&self, id: Uuid, is_completed: bool) -> Result<(), AppError> {
        sqlx::query("UPDATE reminders SET is_completed = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(is_completed)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM reminders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, is_completed: Option<bool>) {
    builder.push(" WHERE v.user_id = ").push_bind(user_id);

    if let Some(is_completed) = is_completed {
        builder.push(" AND rem.is_completed = ").push_bind(is_completed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: Option<i32>) -> ReminderLabelRow {
        ReminderLabelRow {
            id: Uuid::new_v4(),
            due_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            is_completed: false,
            notes: String::new(),
            type_name: "Oil Change".to_string(),
            date_performed: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            year,
            make: "Toyota".to_string(),
            model_name: "Corolla".to_string(),
            registration_number: "ABC-123".to_string(),
        }
    }

    #[test]
    fn test_record_label_matches_vehicle_display() {
        assert_eq!(
            row(Some(2018)).record_label(),
            "Oil Change - 2018 Toyota Corolla (ABC-123) (2024-09-01)"
        );
        assert_eq!(row(None).record_label(), "Oil Change - Toyota Corolla (ABC-123) (2024-09-01)");
    }
}
