use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::maintenance_dto::MaintenanceRecordFilters;
use crate::models::MaintenanceRecord;
use crate::utils::errors::AppError;

/// Lecturas y borrado de registros. Las altas y modificaciones pasan por
/// `PgRecordWriter` dentro de una transacción.
pub struct MaintenanceRecordRepository {
    pool: PgPool,
}

impl MaintenanceRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registro cuyo vehículo pertenece al usuario
    pub async fn find_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<MaintenanceRecord>, AppError> {
        let record = sqlx::query_as::<_, MaintenanceRecord>(
            r#"
            SELECT r.* FROM maintenance_records r
            JOIN vehicles v ON v.id = r.vehicle_id
            WHERE r.id = $1 AND v.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        filters: &MaintenanceRecordFilters,
        order_by: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<MaintenanceRecord>, i64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM maintenance_records r JOIN vehicles v ON v.id = r.vehicle_id",
        );
        push_filters(&mut count, user_id, filters);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT r.* FROM maintenance_records r JOIN vehicles v ON v.id = r.vehicle_id",
        );
        push_filters(&mut builder, user_id, filters);
        builder.push(" ORDER BY ").push(order_by).push(", r.id");
        builder.push(" LIMIT ").push_bind(limit);
        builder.push(" OFFSET ").push_bind(offset);

        let records = builder
            .build_query_as::<MaintenanceRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok((records, total))
    }

    /// Registros con próxima fecha a partir de `today`, en orden ascendente
    pub async fn upcoming(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<MaintenanceRecord>, i64), AppError> {
        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM maintenance_records r
            JOIN vehicles v ON v.id = r.vehicle_id
            WHERE v.user_id = $1 AND r.next_due_date >= $2
            "#,
        )
        .bind(user_id)
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        let records = sqlx::query_as::<_, MaintenanceRecord>(
            r#"
            SELECT r.* FROM maintenance_records r
            JOIN vehicles v ON v.id = r.vehicle_id
            WHERE v.user_id = $1 AND r.next_due_date >= $2
            ORDER BY r.next_due_date ASC, r.id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(today)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((records, total))
    }

    /// Borra el registro; sus recordatorios caen por cascada
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM maintenance_records r
            USING vehicles v
            WHERE r.id = $1 AND v.id = r.vehicle_id AND v.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn push_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    user_id: Uuid,
    filters: &MaintenanceRecordFilters,
) {
    builder.push(" WHERE v.user_id = ").push_bind(user_id);

    if let Some(vehicle_id) = filters.vehicle {
        builder.push(" AND r.vehicle_id = ").push_bind(vehicle_id);
    }
    if let Some(type_id) = filters.maintenance_type {
        builder.push(" AND r.maintenance_type_id = ").push_bind(type_id);
    }
    if let Some(status) = filters.status {
        builder.push(" AND r.status = ").push_bind(status);
    }
    if let Some(search) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (r.notes ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR r.service_provider ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
