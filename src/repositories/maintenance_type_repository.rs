use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::MaintenanceType;
use crate::utils::errors::{conflict_on_foreign_key, conflict_on_unique, AppError};

const DUPLICATE_NAME: &str = "Maintenance type with this name already exists.";

pub struct MaintenanceTypeRepository {
    pool: PgPool,
}

impl MaintenanceTypeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        name: &str,
        description: &str,
        recommended_interval_km: Option<i32>,
        recommended_interval_months: Option<i32>,
    ) -> Result<MaintenanceType, AppError> {
        sqlx::query_as::<_, MaintenanceType>(
            r#"
            INSERT INTO maintenance_types (id, name, description, recommended_interval_km, recommended_interval_months, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(recommended_interval_km)
        .bind(recommended_interval_months)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<MaintenanceType>, AppError> {
        let maintenance_type =
            sqlx::query_as::<_, MaintenanceType>("SELECT * FROM maintenance_types WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(maintenance_type)
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<MaintenanceType>, AppError> {
        let types = sqlx::query_as::<_, MaintenanceType>("SELECT * FROM maintenance_types WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(types)
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        order_by: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<MaintenanceType>, i64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM maintenance_types mt");
        push_search(&mut count, search);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut builder = QueryBuilder::<Postgres>::new("SELECT mt.* FROM maintenance_types mt");
        push_search(&mut builder, search);
        builder.push(" ORDER BY ").push(order_by);
        builder.push(" LIMIT ").push_bind(limit);
        builder.push(" OFFSET ").push_bind(offset);

        let types = builder
            .build_query_as::<MaintenanceType>()
            .fetch_all(&self.pool)
            .await?;

        Ok((types, total))
    }

    pub async fn update(&self, maintenance_type: &MaintenanceType) -> Result<MaintenanceType, AppError> {
        sqlx::query_as::<_, MaintenanceType>(
            r#"
            UPDATE maintenance_types
            SET name = $2, description = $3, recommended_interval_km = $4,
                recommended_interval_months = $5, updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(maintenance_type.id)
        .bind(&maintenance_type.name)
        .bind(&maintenance_type.description)
        .bind(maintenance_type.recommended_interval_km)
        .bind(maintenance_type.recommended_interval_months)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?
        .ok_or_else(|| AppError::NotFound("Maintenance type not found".to_string()))
    }

    /// Falla con 409 si hay registros que usan el tipo
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM maintenance_types WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                conflict_on_foreign_key(e, "Maintenance type is used by maintenance records.")
            })?;

        Ok(result.rows_affected() > 0)
    }
}

fn push_search(builder: &mut QueryBuilder<'_, Postgres>, search: Option<&str>) {
    if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        builder
            .push(" WHERE (mt.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR mt.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
