use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::vehicle_dto::VehicleFilters;
use crate::models::{Vehicle, VehicleImage, VehicleType};
use crate::utils::errors::{conflict_on_unique, AppError};

const DUPLICATE_REGISTRATION: &str = "Vehicle with this registration number already exists.";

/// Campos de un vehículo nuevo, ya normalizados
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub make: String,
    pub model_name: String,
    pub registration_number: String,
    pub vehicle_type: VehicleType,
    pub year: Option<i32>,
    pub color: String,
    pub vin_number: String,
    pub purchase_date: Option<NaiveDate>,
    pub current_mileage: i32,
}

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserta el vehículo y sus imágenes en una sola transacción
    pub async fn create(
        &self,
        user_id: Uuid,
        vehicle: &NewVehicle,
        image_paths: &[String],
    ) -> Result<Vehicle, AppError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (
                id, user_id, make, model_name, registration_number, vehicle_type, year,
                color, vin_number, purchase_date, current_mileage, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&vehicle.make)
        .bind(&vehicle.model_name)
        .bind(&vehicle.registration_number)
        .bind(vehicle.vehicle_type)
        .bind(vehicle.year)
        .bind(&vehicle.color)
        .bind(&vehicle.vin_number)
        .bind(vehicle.purchase_date)
        .bind(vehicle.current_mileage)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_REGISTRATION))?;

        for path in image_paths {
            insert_image(&mut tx, created.id, path, "", false).await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Vehículo del usuario; `None` si no existe o es de otro
    pub async fn find_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Vehicle>, AppError> {
        let vehicle =
            sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(vehicle)
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(vehicles.into_iter().map(|v| (v.id, v)).collect())
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        filters: &VehicleFilters,
        order_by: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Vehicle>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT v.* FROM vehicles v");
        push_filters(&mut builder, user_id, filters);
        builder.push(" ORDER BY ").push(order_by).push(", v.id");
        builder.push(" LIMIT ").push_bind(limit);
        builder.push(" OFFSET ").push_bind(offset);

        let vehicles = builder
            .build_query_as::<Vehicle>()
            .fetch_all(&self.pool)
            .await?;

        Ok(vehicles)
    }

    pub async fn count(&self, user_id: Uuid, filters: &VehicleFilters) -> Result<i64, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM vehicles v");
        push_filters(&mut builder, user_id, filters);

        let (count,): (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Guarda el vehículo completo y añade imágenes, todo o nada; el kilometraje nunca baja
    pub async fn update(&self, vehicle: &Vehicle, image_paths: &[String]) -> Result<Vehicle, AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET make = $2, model_name = $3, registration_number = $4, vehicle_type = $5,
                year = $6, color = $7, vin_number = $8, purchase_date = $9,
                current_mileage = GREATEST(current_mileage, $10), updated_at = $11
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.make)
        .bind(&vehicle.model_name)
        .bind(&vehicle.registration_number)
        .bind(vehicle.vehicle_type)
        .bind(vehicle.year)
        .bind(&vehicle.color)
        .bind(&vehicle.vin_number)
        .bind(vehicle.purchase_date)
        .bind(vehicle.current_mileage)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_REGISTRATION))?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        for path in image_paths {
            insert_image(&mut tx, updated.id, path, "", false).await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Imágenes
    // -----------------------------------------------------------------------

    pub async fn list_images(&self, vehicle_id: Uuid) -> Result<Vec<VehicleImage>, AppError> {
        let images = sqlx::query_as::<_, VehicleImage>(
            "SELECT * FROM vehicle_images WHERE vehicle_id = $1 ORDER BY is_primary DESC, uploaded_at",
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    /// Ruta de la imagen principal de cada vehículo
    pub async fn primary_images_for(&self, vehicle_ids: &[Uuid]) -> Result<HashMap<Uuid, String>, AppError> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT vehicle_id, image_path FROM vehicle_images WHERE vehicle_id = ANY($1) AND is_primary",
        )
        .bind(vehicle_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Añade una imagen; si es principal, desmarca las demás en la misma transacción
    pub async fn add_image(
        &self,
        vehicle_id: Uuid,
        image_path: &str,
        caption: &str,
        is_primary: bool,
    ) -> Result<VehicleImage, AppError> {
        let mut tx = self.pool.begin().await?;

        if is_primary {
            sqlx::query("UPDATE vehicle_images SET is_primary = FALSE WHERE vehicle_id = $1 AND is_primary")
                .bind(vehicle_id)
                .execute(&mut *tx)
                .await?;
        }

        let image = insert_image(&mut tx, vehicle_id, image_path, caption, is_primary).await?;

        tx.commit().await?;
        Ok(image)
    }

    /// Marca una imagen como principal; `None` si la imagen no es del vehículo
    pub async fn set_primary_image(
        &self,
        vehicle_id: Uuid,
        image_id: Uuid,
    ) -> Result<Option<VehicleImage>, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE vehicle_images SET is_primary = FALSE WHERE vehicle_id = $1 AND id <> $2 AND is_primary")
            .bind(vehicle_id)
            .bind(image_id)
            .execute(&mut *tx)
            .await?;

        let image = sqlx::query_as::<_, VehicleImage>(
            "UPDATE vehicle_images SET is_primary = TRUE WHERE id = $1 AND vehicle_id = $2 RETURNING *",
        )
        .bind(image_id)
        .bind(vehicle_id)
        .fetch_optional(&mut *tx)
        .await?;

        // Sin imagen no se toca nada
        if image.is_some() {
            tx.commit().await?;
        }
        Ok(image)
    }

    pub async fn delete_image(&self, vehicle_id: Uuid, image_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM vehicle_images WHERE id = $1 AND vehicle_id = $2")
            .bind(image_id)
            .bind(vehicle_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

async fn insert_image(
    conn: &mut PgConnection,
    vehicle_id: Uuid,
    image_path: &str,
    caption: &str,
    is_primary: bool,
) -> Result<VehicleImage, sqlx::Error> {
    sqlx::query_as::<_, VehicleImage>(
        r#"
        INSERT INTO vehicle_images (id, vehicle_id, image_path, caption, is_primary, uploaded_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(vehicle_id)
    .bind(image_path.trim())
    .bind(caption)
    .bind(is_primary)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, filters: &VehicleFilters) {
    builder.push(" WHERE v.user_id = ").push_bind(user_id);

    if let Some(vehicle_type) = filters.vehicle_type {
        builder.push(" AND v.vehicle_type = ").push_bind(vehicle_type);
    }
    if let Some(make) = filters.make.as_deref().filter(|s| !s.is_empty()) {
        builder.push(" AND v.make = ").push_bind(make.to_string());
    }
    if let Some(year) = filters.year {
        builder.push(" AND v.year = ").push_bind(year);
    }
    if let Some(search) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (v.make ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR v.model_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR v.registration_number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR v.vin_number ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
