//! Tests del motor de consistencia contra PostgreSQL real.
//!
//! Necesitan `DATABASE_URL`; sin ella cada test termina sin hacer nada.
//! Cada test crea su propio schema, aplica `schema.sql` y lo borra al final.

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use uuid::Uuid;

use maintenance_tracker::models::{MaintenanceStatus, Reminder, VehicleType};
use maintenance_tracker::repositories::maintenance_type_repository::MaintenanceTypeRepository;
use maintenance_tracker::repositories::record_writer::PgRecordWriter;
use maintenance_tracker::repositories::reminder_repository::ReminderRepository;
use maintenance_tracker::repositories::token_repository::TokenRepository;
use maintenance_tracker::repositories::user_repository::UserRepository;
use maintenance_tracker::repositories::vehicle_repository::{NewVehicle, VehicleRepository};
use maintenance_tracker::services::maintenance_consistency::{
    apply_record_write, ConsistencyError, RecordDraft, ReminderSync, WriteMode, WriteOutcome,
};
use maintenance_tracker::utils::errors::AppError;

const SCHEMA_SQL: &str = include_str!("../schema.sql");

struct TestDb {
    pool: PgPool,
    schema: String,
}

impl TestDb {
    async fn connect() -> Option<Self> {
        let url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                println!("DATABASE_URL no definido, test omitido");
                return None;
            }
        };

        let schema = format!("mt_test_{}", Uuid::new_v4().simple());
        let admin = PgPoolOptions::new().max_connections(1).connect(&url).await.unwrap();
        admin
            .execute(format!("CREATE SCHEMA {}", schema).as_str())
            .await
            .unwrap();
        admin.close().await;

        let search_path = format!("SET search_path TO {}", schema);
        let pool = PgPoolOptions::new()
            .max_connections(16)
            .after_connect(move |conn, _meta| {
                let sql = search_path.clone();
                Box::pin(async move {
                    conn.execute(sql.as_str()).await?;
                    Ok(())
                })
            })
            .connect(&url)
            .await
            .unwrap();

        pool.execute(SCHEMA_SQL).await.unwrap();
        Some(Self { pool, schema })
    }

    async fn drop_schema(self) {
        let sql = format!("DROP SCHEMA {} CASCADE", self.schema);
        self.pool.execute(sql.as_str()).await.unwrap();
        self.pool.close().await;
    }
}

/// Usuario, vehículo a 10000 km y un tipo de mantenimiento
struct Fixture {
    user_id: Uuid,
    vehicle_id: Uuid,
    type_id: Uuid,
}

async fn seed(pool: &PgPool) -> Fixture {
    let user = UserRepository::new(pool.clone())
        .create("owner@example.com", "Jane", "Doe", "not-a-real-hash")
        .await
        .unwrap();

    let vehicle = VehicleRepository::new(pool.clone())
        .create(user.id, &new_vehicle("AB-123-CD", 10_000), &[])
        .await
        .unwrap();

    let maintenance_type = MaintenanceTypeRepository::new(pool.clone())
        .create("Oil change", "", Some(10_000), Some(12))
        .await
        .unwrap();

    Fixture {
        user_id: user.id,
        vehicle_id: vehicle.id,
        type_id: maintenance_type.id,
    }
}

fn new_vehicle(registration_number: &str, current_mileage: i32) -> NewVehicle {
    NewVehicle {
        make: "Toyota".to_string(),
        model_name: "Corolla".to_string(),
        registration_number: registration_number.to_string(),
        vehicle_type: VehicleType::Car,
        year: Some(2019),
        color: String::new(),
        vin_number: String::new(),
        purchase_date: None,
        current_mileage,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn draft(fixture: &Fixture, mileage: i32, next_due_date: Option<NaiveDate>) -> RecordDraft {
    RecordDraft {
        vehicle_id: fixture.vehicle_id,
        maintenance_type_id: fixture.type_id,
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

/// Igual que el orquestador: transacción, motor y commit
async fn write(pool: &PgPool, mode: WriteMode, draft: &RecordDraft) -> Result<WriteOutcome, ConsistencyError> {
    let mut tx = pool.begin().await?;
    let outcome = {
        let mut writer = PgRecordWriter::new(&mut *tx);
        apply_record_write(&mut writer, mode, draft).await?
    };
    tx.commit().await?;
    Ok(outcome)
}

async fn current_mileage(pool: &PgPool, vehicle_id: Uuid) -> i32 {
    let (mileage,): (i32,) = sqlx::query_as("SELECT current_mileage FROM vehicles WHERE id = $1")
        .bind(vehicle_id)
        .fetch_one(pool)
        .await
        .unwrap();
    mileage
}

async fn reminders_for(pool: &PgPool, record_id: Uuid) -> Vec<Reminder> {
    ReminderRepository::new(pool.clone())
        .find_for_record(record_id)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_mileage_and_reminder_lifecycle() {
    let Some(db) = TestDb::connect().await else { return };
    let fixture = seed(&db.pool).await;

    // Servicio a 12000 km con próxima fecha
    let first = write(&db.pool, WriteMode::Create, &draft(&fixture, 12_000, Some(date(2025, 6, 1))))
        .await
        .unwrap();
    assert!(first.mileage_raised);
    assert_eq!(current_mileage(&db.pool, fixture.vehicle_id).await, 12_000);

    let reminders = reminders_for(&db.pool, first.record.id).await;
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].due_date, date(2025, 6, 1));
    assert!(!reminders[0].is_completed);
    assert_eq!(reminders[0].maintenance_record_id, first.record.id);

    // Servicio más antiguo sin próxima fecha: el kilometraje no baja
    let second = write(&db.pool, WriteMode::Create, &draft(&fixture, 9_000, None))
        .await
        .unwrap();
    assert!(!second.mileage_raised);
    assert_eq!(current_mileage(&db.pool, fixture.vehicle_id).await, 12_000);
    assert!(reminders_for(&db.pool, second.record.id).await.is_empty());

    // Quitar la fecha del primero borra su recordatorio
    let cleared = draft(&fixture, 12_000, None);
    let updated = write(&db.pool, WriteMode::Update(first.record.id), &cleared)
        .await
        .unwrap();
    assert_eq!(updated.record.next_due_date, None);
    assert!(matches!(updated.reminder, ReminderSync::Cleared { removed: 1 }));
    assert!(reminders_for(&db.pool, first.record.id).await.is_empty());

    db.drop_schema().await;
}

#[tokio::test]
async fn test_resave_reopens_completed_reminder() {
    let Some(db) = TestDb::connect().await else { return };
    let fixture = seed(&db.pool).await;
    let reminders = ReminderRepository::new(db.pool.clone());

    let record_draft = draft(&fixture, 11_000, Some(date(2025, 9, 1)));
    let created = write(&db.pool, WriteMode::Create, &record_draft).await.unwrap();
    let original = reminders_for(&db.pool, created.record.id).await;
    assert_eq!(original.len(), 1);

    reminders.set_completed(original[0].id, true).await.unwrap();

    write(&db.pool, WriteMode::Update(created.record.id), &record_draft)
        .await
        .unwrap();

    let after = reminders_for(&db.pool, created.record.id).await;
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, original[0].id);
    assert!(!after[0].is_completed);
    assert_eq!(after[0].due_date, date(2025, 9, 1));

    db.drop_schema().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writes_keep_highest_mileage() {
    let Some(db) = TestDb::connect().await else { return };
    let fixture = seed(&db.pool).await;

    let mileages: Vec<i32> = (0..24).map(|i| 10_500 + (i * 7_919) % 30_000).collect();
    let expected = *mileages.iter().max().unwrap();

    let handles: Vec<_> = mileages
        .into_iter()
        .map(|mileage| {
            let pool = db.pool.clone();
            let record_draft = draft(&fixture, mileage, Some(date(2025, 6, 1)));
            tokio::spawn(async move { write(&pool, WriteMode::Create, &record_draft).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(current_mileage(&db.pool, fixture.vehicle_id).await, expected);

    db.drop_schema().await;
}

#[tokio::test]
async fn test_failed_record_write_rolls_back_mileage() {
    let Some(db) = TestDb::connect().await else { return };
    let fixture = seed(&db.pool).await;

    // service_provider excede VARCHAR(200): falla al persistir el registro
    let mut broken = draft(&fixture, 50_000, Some(date(2025, 6, 1)));
    broken.service_provider = "x".repeat(300);

    let result = write(&db.pool, WriteMode::Create, &broken).await;
    assert!(matches!(result, Err(ConsistencyError::StorageFailure(_))));
    assert_eq!(current_mileage(&db.pool, fixture.vehicle_id).await, 10_000);

    let (records,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM maintenance_records")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(records, 0);

    db.drop_schema().await;
}

#[tokio::test]
async fn test_second_manual_reminder_is_conflict() {
    let Some(db) = TestDb::connect().await else { return };
    let fixture = seed(&db.pool).await;
    let reminders = ReminderRepository::new(db.pool.clone());

    let created = write(&db.pool, WriteMode::Create, &draft(&fixture, 10_000, None))
        .await
        .unwrap();

    reminders
        .create_for_record(created.record.id, date(2025, 7, 1), false, "")
        .await
        .unwrap();
    let duplicate = reminders
        .create_for_record(created.record.id, date(2025, 8, 1), false, "")
        .await;

    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    assert_eq!(reminders_for(&db.pool, created.record.id).await.len(), 1);

    db.drop_schema().await;
}

#[tokio::test]
async fn test_vehicle_with_bad_image_is_not_persisted() {
    let Some(db) = TestDb::connect().await else { return };
    let fixture = seed(&db.pool).await;
    let vehicles = VehicleRepository::new(db.pool.clone());

    // La segunda ruta excede VARCHAR(500)
    let paths = vec!["ok.jpg".to_string(), "p".repeat(600)];
    let result = vehicles
        .create(fixture.user_id, &new_vehicle("ZZ-999-ZZ", 0), &paths)
        .await;
    assert!(matches!(result, Err(AppError::Database(_))));

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM vehicles WHERE registration_number = $1")
        .bind("ZZ-999-ZZ")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);

    let (images,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM vehicle_images")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(images, 0);

    db.drop_schema().await;
}

#[tokio::test]
async fn test_vehicle_update_with_bad_image_keeps_previous_state() {
    let Some(db) = TestDb::connect().await else { return };
    let fixture = seed(&db.pool).await;
    let vehicles = VehicleRepository::new(db.pool.clone());

    let mut vehicle = vehicles
        .find_owned(fixture.vehicle_id, fixture.user_id)
        .await
        .unwrap()
        .unwrap();
    vehicle.color = "red".to_string();

    let paths = vec!["ok.jpg".to_string(), "p".repeat(600)];
    assert!(vehicles.update(&vehicle, &paths).await.is_err());

    let stored = vehicles
        .find_owned(fixture.vehicle_id, fixture.user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.color, "");
    assert!(vehicles.list_images(fixture.vehicle_id).await.unwrap().is_empty());

    db.drop_schema().await;
}

#[tokio::test]
async fn test_logout_blacklist_roundtrip() {
    let Some(db) = TestDb::connect().await else { return };
    let fixture = seed(&db.pool).await;
    let tokens = TokenRepository::new(db.pool.clone());

    let live = Uuid::new_v4();
    let expired = Uuid::new_v4();
    tokens
        .blacklist(live, fixture.user_id, Utc::now() + Duration::days(7))
        .await
        .unwrap();
    tokens
        .blacklist(expired, fixture.user_id, Utc::now() - Duration::hours(1))
        .await
        .unwrap();

    assert!(tokens.is_blacklisted(live).await.unwrap());
    assert_eq!(tokens.purge_expired().await.unwrap(), 1);
    assert!(!tokens.is_blacklisted(expired).await.unwrap());
    assert!(tokens.is_blacklisted(live).await.unwrap());

    db.drop_schema().await;
}
