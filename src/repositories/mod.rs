//! Repositorios
//!
//! Acceso a PostgreSQL por recurso. `record_writer` implementa las tiendas
//! del motor de consistencia sobre una transacción abierta.

pub mod maintenance_record_repository;
pub mod maintenance_type_repository;
pub mod record_writer;
pub mod reminder_repository;
pub mod token_repository;
pub mod user_repository;
pub mod vehicle_repository;
