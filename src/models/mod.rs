//! Modelos de datos
//!
//! Structs que mapean las tablas de PostgreSQL.

pub mod maintenance;
pub mod user;
pub mod vehicle;

pub use maintenance::{MaintenanceRecord, MaintenanceStatus, MaintenanceType, Reminder};
pub use user::User;
pub use vehicle::{Vehicle, VehicleImage, VehicleType};
