//! Controllers
//!
//! Reglas de cada recurso entre las rutas y los repositorios.

pub mod auth_controller;
pub mod maintenance_record_controller;
pub mod maintenance_type_controller;
pub mod reminder_controller;
pub mod user_controller;
pub mod vehicle_controller;
