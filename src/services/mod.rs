//! Services module
//!
//! Lógica de negocio que no pertenece a un único repositorio: emisión de
//! tokens y el motor de consistencia de mantenimiento.

pub mod jwt_service;
pub mod maintenance_consistency;

pub use jwt_service::JwtService;
