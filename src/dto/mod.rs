//! DTOs de la API
//!
//! Requests y responses de cada recurso.

pub mod auth_dto;
pub mod common_dto;
pub mod maintenance_dto;
pub mod user_dto;
pub mod vehicle_dto;
