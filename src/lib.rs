//! Backend de seguimiento de mantenimiento de vehículos
//!
//! API REST (axum + sqlx) para usuarios, vehículos, registros de
//! mantenimiento y recordatorios. El núcleo es el motor de consistencia de
//! `services::maintenance_consistency`.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
