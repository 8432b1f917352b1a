//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación y normalización
//! de datos de entrada.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

use crate::utils::errors::{AppError, AppResult};

lazy_static! {
    /// VIN de 17 caracteres, sin I, O ni Q
    static ref VIN_REGEX: Regex = Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").unwrap();
}

/// Longitud mínima de contraseña
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Normalizar email: el dominio se guarda en minúsculas
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Normalizar VIN: mayúsculas y sin espacios
pub fn normalize_vin(vin: &str) -> String {
    vin.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Validar VIN (después de normalizar). Vacío se acepta: el campo es opcional.
pub fn validate_vin(value: &str) -> Result<(), ValidationError> {
    let vin = normalize_vin(value);
    if vin.is_empty() || VIN_REGEX.is_match(&vin) {
        return Ok(());
    }
    let mut error = ValidationError::new("vin");
    error.message = Some("VIN must be 17 characters without I, O or Q".into());
    error.add_param("value".into(), &value.to_string());
    Err(error)
}

/// Longitud máxima de la ruta de una imagen (columna `image_path`)
pub const MAX_IMAGE_PATH_LENGTH: usize = 500;

/// Validar rutas de imágenes ya almacenadas: ninguna vacía ni más larga que la columna
pub fn validate_image_paths(paths: &[String]) -> Result<(), ValidationError> {
    for path in paths {
        let length = path.trim().chars().count();
        if length == 0 || length > MAX_IMAGE_PATH_LENGTH {
            let mut error = ValidationError::new("image_path");
            error.message = Some("Each image path must have between 1 and 500 characters.".into());
            error.add_param("max".into(), &MAX_IMAGE_PATH_LENGTH);
            return Err(error);
        }
    }
    Ok(())
}

/// Validar la fortaleza de una contraseña nueva
pub fn validate_password_strength(password: &str, email: Option<&str>) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        let mut error = ValidationError::new("password_too_short");
        error.message = Some("This password is too short. It must contain at least 8 characters.".into());
        error.add_param("min".into(), &MIN_PASSWORD_LENGTH);
        return Err(error);
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        let mut error = ValidationError::new("password_entirely_numeric");
        error.message = Some("This password is entirely numeric.".into());
        return Err(error);
    }

    if let Some(local) = email.and_then(|e| e.split('@').next()) {
        if !local.is_empty() && password.eq_ignore_ascii_case(local) {
            let mut error = ValidationError::new("password_too_similar");
            error.message = Some("The password is too similar to the email address.".into());
            return Err(error);
        }
    }

    Ok(())
}

/// Traducir un parámetro `ordering` (`campo` o `-campo`) a una cláusula SQL.
///
/// `allowed` mapea el nombre público del campo a la columna SQL.
pub fn resolve_ordering(
    raw: Option<&str>,
    allowed: &[(&str, &str)],
    default: &str,
) -> AppResult<String> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(default);
    let (descending, field) = match raw.strip_prefix('-') {
        Some(field) => (true, field),
        None => (false, raw),
    };

    let column = allowed
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, column)| *column)
        .ok_or_else(|| AppError::BadRequest(format!("Cannot order by '{}'", field)))?;

    Ok(format!("{} {}", column, if descending { "DESC" } else { "ASC" }))
}

/// Normalizar limit/offset de paginación
pub fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(50).clamp(1, 100);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_lowercases_domain_only() {
        assert_eq!(normalize_email(" John.Doe@Example.COM "), "John.Doe@example.com");
        assert_eq!(normalize_email("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn test_vin_normalization_and_validation() {
        assert_eq!(normalize_vin("1hgcm 82633a 004352"), "1HGCM82633A004352");
        assert!(validate_vin("1hgcm 82633a 004352").is_ok());
        assert!(validate_vin("").is_ok());
        // Contiene una O
        assert!(validate_vin("1HGCM82633O004352").is_err());
        assert!(validate_vin("SHORT").is_err());
    }

    #[test]
    fn test_image_paths_bounded() {
        assert!(validate_image_paths(&[]).is_ok());
        assert!(validate_image_paths(&["vehicles/front.jpg".to_string()]).is_ok());
        assert!(validate_image_paths(&["a".repeat(500)]).is_ok());
        assert!(validate_image_paths(&["ok.jpg".to_string(), "p".repeat(600)]).is_err());
        assert!(validate_image_paths(&["   ".to_string()]).is_err());
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("short", None).is_err());
        assert!(validate_password_strength("1234567890", None).is_err());
        assert!(validate_password_strength("janedoe123", Some("janedoe123@example.com")).is_err());
        assert!(validate_password_strength("correct-horse", Some("jane@example.com")).is_ok());
    }

    #[test]
    fn test_resolve_ordering() {
        let allowed = [("year", "v.year"), ("created_at", "v.created_at")];
        assert_eq!(
            resolve_ordering(None, &allowed, "-created_at").unwrap(),
            "v.created_at DESC"
        );
        assert_eq!(resolve_ordering(Some("year"), &allowed, "-created_at").unwrap(), "v.year ASC");
        assert!(resolve_ordering(Some("password"), &allowed, "year").is_err());
    }

    #[test]
    fn test_page_bounds() {
        assert_eq!(page_bounds(None, None), (50, 0));
        assert_eq!(page_bounds(Some(1000), Some(-5)), (100, 0));
        assert_eq!(page_bounds(Some(0), Some(20)), (1, 20));
    }
}
