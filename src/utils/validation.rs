//! Utilidades de validación
//!
//! Predicados puros sobre valores crudos (documento, licencia, placa,
//! fechas, números) y sus adaptadores para `#[validate(custom = "...")]`.
//! Los predicados nunca fallan: devuelven `false` ante cualquier entrada rara.

use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use validator::ValidationError;

lazy_static! {
    /// Formato antiguo: ABC1234
    static ref LEGACY_PLATE: Regex = Regex::new(r"^[A-Z]{3}\d{4}$").unwrap();
    /// Formato Mercosur: ABC1D23
    static ref MERCOSUR_PLATE: Regex = Regex::new(r"^[A-Z]{3}\d[A-Z]\d{2}$").unwrap();
}

/// Categorías de licencia aceptadas
pub const LICENSE_CATEGORIES: &[&str] = &["A", "B", "AB", "C", "D", "E", "AC", "AD", "AE"];

fn digits_only(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

/// Documento sin separadores (solo dígitos)
pub fn normalize_document(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Placa en mayúsculas, sin guiones ni espacios
pub fn normalize_plate(value: &str) -> String {
    value
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Dígito verificador de CPF sobre los primeros `len` dígitos
fn cpf_check_digit(digits: &[u32], len: usize) -> u32 {
    let weight_start = len as u32 + 1;
    let sum: u32 = digits[..len]
        .iter()
        .enumerate()
        .map(|(i, d)| d * (weight_start - i as u32))
        .sum();
    let rest = (sum * 10) % 11;
    if rest == 10 {
        0
    } else {
        rest
    }
}

/// Documento (CPF) con los dos dígitos verificadores correctos
pub fn is_valid_document(value: &str) -> bool {
    let digits = digits_only(value);
    if digits.len() != 11 || all_same(&digits) {
        return false;
    }
    cpf_check_digit(&digits, 9) == digits[9] && cpf_check_digit(&digits, 10) == digits[10]
}

/// Número de licencia: 11 dígitos, no todos iguales
pub fn is_valid_license_number(value: &str) -> bool {
    let digits = digits_only(value);
    digits.len() == 11 && !all_same(&digits)
}

pub fn is_valid_license_category(value: &str) -> bool {
    let upper = value.trim().to_uppercase();
    LICENSE_CATEGORIES.contains(&upper.as_str())
}

/// Placa en formato antiguo o Mercosur
pub fn is_valid_plate(value: &str) -> bool {
    let plate = normalize_plate(value);
    LEGACY_PLATE.is_match(&plate) || MERCOSUR_PLATE.is_match(&plate)
}

/// Acepta `YYYY-MM-DD` o RFC3339
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
}

pub fn is_valid_date(value: &str) -> bool {
    parse_date(value).is_some()
}

/// Fecha bien formada y estrictamente posterior a `today`
pub fn is_future_date(value: &str, today: NaiveDate) -> bool {
    parse_date(value).map_or(false, |date| date > today)
}

fn invalid(code: &'static str, value: impl Serialize) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.add_param("value".into(), &value);
    error
}

pub fn validate_document(value: &str) -> Result<(), ValidationError> {
    if is_valid_document(value) {
        Ok(())
    } else {
        Err(invalid("document", value))
    }
}

pub fn validate_license_number(value: &str) -> Result<(), ValidationError> {
    if is_valid_license_number(value) {
        Ok(())
    } else {
        Err(invalid("license_number", value))
    }
}

pub fn validate_license_category(value: &str) -> Result<(), ValidationError> {
    if is_valid_license_category(value) {
        return Ok(());
    }
    let mut error = invalid("license_category", value);
    error.add_param("allowed_values".into(), &LICENSE_CATEGORIES);
    Err(error)
}

pub fn validate_plate(value: &str) -> Result<(), ValidationError> {
    if is_valid_plate(value) {
        Ok(())
    } else {
        let mut error = invalid("plate", value);
        error.add_param("format".into(), &"ABC1234 or ABC1D23");
        Err(error)
    }
}

pub fn validate_future_date(value: &str) -> Result<(), ValidationError> {
    if !is_valid_date(value) {
        let mut error = invalid("date", value);
        error.add_param("format".into(), &"YYYY-MM-DD");
        return Err(error);
    }
    if !is_future_date(value, Utc::now().date_naive()) {
        return Err(invalid("future_date", value));
    }
    Ok(())
}

/// Validar que un valor sea positivo
pub fn validate_positive<T: PartialOrd + num_traits::Zero + Serialize>(
    value: &T,
) -> Result<(), ValidationError> {
    if *value <= T::zero() {
        return Err(invalid("positive", value));
    }
    Ok(())
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + num_traits::Zero + Serialize>(
    value: &T,
) -> Result<(), ValidationError> {
    if *value < T::zero() {
        return Err(invalid("non_negative", value));
    }
    Ok(())
}

pub fn validate_positive_decimal(value: &Decimal) -> Result<(), ValidationError> {
    validate_positive(value)
}

pub fn validate_non_negative_decimal(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(value)
}
