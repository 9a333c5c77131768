//! Safety status of a measurement against its declared limits.
//!
//! Exceeding the legally enforceable limit dominates exceeding an advisory
//! health guideline, so the legal comparison runs first.

use super::numeric::extract_numeric;
use crate::types::contaminant::Status;

/// Classify a measurement from its human-readable cells.
pub fn classify_status(detected: Option<&str>, legal: Option<&str>, health: Option<&str>) -> Status {
    classify_value(
        detected.and_then(extract_numeric),
        legal.and_then(extract_numeric),
        health.and_then(extract_numeric),
    )
}

/// Classify an already-numeric measurement.
///
/// - no detected value: `Unknown`
/// - detected > legal limit: `Fail`
/// - detected > health guideline: `Warning`
/// - otherwise: `Pass`
pub fn classify_value(detected: Option<f64>, legal: Option<f64>, health: Option<f64>) -> Status {
    let Some(detected) = detected else {
        return Status::Unknown;
    };

    if legal.is_some_and(|limit| detected > limit) {
        Status::Fail
    } else if health.is_some_and(|guideline| detected > guideline) {
        Status::Warning
    } else {
        Status::Pass
    }
}
