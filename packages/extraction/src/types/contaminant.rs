//! Contaminant measurements and their safety status.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::lenient;

use crate::pipeline::classify::{classify_status, classify_value};
use crate::pipeline::numeric::extract_numeric;

/// Literal used for a not-detected measurement.
pub const NOT_DETECTED: &str = "ND";

/// Safety classification of a single measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Warning,
    Fail,
    Unknown,
}

impl Status {
    /// Whether this status counts towards `contaminants_above_guidelines`.
    pub fn is_above_guidelines(self) -> bool {
        matches!(self, Status::Warning | Status::Fail)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pass => "pass",
            Status::Warning => "warning",
            Status::Fail => "fail",
            Status::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a product's contaminant table.
///
/// `status` has no public setter: it is always derived from the values it
/// summarizes, either by re-reading the human-readable strings
/// ([`ContaminantRecord::classified`]) or from the numeric value a generator
/// produced ([`ContaminantRecord::from_measurement`]). A stored record
/// without a status is classified on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredContaminant")]
pub struct ContaminantRecord {
    pub name: String,

    /// Human-readable measurement ("0.5 ppb") or [`NOT_DETECTED`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_limit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_guideline: Option<String>,

    status: Status,
}

impl ContaminantRecord {
    /// Build a record and classify it from its text cells.
    pub fn classified(
        name: impl Into<String>,
        detected: Option<String>,
        legal_limit: Option<String>,
        health_guideline: Option<String>,
    ) -> Self {
        let status = classify_status(
            detected.as_deref(),
            legal_limit.as_deref(),
            health_guideline.as_deref(),
        );
        Self {
            name: name.into(),
            detected,
            legal_limit,
            health_guideline,
            status,
        }
    }

    /// Build a record whose status comes from an exact numeric value.
    ///
    /// The displayed `detected` string may be rounded or read "ND"; the
    /// status still reflects `value`.
    pub fn from_measurement(
        name: impl Into<String>,
        detected: impl Into<String>,
        value: f64,
        legal_limit: impl Into<String>,
        health_guideline: impl Into<String>,
    ) -> Self {
        let legal_limit = legal_limit.into();
        let health_guideline = health_guideline.into();
        let status = classify_value(
            Some(value),
            extract_numeric(&legal_limit),
            extract_numeric(&health_guideline),
        );
        Self {
            name: name.into(),
            detected: Some(detected.into()),
            legal_limit: Some(legal_limit),
            health_guideline: Some(health_guideline),
            status,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Whether the measurement was reported as not detected.
    pub fn is_not_detected(&self) -> bool {
        self.detected.as_deref() == Some(NOT_DETECTED)
    }
}

/// On-disk shape. Cells may be strings or numbers; an unrecognized status
/// is re-derived from the cells.
#[derive(Deserialize)]
struct StoredContaminant {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    detected: Option<Value>,
    #[serde(default)]
    legal_limit: Option<Value>,
    #[serde(default)]
    health_guideline: Option<Value>,
    #[serde(default)]
    status: Option<Value>,
}

impl TryFrom<StoredContaminant> for ContaminantRecord {
    type Error = String;

    fn try_from(stored: StoredContaminant) -> Result<Self, Self::Error> {
        let name = lenient::text(stored.name).ok_or("contaminant without a name")?;
        let detected = lenient::text(stored.detected);
        let legal_limit = lenient::text(stored.legal_limit);
        let health_guideline = lenient::text(stored.health_guideline);

        Ok(match lenient::typed::<Status>(stored.status) {
            Some(status) => Self {
                name,
                detected,
                legal_limit,
                health_guideline,
                status,
            },
            None => Self::classified(name, detected, legal_limit, health_guideline),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classified_derives_status() {
        let lead = ContaminantRecord::classified(
            "Lead",
            Some("12 ppb".into()),
            Some("10 ppb".into()),
            Some("1 ppb".into()),
        );
        assert_eq!(lead.status(), Status::Fail);

        let missing = ContaminantRecord::classified("Lead", None, Some("10 ppb".into()), None);
        assert_eq!(missing.status(), Status::Unknown);
    }

    #[test]
    fn test_measurement_uses_exact_value() {
        let pfas = ContaminantRecord::from_measurement("PFAS (Total)", "ND", 0.0, "10 ppt", "0.1 ppt");
        assert!(pfas.is_not_detected());
        assert_eq!(pfas.status(), Status::Pass);
    }

    #[test]
    fn test_serialized_shape() {
        let record = ContaminantRecord::classified("Arsenic", Some("ND".into()), None, None);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["name"], "Arsenic");
        assert_eq!(json["detected"], "ND");
        assert_eq!(json["status"], "unknown");
        assert!(json.get("legal_limit").is_none());
    }

    #[test]
    fn test_status_survives_reload() {
        let pfas = ContaminantRecord::from_measurement("PFAS (Total)", "ND", 0.0, "10 ppt", "0.1 ppt");
        let json = serde_json::to_string(&pfas).unwrap();
        let reloaded: ContaminantRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, pfas);
    }

    #[test]
    fn test_missing_status_is_classified_on_load() {
        let json = r#"{"name":"Lead","detected":"5 ppb","legal_limit":"10 ppb","health_guideline":"1 ppb"}"#;
        let record: ContaminantRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status(), Status::Warning);
    }

    #[test]
    fn test_numeric_cells_and_unknown_status() {
        let json = r#"{"name":"Lead","detected":0.5,"legal_limit":10,"health_guideline":"1 ppb","status":"safe"}"#;
        let record: ContaminantRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.detected.as_deref(), Some("0.5"));
        assert_eq!(record.legal_limit.as_deref(), Some("10"));
        assert_eq!(record.status(), Status::Pass);
    }

    #[test]
    fn test_nameless_row_is_rejected() {
        assert!(serde_json::from_str::<ContaminantRecord>(r#"{"detected":"1 ppb"}"#).is_err());
    }
}
