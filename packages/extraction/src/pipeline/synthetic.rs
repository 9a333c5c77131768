//! Risk-weighted contaminant profiles for products without lab data.
//!
//! The profile is a pure function of packaging, type, source and score, so
//! regenerating a report from the same store yields identical numbers.

use crate::types::contaminant::{ContaminantRecord, NOT_DETECTED};
use crate::types::product::{Packaging, ProductRecord, WaterSource, WaterType};

/// Score below which a product counts as low scoring.
const LOW_SCORE: u8 = 50;

/// PFAS risk above which PFAS is reported as detected.
const PFAS_DETECTION_RISK: f64 = 0.3;

/// Fixed limits per synthetic contaminant: (name, legal limit, health guideline).
const PFAS: (&str, &str, &str) = ("PFAS (Total)", "10 ppt", "0.1 ppt");
const LEAD: (&str, &str, &str) = ("Lead", "10 ppb", "1 ppb");
const ARSENIC: (&str, &str, &str) = ("Arsenic", "10 ppb", "0.004 ppb");
const MICROPLASTICS: (&str, &str, &str) = ("Microplastics", "Not regulated", "5 particles/L");

/// The attributes the risk model reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskFactors {
    pub plastic: bool,
    pub aluminum: bool,
    pub flavored: bool,
    pub municipal: bool,
    pub low_score: bool,
}

impl RiskFactors {
    /// A missing score counts as a perfect one.
    pub fn of(record: &ProductRecord) -> Self {
        Self {
            plastic: record.packaging == Some(Packaging::Plastic),
            aluminum: record.packaging == Some(Packaging::Aluminum),
            flavored: record.water_type() == WaterType::FlavoredWater,
            municipal: record.source == Some(WaterSource::Municipal),
            low_score: record.score.unwrap_or(100) < LOW_SCORE,
        }
    }

    pub fn pfas_risk(&self) -> f64 {
        let mut risk = 0.1;
        if self.flavored {
            risk += 0.4;
        }
        if self.plastic {
            risk += 0.2;
        }
        if self.low_score {
            risk += 0.3;
        }
        risk
    }

    pub fn lead_risk(&self) -> f64 {
        let mut risk = 0.1;
        if self.aluminum {
            risk += 0.3;
        }
        if self.municipal {
            risk += 0.4;
        }
        if self.low_score {
            risk += 0.2;
        }
        risk
    }
}

/// Deterministic contaminant profile generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticContaminantGenerator;

impl SyntheticContaminantGenerator {
    pub fn new() -> Self {
        Self
    }

    /// PFAS, Lead and Arsenic always; Microplastics for plastic packaging.
    pub fn generate(&self, record: &ProductRecord) -> Vec<ContaminantRecord> {
        self.generate_for(RiskFactors::of(record))
    }

    pub fn generate_for(&self, factors: RiskFactors) -> Vec<ContaminantRecord> {
        let pfas_risk = factors.pfas_risk();
        let lead_risk = factors.lead_risk();
        let combined = pfas_risk + lead_risk;

        let pfas_level = if pfas_risk > PFAS_DETECTION_RISK {
            (pfas_risk * 20.0).min(15.0)
        } else {
            0.0
        };
        let lead_level = (lead_risk * 10.0).min(8.0);
        let arsenic_level = (combined * 2.0).min(3.0);

        let mut profile = vec![
            measured(PFAS, pfas_level, 0.1, 1, "ppt"),
            measured(LEAD, lead_level, 0.1, 1, "ppb"),
            measured(ARSENIC, arsenic_level, 0.01, 2, "ppb"),
        ];

        if factors.plastic {
            let micro_level = (combined * 15.0).min(20.0);
            profile.push(measured(MICROPLASTICS, micro_level, 0.0, 1, "particles/L"));
        }

        profile
    }
}

/// Format a level for display; at or below `nd_below` it reads as `ND` and
/// classifies as zero.
fn measured(
    (name, legal, health): (&str, &str, &str),
    level: f64,
    nd_below: f64,
    decimals: usize,
    unit: &str,
) -> ContaminantRecord {
    if level <= nd_below && nd_below > 0.0 {
        ContaminantRecord::from_measurement(name, NOT_DETECTED, 0.0, legal, health)
    } else {
        let detected = format!("{level:.decimals$} {unit}");
        ContaminantRecord::from_measurement(name, detected, level, legal, health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::contaminant::Status;
    use proptest::prelude::*;

    fn record(packaging: Option<Packaging>, kind: Option<WaterType>, score: Option<u8>) -> ProductRecord {
        let mut record = ProductRecord::from_name("Test Water");
        record.packaging = packaging;
        record.kind = kind;
        record.score = score;
        record
    }

    fn find<'a>(rows: &'a [ContaminantRecord], name: &str) -> &'a ContaminantRecord {
        rows.iter().find(|r| r.name == name).unwrap()
    }

    #[test]
    fn test_high_risk_plastic_flavored() {
        let rows = SyntheticContaminantGenerator::new().generate(&record(
            Some(Packaging::Plastic),
            Some(WaterType::FlavoredWater),
            Some(40),
        ));
        assert_eq!(rows.len(), 4);

        let pfas = find(&rows, "PFAS (Total)");
        assert_eq!(pfas.detected.as_deref(), Some("15.0 ppt"));
        assert_eq!(pfas.status(), Status::Fail);

        let lead = find(&rows, "Lead");
        assert_eq!(lead.detected.as_deref(), Some("3.0 ppb"));
        assert_eq!(lead.status(), Status::Warning);

        let arsenic = find(&rows, "Arsenic");
        assert_eq!(arsenic.detected.as_deref(), Some("2.60 ppb"));
        assert_eq!(arsenic.status(), Status::Warning);

        let micro = find(&rows, "Microplastics");
        assert_eq!(micro.detected.as_deref(), Some("19.5 particles/L"));
        assert_eq!(micro.legal_limit.as_deref(), Some("Not regulated"));
        assert_eq!(micro.status(), Status::Warning);
    }

    #[test]
    fn test_low_risk_glass() {
        let rows = SyntheticContaminantGenerator::new().generate(&record(
            Some(Packaging::Glass),
            Some(WaterType::BottledWater),
            Some(90),
        ));
        assert_eq!(rows.len(), 3);

        let pfas = find(&rows, "PFAS (Total)");
        assert!(pfas.is_not_detected());
        assert_eq!(pfas.status(), Status::Pass);

        assert_eq!(find(&rows, "Lead").detected.as_deref(), Some("1.0 ppb"));
        assert_eq!(find(&rows, "Lead").status(), Status::Pass);
        assert_eq!(find(&rows, "Arsenic").detected.as_deref(), Some("0.40 ppb"));
    }

    #[test]
    fn test_plastic_alone_crosses_pfas_threshold() {
        // 0.1 + 0.2 lands just above 0.3 in f64.
        let rows = SyntheticContaminantGenerator::new().generate(&record(Some(Packaging::Plastic), None, Some(90)));
        let pfas = find(&rows, "PFAS (Total)");
        assert_eq!(pfas.detected.as_deref(), Some("6.0 ppt"));
        assert_eq!(pfas.status(), Status::Warning);
    }

    #[test]
    fn test_missing_score_is_not_low() {
        let factors = RiskFactors::of(&record(None, None, None));
        assert!(!factors.low_score);
        assert!(!factors.flavored);
    }

    proptest! {
        #[test]
        fn generation_is_deterministic(
            plastic in any::<bool>(),
            aluminum in any::<bool>(),
            flavored in any::<bool>(),
            municipal in any::<bool>(),
            low_score in any::<bool>(),
        ) {
            let factors = RiskFactors { plastic, aluminum, flavored, municipal, low_score };
            let generator = SyntheticContaminantGenerator::new();
            let first = serde_json::to_string(&generator.generate_for(factors)).unwrap();
            let second = serde_json::to_string(&generator.generate_for(factors)).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn levels_stay_in_range(
            plastic in any::<bool>(),
            aluminum in any::<bool>(),
            flavored in any::<bool>(),
            municipal in any::<bool>(),
            low_score in any::<bool>(),
        ) {
            let factors = RiskFactors { plastic, aluminum, flavored, municipal, low_score };
            for row in SyntheticContaminantGenerator::new().generate_for(factors) {
                let value = row.detected.as_deref().and_then(crate::pipeline::numeric::extract_numeric).unwrap_or(0.0);
                let cap = match row.name.as_str() {
                    "PFAS (Total)" => 15.0,
                    "Lead" => 8.0,
                    "Arsenic" => 3.0,
                    _ => 20.0,
                };
                prop_assert!((0.0..=cap).contains(&value));
            }
        }
    }
}
