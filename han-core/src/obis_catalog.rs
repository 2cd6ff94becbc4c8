//! Descriptive OBIS register catalog.
//!
//! Data, not design: carried from the source project's `obis.py`
//! register table. Used for diagnostics (naming a raw OBIS code) and
//! is not on the decode hot path, which uses the smaller canonical
//! table in [`crate::fields`].

/// Coarse grouping of what a register measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterCategory {
    InstantaneousPower,
    InstantaneousCurrent,
    InstantaneousVoltage,
    PowerFactor,
    ActiveEnergy,
    ReactiveEnergy,
}

/// Engineering unit attached to a register, when it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObisUnit {
    Kw,
    Kwh,
    Kvar,
    Kvarh,
    Ampere,
    Volt,
}

/// One entry of the OBIS register catalog.
#[derive(Debug, Clone, Copy)]
pub struct ObisCatalogEntry {
    /// `C.D.E` triple as it appears on the wire, without the `A.B` prefix.
    pub cde: &'static str,
    pub category: RegisterCategory,
    pub name: &'static str,
    pub unit: Option<ObisUnit>,
    pub phase: Option<u8>,
}

use RegisterCategory::*;

pub const OBIS_CATALOG: &[ObisCatalogEntry] = &[
    ObisCatalogEntry { cde: "1.7.0", category: InstantaneousPower, name: "Positive active instantaneous power (A+)", unit: Some(ObisUnit::Kw), phase: None },
    ObisCatalogEntry { cde: "2.7.0", category: InstantaneousPower, name: "Negative active instantaneous power (A-)", unit: Some(ObisUnit::Kw), phase: None },
    ObisCatalogEntry { cde: "3.7.0", category: InstantaneousPower, name: "Positive reactive instantaneous power (Q+)", unit: Some(ObisUnit::Kvar), phase: None },
    ObisCatalogEntry { cde: "4.7.0", category: InstantaneousPower, name: "Negative reactive instantaneous power (Q-)", unit: Some(ObisUnit::Kvar), phase: None },
    ObisCatalogEntry { cde: "21.7.0", category: InstantaneousPower, name: "Positive active instantaneous power, L1", unit: Some(ObisUnit::Kw), phase: Some(1) },
    ObisCatalogEntry { cde: "41.7.0", category: InstantaneousPower, name: "Positive active instantaneous power, L2", unit: Some(ObisUnit::Kw), phase: Some(2) },
    ObisCatalogEntry { cde: "61.7.0", category: InstantaneousPower, name: "Positive active instantaneous power, L3", unit: Some(ObisUnit::Kw), phase: Some(3) },
    ObisCatalogEntry { cde: "31.7.0", category: InstantaneousCurrent, name: "Instantaneous current, L1", unit: Some(ObisUnit::Ampere), phase: Some(1) },
    ObisCatalogEntry { cde: "51.7.0", category: InstantaneousCurrent, name: "Instantaneous current, L2", unit: Some(ObisUnit::Ampere), phase: Some(2) },
    ObisCatalogEntry { cde: "71.7.0", category: InstantaneousCurrent, name: "Instantaneous current, L3", unit: Some(ObisUnit::Ampere), phase: Some(3) },
    ObisCatalogEntry { cde: "32.7.0", category: InstantaneousVoltage, name: "Instantaneous voltage, L1", unit: Some(ObisUnit::Volt), phase: Some(1) },
    ObisCatalogEntry { cde: "52.7.0", category: InstantaneousVoltage, name: "Instantaneous voltage, L2", unit: Some(ObisUnit::Volt), phase: Some(2) },
    ObisCatalogEntry { cde: "72.7.0", category: InstantaneousVoltage, name: "Instantaneous voltage, L3", unit: Some(ObisUnit::Volt), phase: Some(3) },
    ObisCatalogEntry { cde: "13.7.0", category: PowerFactor, name: "Instantaneous power factor", unit: None, phase: None },
    ObisCatalogEntry { cde: "33.7.0", category: PowerFactor, name: "Instantaneous power factor, L1", unit: None, phase: Some(1) },
    ObisCatalogEntry { cde: "53.7.0", category: PowerFactor, name: "Instantaneous power factor, L2", unit: None, phase: Some(2) },
    ObisCatalogEntry { cde: "73.7.0", category: PowerFactor, name: "Instantaneous power factor, L3", unit: None, phase: Some(3) },
    ObisCatalogEntry { cde: "1.8.0", category: ActiveEnergy, name: "Positive active energy (A+) total", unit: Some(ObisUnit::Kwh), phase: None },
    ObisCatalogEntry { cde: "2.8.0", category: ActiveEnergy, name: "Negative active energy (A-) total", unit: Some(ObisUnit::Kwh), phase: None },
    ObisCatalogEntry { cde: "3.8.0", category: ReactiveEnergy, name: "Positive reactive energy (Q+) total", unit: Some(ObisUnit::Kvarh), phase: None },
    ObisCatalogEntry { cde: "4.8.0", category: ReactiveEnergy, name: "Negative reactive energy (Q-) total", unit: Some(ObisUnit::Kvarh), phase: None },
];

/// Look up a register's catalog entry by its `C.D.E` triple.
pub fn lookup(cde: &str) -> Option<&'static ObisCatalogEntry> {
    OBIS_CATALOG.iter().find(|entry| entry.cde == cde)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_known_register() {
        let entry = lookup("1.7.0").unwrap();
        assert_eq!(entry.category, RegisterCategory::InstantaneousPower);
        assert_eq!(entry.unit, Some(ObisUnit::Kw));
    }

    #[test]
    fn power_factor_has_no_unit() {
        let entry = lookup("13.7.0").unwrap();
        assert_eq!(entry.unit, None);
    }

    #[test]
    fn unknown_register_is_none() {
        assert!(lookup("99.99.99").is_none());
    }
}
