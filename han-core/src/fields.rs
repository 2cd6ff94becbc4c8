//! Canonical field names and the static OBIS (C.D.E) -> name mapping.
//!
//! Carried as data from the source project's `obis_map.py` (several
//! near-identical copies across historical iterations, unioned here).
//! Canonical-field mapping is single-valued: each known OBIS `C.D.E`
//! triple maps to at most one canonical field name.

use std::collections::HashMap;
use std::sync::OnceLock;

pub const FIELD_LIST_VER_ID: &str = "list_ver_id";
pub const FIELD_METER_ID: &str = "meter_id";
pub const FIELD_METER_TYPE: &str = "meter_type";
pub const FIELD_METER_MANUFACTURER: &str = "meter_manufacturer";
pub const FIELD_METER_MANUFACTURER_ID: &str = "meter_manufacturer_id";
pub const FIELD_METER_TYPE_ID: &str = "meter_type_id";
pub const FIELD_METER_DATETIME: &str = "meter_datetime";
pub const FIELD_ACTIVE_POWER_IMPORT: &str = "active_power_import";
pub const FIELD_ACTIVE_POWER_EXPORT: &str = "active_power_export";
pub const FIELD_REACTIVE_POWER_IMPORT: &str = "reactive_power_import";
pub const FIELD_REACTIVE_POWER_EXPORT: &str = "reactive_power_export";
pub const FIELD_CURRENT_L1: &str = "current_l1";
pub const FIELD_CURRENT_L2: &str = "current_l2";
pub const FIELD_CURRENT_L3: &str = "current_l3";
pub const FIELD_VOLTAGE_L1: &str = "voltage_l1";
pub const FIELD_VOLTAGE_L2: &str = "voltage_l2";
pub const FIELD_VOLTAGE_L3: &str = "voltage_l3";
pub const FIELD_ACTIVE_POWER_IMPORT_TOTAL: &str = "active_power_import_total";
pub const FIELD_ACTIVE_POWER_EXPORT_TOTAL: &str = "active_power_export_total";
pub const FIELD_REACTIVE_POWER_IMPORT_TOTAL: &str = "reactive_power_import_total";
pub const FIELD_REACTIVE_POWER_EXPORT_TOTAL: &str = "reactive_power_export_total";
pub const FIELD_POWER_FACTOR: &str = "power_factor";
pub const FIELD_POWER_FACTOR_L1: &str = "power_factor_l1";
pub const FIELD_POWER_FACTOR_L2: &str = "power_factor_l2";
pub const FIELD_POWER_FACTOR_L3: &str = "power_factor_l3";

/// `(canonical field name, [OBIS C.D.E addresses])`.
const NAME_OBIS_TABLE: &[(&str, &[&str])] = &[
    (FIELD_LIST_VER_ID, &["0.2.129"]),
    (FIELD_METER_ID, &["96.1.0", "0.0.5"]),
    (FIELD_METER_TYPE, &["96.1.7", "96.1.1"]),
    (FIELD_METER_DATETIME, &["1.0.0", "1.1.0"]),
    (FIELD_ACTIVE_POWER_IMPORT, &["1.7.0"]),
    (FIELD_ACTIVE_POWER_EXPORT, &["2.7.0"]),
    (FIELD_REACTIVE_POWER_IMPORT, &["3.7.0"]),
    (FIELD_REACTIVE_POWER_EXPORT, &["4.7.0"]),
    (FIELD_CURRENT_L1, &["31.7.0"]),
    (FIELD_CURRENT_L2, &["51.7.0"]),
    (FIELD_CURRENT_L3, &["71.7.0"]),
    (FIELD_VOLTAGE_L1, &["32.7.0"]),
    (FIELD_VOLTAGE_L2, &["52.7.0"]),
    (FIELD_VOLTAGE_L3, &["72.7.0"]),
    (FIELD_ACTIVE_POWER_IMPORT_TOTAL, &["1.8.0"]),
    (FIELD_ACTIVE_POWER_EXPORT_TOTAL, &["2.8.0"]),
    (FIELD_REACTIVE_POWER_IMPORT_TOTAL, &["3.8.0"]),
    (FIELD_REACTIVE_POWER_EXPORT_TOTAL, &["4.8.0"]),
    (FIELD_POWER_FACTOR, &["13.7.0"]),
    (FIELD_POWER_FACTOR_L1, &["33.7.0"]),
    (FIELD_POWER_FACTOR_L2, &["53.7.0"]),
    (FIELD_POWER_FACTOR_L3, &["73.7.0"]),
];

fn obis_name_map() -> &'static HashMap<&'static str, &'static str> {
    static MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| {
        let mut map = HashMap::new();
        for (name, obis_values) in NAME_OBIS_TABLE {
            for obis in *obis_values {
                map.insert(*obis, *name);
            }
        }
        map
    })
}

/// Look up the canonical field name for an OBIS `C.D.E` triple.
pub fn canonical_name_for_cde(cde: &str) -> Option<&'static str> {
    obis_name_map().get(cde).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_known_triple() {
        assert_eq!(canonical_name_for_cde("1.7.0"), Some(FIELD_ACTIVE_POWER_IMPORT));
        assert_eq!(canonical_name_for_cde("31.7.0"), Some(FIELD_CURRENT_L1));
    }

    #[test]
    fn unknown_triple_is_none() {
        assert_eq!(canonical_name_for_cde("99.99.99"), None);
    }

    #[test]
    fn mapping_is_single_valued() {
        let mut seen = HashMap::new();
        for (name, obis_values) in NAME_OBIS_TABLE {
            for obis in *obis_values {
                assert!(
                    seen.insert(*obis, *name).is_none(),
                    "OBIS {} mapped to more than one canonical name",
                    obis
                );
            }
        }
    }
}
