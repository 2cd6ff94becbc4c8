//! Decode a Mode D readout's data block into canonical fields.

use std::collections::HashMap;

use han_core::fields::{canonical_name_for_cde, FIELD_METER_MANUFACTURER_ID, FIELD_METER_TYPE_ID};
use han_core::HanError;
use once_cell::sync::Lazy;
use regex::Regex;

use super::dataset::DataSet;
use super::readout::DataReadout;

/// A decoded field value. P1 readouts are ASCII text, so values arrive
/// typed only by convention (the unit suffix, or a well-known address).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    /// Naive local timestamp, formatted `YYYY-MM-DDTHH:MM:SS`.
    Timestamp(String),
}

static CDE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{1,3}-)?(?:\d{1,3}:)?(\d{1,3})\.(\d{1,3})(?:\.(\d{1,3}))?").unwrap());

/// Reduce a P1 address (`1-0:1.8.0.255`, or a bare `0.2.129`) to its
/// `C.D.E` triple for canonical lookup.
fn to_cde(address: &str) -> Option<String> {
    let captures = CDE_PATTERN.captures(address)?;
    let c = &captures[1];
    let d = &captures[2];
    let e = captures.get(3).map(|m| m.as_str()).unwrap_or("0");
    Some(format!("{c}.{d}.{e}"))
}

fn parse_p1_datetime(value: &str) -> Option<String> {
    if value.len() < 12 {
        return None;
    }
    let year: u32 = value[0..2].parse().ok()?;
    let month: u32 = value[2..4].parse().ok()?;
    let day: u32 = value[4..6].parse().ok()?;
    let hour: u32 = value[6..8].parse().ok()?;
    let minute: u32 = value[8..10].parse().ok()?;
    let second: u32 = value[10..12].parse().ok()?;
    Some(format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
        2000 + year,
        month,
        day,
        hour,
        minute,
        second
    ))
}

/// Parse a readout's data block into addressed data sets.
pub fn parse_p1_readout_content(content: &[u8]) -> Result<Vec<DataSet>, HanError> {
    let text = std::str::from_utf8(content)
        .map_err(|_| HanError::InvalidData("readout content is not ascii".into()))?;
    Ok(DataSet::parse_data_block(text))
}

fn decode_parsed(parsed: &[DataSet]) -> HashMap<String, FieldValue> {
    let mut decoded = HashMap::new();

    for item in parsed {
        if item.values.len() != 1 {
            continue;
        }
        let Some(cde) = to_cde(&item.address) else { continue };
        let element_name = canonical_name_for_cde(&cde).map(str::to_string).unwrap_or(cde.clone());

        let raw_value = &item.values[0];
        let unit = raw_value.unit.as_deref().map(str::to_lowercase);
        let value = match unit.as_deref() {
            Some("v") | Some("a") | Some("var") | Some("varh") => {
                raw_value.value.parse::<f64>().ok().map(FieldValue::Float)
            }
            Some("kw") | Some("kwh") | Some("kvar") | Some("kvarh") => raw_value
                .value
                .parse::<f64>()
                .ok()
                .map(|v| FieldValue::Integer((v * 1000.0).round() as i64)),
            _ => {
                if cde == "1.0.0" {
                    parse_p1_datetime(&raw_value.value).map(FieldValue::Timestamp)
                } else {
                    Some(FieldValue::Text(raw_value.value.clone()))
                }
            }
        };

        if let Some(value) = value {
            decoded.insert(element_name, value);
        }
    }

    decoded
}

/// Decode a readout's data block content alone, with no identification
/// line available (used when only the payload bytes are on hand).
pub fn decode_p1_readout_content(content: &[u8]) -> Result<HashMap<String, FieldValue>, HanError> {
    let parsed = parse_p1_readout_content(content)?;
    if parsed.is_empty() {
        return Err(HanError::InvalidData("content contains no readout data".into()));
    }
    Ok(decode_parsed(&parsed))
}

/// Decode a full readout, injecting manufacturer/type identification
/// from the identification line (these are not OBIS-addressed).
pub fn decode_p1_readout(readout: &DataReadout) -> Result<HashMap<String, FieldValue>, HanError> {
    let parsed = parse_p1_readout_content(readout.payload())?;
    let mut decoded = decode_parsed(&parsed);

    let ident = readout.identification_line()?;
    decoded.insert(
        FIELD_METER_MANUFACTURER_ID.to_string(),
        FieldValue::Text(ident.manufacturer_id().to_string()),
    );
    decoded.insert(
        FIELD_METER_TYPE_ID.to_string(),
        FieldValue::Text(ident.identification().to_string()),
    );

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cde_extraction_handles_reduced_and_bare_forms() {
        assert_eq!(to_cde("1-0:1.8.0.255").as_deref(), Some("1.8.0"));
        assert_eq!(to_cde("0.2.129").as_deref(), Some("0.2.129"));
    }

    #[test]
    fn decodes_power_value_as_integer_watts() {
        let block = "1-0:1.7.0(00.424*kW)\r\n";
        let parsed = parse_p1_readout_content(block.as_bytes()).unwrap();
        let decoded = decode_parsed(&parsed);
        assert_eq!(decoded.get("active_power_import"), Some(&FieldValue::Integer(424)));
    }

    #[test]
    fn decodes_current_as_float_amps() {
        let block = "1-0:31.7.0(002.5*A)\r\n";
        let parsed = parse_p1_readout_content(block.as_bytes()).unwrap();
        let decoded = decode_parsed(&parsed);
        assert_eq!(decoded.get("current_l1"), Some(&FieldValue::Float(2.5)));
    }

    #[test]
    fn decodes_meter_datetime() {
        let block = "0-0:1.0.0(230401120000W)\r\n";
        let parsed = parse_p1_readout_content(block.as_bytes()).unwrap();
        let decoded = decode_parsed(&parsed);
        assert_eq!(
            decoded.get("meter_datetime"),
            Some(&FieldValue::Timestamp("2023-04-01T12:00:00".to_string()))
        );
    }

    #[test]
    fn empty_content_is_rejected() {
        assert!(decode_p1_readout_content(b"\r\n").is_err());
    }

    #[test]
    fn decodes_landis_gyr_e360_readout() {
        use super::super::crc16;
        use super::super::readout::DataReadout;

        let body = b"/LGF5E360\r\n\
1-0:1.7.0(0000.000*kW)\r\n\
1-0:1.8.0(10501.076*kWh)\r\n\
1-0:32.7.0(232.1*V)\r\n!";
        let crc = crc16::compute(body);
        let mut raw = body.to_vec();
        raw.extend_from_slice(format!("{:04X}\r\n", crc).as_bytes());

        let readout = DataReadout::new(raw).unwrap();
        assert!(readout.is_valid());

        let decoded = decode_p1_readout(&readout).unwrap();
        assert_eq!(decoded.get("active_power_import"), Some(&FieldValue::Integer(0)));
        assert_eq!(decoded.get("active_power_import_total"), Some(&FieldValue::Integer(10501076)));
        assert_eq!(decoded.get("voltage_l1"), Some(&FieldValue::Float(232.1)));
        assert_eq!(decoded.get(FIELD_METER_MANUFACTURER_ID), Some(&FieldValue::Text("LGF".to_string())));
        assert_eq!(decoded.get(FIELD_METER_TYPE_ID), Some(&FieldValue::Text("E360".to_string())));
    }
}
