//! Kaifa notification body: a fixed-order positional list with no OBIS
//! tagging — field identity comes from position and list length alone.

use han_core::datatypes::CosemDateTime;
use han_core::fields::*;
use han_core::{HanError, HanResult, ObisCode};

use crate::cursor::Cursor;
use crate::record::{Record, RecordValue};
use crate::value::{TAG_DOUBLE_LONG_UNSIGNED, TAG_OCTET_STRING, TAG_STRUCTURE};

/// Candidate field-name orderings, selected by how many list items the
/// notification body actually carries (one of 1, 9, 13, 14 or 18).
fn field_order_lists() -> [&'static [&'static str]; 5] {
    let list_3_three_phase: &[&str] = &[
        FIELD_LIST_VER_ID,
        FIELD_METER_ID,
        FIELD_METER_TYPE,
        FIELD_ACTIVE_POWER_IMPORT,
        FIELD_ACTIVE_POWER_EXPORT,
        FIELD_REACTIVE_POWER_IMPORT,
        FIELD_REACTIVE_POWER_EXPORT,
        FIELD_CURRENT_L1,
        FIELD_CURRENT_L2,
        FIELD_CURRENT_L3,
        FIELD_VOLTAGE_L1,
        FIELD_VOLTAGE_L2,
        FIELD_VOLTAGE_L3,
        FIELD_METER_DATETIME,
        FIELD_ACTIVE_POWER_IMPORT_TOTAL,
        FIELD_ACTIVE_POWER_EXPORT_TOTAL,
        FIELD_REACTIVE_POWER_IMPORT_TOTAL,
        FIELD_REACTIVE_POWER_EXPORT_TOTAL,
    ];
    let list_3_single_phase: &[&str] = &[
        FIELD_LIST_VER_ID,
        FIELD_METER_ID,
        FIELD_METER_TYPE,
        FIELD_ACTIVE_POWER_IMPORT,
        FIELD_ACTIVE_POWER_EXPORT,
        FIELD_REACTIVE_POWER_IMPORT,
        FIELD_REACTIVE_POWER_EXPORT,
        FIELD_CURRENT_L1,
        FIELD_VOLTAGE_L1,
        FIELD_METER_DATETIME,
        FIELD_ACTIVE_POWER_IMPORT_TOTAL,
        FIELD_ACTIVE_POWER_EXPORT_TOTAL,
        FIELD_REACTIVE_POWER_IMPORT_TOTAL,
        FIELD_REACTIVE_POWER_EXPORT_TOTAL,
    ];
    let list_2_single_phase: &[&str] = &list_3_single_phase[0..9];
    let list_2_three_phase: &[&str] = &list_3_three_phase[0..13];
    const LIST_1: &[&str] = &[FIELD_ACTIVE_POWER_IMPORT];

    [LIST_1, list_2_single_phase, list_2_three_phase, list_3_single_phase, list_3_three_phase]
}

fn scaling_for(field: &str) -> Option<i32> {
    match field {
        FIELD_CURRENT_L1 | FIELD_CURRENT_L2 | FIELD_CURRENT_L3 => Some(-3),
        FIELD_VOLTAGE_L1 | FIELD_VOLTAGE_L2 | FIELD_VOLTAGE_L3 => Some(-1),
        _ => None,
    }
}

enum RawItem {
    Text(String),
    Timestamp(String),
    Number(u32),
}

fn read_obis(cursor: &mut Cursor) -> HanResult<ObisCode> {
    cursor.expect_u8(TAG_OCTET_STRING, "OBIS field type")?;
    cursor.expect_u8(6, "OBIS field length")?;
    let bytes = cursor.take(6)?;
    Ok(ObisCode::from_bytes([bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]]))
}

/// Read `n` repetitions of (OBIS octet-string, value) — the "OBIS-elements"
/// shape, as opposed to the fixed positional "Value-elements" shape.
fn read_obis_elements(cursor: &mut Cursor, n: usize) -> HanResult<Vec<(ObisCode, RawItem)>> {
    (0..n)
        .map(|_| {
            let obis = read_obis(cursor)?;
            let item = read_item(cursor)?;
            Ok((obis, item))
        })
        .collect()
}

fn read_item(cursor: &mut Cursor) -> HanResult<RawItem> {
    let value_type = cursor.u8()?;
    match value_type {
        TAG_OCTET_STRING => {
            let len = cursor.u8()?;
            if len == CosemDateTime::LENGTH as u8 {
                let bytes = cursor.take(CosemDateTime::LENGTH)?;
                Ok(RawItem::Timestamp(CosemDateTime::decode(bytes)?.to_iso8601()))
            } else {
                let bytes = cursor.take(len as usize)?;
                let text = std::str::from_utf8(bytes)
                    .map_err(|_| HanError::Decode("octet-string text is not utf8".into()))?;
                Ok(RawItem::Text(text.to_string()))
            }
        }
        TAG_DOUBLE_LONG_UNSIGNED => Ok(RawItem::Number(cursor.u32()?)),
        other => Err(HanError::Decode(format!("unsupported Kaifa item type 0x{:02X}", other))),
    }
}

fn raw_item_to_value(field_name: &str, item: RawItem) -> RecordValue {
    match item {
        RawItem::Timestamp(ts) => RecordValue::Timestamp(ts),
        RawItem::Text(t) => RecordValue::Text(t),
        RawItem::Number(n) => match scaling_for(field_name) {
            Some(scale) => RecordValue::Float(n as f64 * 10f64.powi(scale)),
            None => RecordValue::Integer(n as i64),
        },
    }
}

/// Decode a Kaifa LLC PDU notification body into a canonical record.
///
/// Two wire shapes exist and are tried in order: an OBIS-tagged
/// "OBIS-elements" list (declared item count `2n`, `n` repetitions of
/// OBIS octet-string + value) and the positional "Value-elements" list
/// used by older meters, where field identity comes from list length
/// alone. `apdu_datetime` is the APDU header's date/time field (if
/// present); it seeds `meter_datetime` before either shape is applied,
/// so shorter lists that carry no datetime element still get one.
pub fn decode_notification_body(body: &[u8], apdu_datetime: Option<&CosemDateTime>) -> HanResult<Record> {
    let mut cursor = Cursor::new(body);
    cursor.expect_u8(TAG_STRUCTURE, "notification body")?;
    let count = cursor.u8()? as usize;

    let mut record = Record::new();
    record.insert(FIELD_METER_MANUFACTURER.to_string(), RecordValue::Text("Kaifa".to_string()));
    if let Some(dt) = apdu_datetime {
        record.insert(FIELD_METER_DATETIME.to_string(), RecordValue::Timestamp(dt.to_iso8601()));
    }

    if count > 0 && count % 2 == 0 {
        let checkpoint = cursor;
        match read_obis_elements(&mut cursor, count / 2) {
            Ok(elements) => {
                for (obis, item) in elements {
                    let cde = obis.to_cde_string();
                    let field_name = canonical_name_for_cde(&cde).map(str::to_string).unwrap_or(cde);
                    let value = raw_item_to_value(&field_name, item);
                    record.insert(field_name, value);
                }
                return Ok(record);
            }
            Err(_) => cursor = checkpoint,
        }
    }

    let field_names = field_order_lists()
        .into_iter()
        .find(|list| list.len() == count)
        .ok_or_else(|| HanError::Decode(format!("unrecognized Kaifa list length {}", count)))?;

    for field_name in field_names.iter() {
        let item = read_item(&mut cursor)?;
        record.insert((*field_name).to_string(), raw_item_to_value(field_name, item));
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn octet_text(s: &str) -> Vec<u8> {
        let mut v = vec![TAG_OCTET_STRING, s.len() as u8];
        v.extend_from_slice(s.as_bytes());
        v
    }

    fn number(n: u32) -> Vec<u8> {
        let mut v = vec![TAG_DOUBLE_LONG_UNSIGNED];
        v.extend_from_slice(&n.to_be_bytes());
        v
    }

    #[test]
    fn decodes_single_element_list() {
        let mut body = vec![TAG_STRUCTURE, 1];
        body.extend_from_slice(&number(424));
        let record = decode_notification_body(&body, None).unwrap();
        assert_eq!(record.get(FIELD_ACTIVE_POWER_IMPORT), Some(&RecordValue::Integer(424)));
    }

    #[test]
    fn applies_current_and_voltage_scaling_in_nine_element_list() {
        let mut body = vec![TAG_STRUCTURE, 9];
        body.extend_from_slice(&octet_text("1"));
        body.extend_from_slice(&octet_text("6850123456"));
        body.extend_from_slice(&octet_text("IEM3455"));
        body.extend_from_slice(&number(424));
        body.extend_from_slice(&number(0));
        body.extend_from_slice(&number(0));
        body.extend_from_slice(&number(0));
        body.extend_from_slice(&number(1500)); // current, milliamps
        body.extend_from_slice(&number(2300)); // voltage, decivolts

        let record = decode_notification_body(&body, None).unwrap();
        assert_eq!(record.get(FIELD_CURRENT_L1), Some(&RecordValue::Float(1.5)));
        assert_eq!(record.get(FIELD_VOLTAGE_L1), Some(&RecordValue::Float(230.0)));
    }

    #[test]
    fn rejects_unrecognized_list_length() {
        let body = vec![TAG_STRUCTURE, 2, 0, 0, 0, 0];
        assert!(decode_notification_body(&body, None).is_err());
    }

    /// A real Kaifa three-phase-without-datetime LLC PDU (13-element list).
    fn three_phase_frame() -> Vec<u8> {
        hex_decode(concat!(
            "e6e700",
            "0f",
            "40000000",
            "090c07e40119060d091eff800000",
            "020d",
            "09074b464d5f303031",
            "091036393730363331343032363134343736",
            "09084d413330344833450600002611",
            "0600000000",
            "0600000000",
            "06000001b3",
            "0600008415",
            "0600006dc7",
            "0600004702",
            "0600000878",
            "0600000000",
            "060000088c",
        ))
    }

    fn hex_decode(s: &str) -> Vec<u8> {
        (0..s.len()).step_by(2).map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap()).collect()
    }

    fn obis_bytes(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8) -> Vec<u8> {
        vec![TAG_OCTET_STRING, 6, a, b, c, d, e, f]
    }

    /// Scenario: a Kaifa SE-list encoded in the OBIS-elements shape
    /// (declared item count `2n`, OBIS + value repeated), as opposed to
    /// the positional shape exercised by `decodes_real_three_phase_frame`.
    #[test]
    fn decodes_obis_elements_list() {
        use han_core::datatypes::CosemDateFormat;

        let mut body = vec![TAG_STRUCTURE, 6];
        body.extend_from_slice(&obis_bytes(1, 1, 0, 2, 129, 255));
        body.extend_from_slice(&octet_text("KFM_001"));
        body.extend_from_slice(&obis_bytes(1, 1, 31, 7, 0, 255));
        body.extend_from_slice(&number(6781));
        body.extend_from_slice(&obis_bytes(1, 1, 32, 7, 0, 255));
        body.extend_from_slice(&number(2322));

        let dt = CosemDateTime::new(2021, 9, 22, 17, 35, 30, 60, &[]).unwrap();
        let mut frame = vec![0xE6, 0xE6, 0x00, 0x0F, 0x40, 0x00, 0x00, 0x00];
        frame.push(TAG_OCTET_STRING);
        frame.push(CosemDateTime::LENGTH as u8);
        frame.extend_from_slice(&dt.encode());
        frame.extend_from_slice(&body);

        let pdu = crate::llc_pdu::LlcPdu::parse(&frame).unwrap();
        let record = decode_notification_body(pdu.notification_body, pdu.datetime.as_ref()).unwrap();

        assert_eq!(record.get(FIELD_LIST_VER_ID), Some(&RecordValue::Text("KFM_001".into())));
        match record.get(FIELD_VOLTAGE_L1) {
            Some(RecordValue::Float(v)) => assert!((v - 232.2).abs() < 1e-9),
            other => panic!("expected voltage_l1 float, got {:?}", other),
        }
        match record.get(FIELD_CURRENT_L1) {
            Some(RecordValue::Float(v)) => assert!((v - 6.781).abs() < 1e-9),
            other => panic!("expected current_l1 float, got {:?}", other),
        }
        assert_eq!(
            record.get(FIELD_METER_DATETIME),
            Some(&RecordValue::Timestamp("2021-09-22T17:35:30+01:00".to_string()))
        );
    }

    #[test]
    fn decodes_real_three_phase_frame() {
        let frame = three_phase_frame();
        let pdu = crate::llc_pdu::LlcPdu::parse(&frame).unwrap();
        let record = decode_notification_body(pdu.notification_body, pdu.datetime.as_ref()).unwrap();

        assert_eq!(record.get(FIELD_LIST_VER_ID), Some(&RecordValue::Text("KFM_001".into())));
        assert_eq!(record.get(FIELD_METER_TYPE), Some(&RecordValue::Text("MA304H3E".into())));
        assert_eq!(record.get(FIELD_ACTIVE_POWER_IMPORT), Some(&RecordValue::Integer(9745)));
        assert_eq!(record.get(FIELD_CURRENT_L1), Some(&RecordValue::Float(33.813)));
        assert_eq!(record.get(FIELD_VOLTAGE_L1), Some(&RecordValue::Float(216.8)));
        assert_eq!(record.get(FIELD_METER_MANUFACTURER), Some(&RecordValue::Text("Kaifa".into())));
        assert!(matches!(record.get(FIELD_METER_DATETIME), Some(RecordValue::Timestamp(_))));
    }
}
