//! Kamstrup notification body: a greedily-parsed list of OBIS-tagged
//! elements, with the leading list-version element carrying no OBIS
//! code at all.

use han_core::datatypes::CosemDateTime;
use han_core::fields::{canonical_name_for_cde, FIELD_LIST_VER_ID, FIELD_METER_DATETIME, FIELD_METER_MANUFACTURER};
use han_core::{HanResult, ObisCode};

use crate::cursor::Cursor;
use crate::record::{Record, RecordValue};
use crate::value::{self, decode_value, CosemValue, TAG_NULL, TAG_OCTET_STRING, TAG_STRUCTURE};

/// Reduced OBIS (C.D.E) of the meter-type string used to tell a CT
/// meter from a direct meter: a value beginning with `"685"` here means
/// the currents on this frame are CT-scaled. The same triple is already
/// mapped to `FIELD_METER_TYPE` elsewhere in the field table.
const METER_TYPE_CDE: &str = "96.1.1";

fn full_obis_string(obis: &ObisCode) -> String {
    format!("{}", obis)
}

/// Scaling exponent for a register, given whether the frame's meter was
/// detected as a CT meter. Current registers scale ×10⁻³ on a CT meter,
/// ×10⁻² otherwise; power totals always scale ×10¹.
fn scaling_for(full_obis: &str, is_ct_meter: bool) -> Option<i32> {
    match full_obis {
        "1.1.31.7.0.255" | "1.1.51.7.0.255" | "1.1.71.7.0.255" => Some(if is_ct_meter { -3 } else { -2 }),
        "1.1.1.8.0.255" | "1.1.2.8.0.255" | "1.1.3.8.0.255" | "1.1.4.8.0.255" => Some(1),
        _ => None,
    }
}

fn read_obis(cursor: &mut Cursor) -> HanResult<ObisCode> {
    cursor.expect_u8(TAG_OCTET_STRING, "OBIS field type")?;
    cursor.expect_u8(6, "OBIS field length")?;
    let bytes = cursor.take(6)?;
    Ok(ObisCode::from_bytes([bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]]))
}

struct Element {
    obis: Option<ObisCode>,
    value: CosemValue,
}

fn read_element(cursor: &mut Cursor) -> HanResult<Element> {
    let obis = if cursor.peek_u8()? == TAG_OCTET_STRING {
        Some(read_obis(cursor)?)
    } else {
        None
    };

    let value = if cursor.peek_u8()? == TAG_OCTET_STRING {
        cursor.u8()?; // octet_string tag
        let len = cursor.u8()?;
        if len != CosemDateTime::LENGTH as u8 {
            return Err(han_core::HanError::Decode("unexpected octet-string length for date/time".into()));
        }
        let bytes = cursor.take(CosemDateTime::LENGTH)?;
        CosemValue::OctetString(bytes.to_vec())
    } else {
        decode_value(cursor)?
    };

    Ok(Element { obis, value })
}

/// Consume zero or more inter-element null-data (tag 0x00) octets. Real
/// frames pad between elements with these; they carry no field of
/// their own and must not be mistaken for a `Null`-valued element.
fn skip_null_tags(cursor: &mut Cursor) -> HanResult<()> {
    while cursor.remaining() > 0 && cursor.peek_u8()? == TAG_NULL {
        cursor.u8()?;
    }
    Ok(())
}

fn to_record_value(value: &CosemValue) -> HanResult<RecordValue> {
    match value {
        CosemValue::OctetString(bytes) if bytes.len() == CosemDateTime::LENGTH => {
            Ok(RecordValue::Timestamp(CosemDateTime::decode(bytes)?.to_iso8601()))
        }
        CosemValue::VisibleString(s) => Ok(RecordValue::Text(s.clone())),
        other => other
            .as_integer()
            .map(RecordValue::Integer)
            .ok_or_else(|| han_core::HanError::Decode("unsupported Kamstrup element value".into())),
    }
}

/// Decode a Kamstrup LLC PDU notification body into a canonical record.
/// Parsing is greedy: elements are read until the body is exhausted or
/// a partial, undecodable element is hit (trailing padding).
pub fn decode_notification_body(body: &[u8], apdu_datetime: Option<&CosemDateTime>) -> HanResult<Record> {
    let mut cursor = Cursor::new(body);
    cursor.expect_u8(TAG_STRUCTURE, "notification body")?;
    cursor.u8()?; // declared length, not used: parsing is greedy

    let mut elements = Vec::new();
    loop {
        skip_null_tags(&mut cursor)?;
        if cursor.remaining() == 0 {
            break;
        }
        let checkpoint = cursor;
        match read_element(&mut cursor) {
            Ok(element) => elements.push(element),
            Err(_) => {
                cursor = checkpoint;
                break;
            }
        }
    }

    let is_ct_meter = elements.iter().any(|element| {
        element.obis.as_ref().map(ObisCode::to_cde_string).as_deref() == Some(METER_TYPE_CDE)
            && element.value.as_visible_string().is_some_and(|s| s.starts_with("685"))
    });

    let mut record = Record::new();
    record.insert(FIELD_METER_MANUFACTURER.to_string(), RecordValue::Text("Kamstrup".to_string()));
    if let Some(dt) = apdu_datetime {
        record.insert(FIELD_METER_DATETIME.to_string(), RecordValue::Timestamp(dt.to_iso8601()));
    }

    for element in &elements {
        let field_name = match &element.obis {
            Some(obis) => {
                let cde = obis.to_cde_string();
                canonical_name_for_cde(&cde).map(str::to_string).unwrap_or(cde)
            }
            None => FIELD_LIST_VER_ID.to_string(),
        };

        let mut record_value = to_record_value(&element.value)?;
        if let (Some(obis), RecordValue::Integer(n)) = (&element.obis, &record_value) {
            if let Some(scale) = scaling_for(&full_obis_string(obis), is_ct_meter) {
                record_value = RecordValue::Float(*n as f64 * 10f64.powi(scale));
            }
        }
        record.insert(field_name, record_value);
    }

    Ok(record)
}
