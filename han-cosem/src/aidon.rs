//! Aidon notification body: an array of self-describing structures,
//! each carrying its own OBIS code.

use han_core::datatypes::CosemDateTime;
use han_core::fields::{canonical_name_for_cde, FIELD_METER_MANUFACTURER};
use han_core::{HanError, HanResult, ObisCode};

use crate::cursor::Cursor;
use crate::record::{Record, RecordValue};
use crate::value::{self, TAG_ARRAY, TAG_ENUM, TAG_INTEGER, TAG_OCTET_STRING, TAG_STRUCTURE, TAG_VISIBLE_STRING};

fn read_obis(cursor: &mut Cursor) -> HanResult<ObisCode> {
    cursor.expect_u8(TAG_OCTET_STRING, "OBIS field type")?;
    cursor.expect_u8(6, "OBIS field length")?;
    let bytes = cursor.take(6)?;
    Ok(ObisCode::from_bytes([bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]]))
}

fn read_scaler_exponent(cursor: &mut Cursor) -> HanResult<i8> {
    cursor.expect_u8(TAG_STRUCTURE, "scaler-unit")?;
    cursor.expect_u8(2, "scaler-unit length")?;
    cursor.expect_u8(TAG_INTEGER, "scaler exponent type")?;
    let exponent = cursor.i8()?;
    cursor.expect_u8(TAG_ENUM, "scaler unit type")?;
    cursor.u8()?; // physical unit, not needed for scaling
    Ok(exponent)
}

struct Element {
    obis: ObisCode,
    value: RecordValue,
}

fn read_element(cursor: &mut Cursor) -> HanResult<Element> {
    cursor.expect_u8(TAG_STRUCTURE, "element")?;
    let len = cursor.u8()?;
    let obis = read_obis(cursor)?;
    let content_type = cursor.u8()?;

    let value = match content_type {
        TAG_VISIBLE_STRING => {
            let str_len = cursor.u8()? as usize;
            let bytes = cursor.take(str_len)?;
            RecordValue::Text(
                std::str::from_utf8(bytes)
                    .map_err(|_| HanError::Decode("visible-string is not utf8".into()))?
                    .to_string(),
            )
        }
        TAG_OCTET_STRING => {
            let date_len = cursor.u8()?;
            if date_len != CosemDateTime::LENGTH as u8 {
                return Err(HanError::Decode("unexpected octet-string length for date/time".into()));
            }
            let bytes = cursor.take(CosemDateTime::LENGTH)?;
            RecordValue::Timestamp(CosemDateTime::decode(bytes)?.to_iso8601())
        }
        other => {
            let unscaled = match other {
                value::TAG_DOUBLE_LONG_UNSIGNED => cursor.u32()? as i64,
                value::TAG_LONG => cursor.i16()? as i64,
                value::TAG_LONG_UNSIGNED => cursor.u16()? as i64,
                _ => return Err(HanError::Decode(format!("unsupported Aidon element type 0x{:02X}", other))),
            };
            if len >= 3 {
                let exponent = read_scaler_exponent(cursor)?;
                let scale = 10f64.powi(exponent as i32);
                let scaled = unscaled as f64 * scale;
                if scaled == unscaled as f64 {
                    RecordValue::Integer(unscaled)
                } else {
                    RecordValue::Float(scaled)
                }
            } else {
                RecordValue::Integer(unscaled)
            }
        }
    };

    Ok(Element { obis, value })
}

/// Decode an Aidon LLC PDU notification body into a canonical record.
pub fn decode_notification_body(body: &[u8]) -> HanResult<Record> {
    let mut cursor = Cursor::new(body);
    cursor.expect_u8(TAG_ARRAY, "notification body")?;
    let count = cursor.u8()?;

    let mut record = Record::new();
    record.insert(FIELD_METER_MANUFACTURER.to_string(), RecordValue::Text("Aidon".to_string()));

    for _ in 0..count {
        let element = read_element(&mut cursor)?;
        let cde = element.obis.to_cde_string();
        let name = canonical_name_for_cde(&cde).map(str::to_string).unwrap_or(cde);
        record.insert(name, element.value);
    }

    Ok(record)
}
