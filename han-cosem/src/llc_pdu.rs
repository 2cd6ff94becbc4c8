//! LLC PDU / APDU framing that wraps every vendor's notification body.
//!
//! Layout: `dsap(1) ssap(1) control(1) Tag(1) LongInvokeIdAndPriority(4)
//! [DateTime] notification_body(...)`.

use han_core::datatypes::CosemDateTime;
use han_core::{HanError, HanResult};

use crate::cursor::Cursor;
use crate::value::TAG_NULL;

/// The 4-byte bit-packed invoke-id-and-priority field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongInvokeIdAndPriority(u32);

impl LongInvokeIdAndPriority {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn invoke_id(&self) -> u32 {
        self.0 >> 8
    }

    pub fn is_self_descriptive(&self) -> bool {
        self.0 & 0b0000_1000 != 0
    }

    pub fn breaks_on_error(&self) -> bool {
        self.0 & 0b0000_0100 != 0
    }

    pub fn is_confirmed(&self) -> bool {
        self.0 & 0b0000_0010 != 0
    }

    pub fn is_high_priority(&self) -> bool {
        self.0 & 0b0000_0001 != 0
    }
}

/// A parsed LLC PDU, with `notification_body` left as raw bytes for the
/// vendor-specific grammar to decode.
pub struct LlcPdu<'a> {
    pub dsap: u8,
    pub ssap: u8,
    pub control: u8,
    pub apdu_tag: u8,
    pub long_invoke_id_and_priority: LongInvokeIdAndPriority,
    pub datetime: Option<CosemDateTime>,
    pub notification_body: &'a [u8],
}

impl<'a> LlcPdu<'a> {
    pub fn parse(frame_content: &'a [u8]) -> HanResult<Self> {
        let mut cursor = Cursor::new(frame_content);

        let dsap = cursor.u8()?;
        let ssap = cursor.u8()?;
        let control = cursor.u8()?;
        let apdu_tag = cursor.u8()?;
        let long_invoke_id_and_priority = LongInvokeIdAndPriority::from_raw(cursor.u32()?);

        let datetime = Self::parse_optional_datetime(&mut cursor)?;

        let notification_body = &frame_content[cursor.position()..];
        Ok(Self {
            dsap,
            ssap,
            control,
            apdu_tag,
            long_invoke_id_and_priority,
            datetime,
            notification_body,
        })
    }

    fn parse_optional_datetime(cursor: &mut Cursor) -> HanResult<Option<CosemDateTime>> {
        let peek = cursor.peek_u8()?;

        if peek == TAG_NULL {
            cursor.u8()?;
            return Ok(None);
        }

        if peek == crate::value::TAG_OCTET_STRING {
            cursor.u8()?;
        }
        // Either the octet-string tag has just been consumed, or this
        // meter omits it and goes straight to the length-prefixed date
        // bytes: both forms are `length(1) + data(12)` from here.
        let len = cursor.u8()?;
        if len != CosemDateTime::LENGTH as u8 {
            return Err(HanError::Decode(format!(
                "unexpected octet-string length {} for APDU date/time field",
                len
            )));
        }
        let bytes = cursor.take(CosemDateTime::LENGTH)?;
        Ok(Some(CosemDateTime::decode(bytes)?))
    }
}
