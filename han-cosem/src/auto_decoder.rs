//! Try each vendor grammar in turn until one decodes the frame.
//!
//! The previously-successful decoder is tried first on the next call,
//! since a single meter never switches vendor mid-stream; this turns
//! steady-state decoding into a single attempt instead of three.

use crate::llc_pdu::LlcPdu;
use crate::record::Record;
use crate::{aidon, kaifa, kamstrup};

const DECODER_NAMES: [&str; 3] = ["Aidon", "Kaifa", "Kamstrup"];

/// Decodes HDLC-framed LLC PDU payloads from any of the supported
/// vendor grammars, remembering which one last succeeded.
#[derive(Debug, Default)]
pub struct AutoDecoder {
    previous_success: Option<usize>,
}

impl AutoDecoder {
    pub fn new() -> Self {
        Self { previous_success: None }
    }

    /// The name of the decoder that last succeeded, if any.
    pub fn previous_success_decoder(&self) -> Option<&'static str> {
        self.previous_success.map(|i| DECODER_NAMES[i])
    }

    /// Decode an LLC PDU payload, returning the canonical record and
    /// which decoder produced it. Returns `None` if no decoder accepts
    /// the payload.
    pub fn decode_frame_content(&mut self, frame_content: &[u8]) -> Option<(&'static str, Record)> {
        let pdu = LlcPdu::parse(frame_content).ok()?;
        let start = self.previous_success.unwrap_or(0);

        for offset in 0..DECODER_NAMES.len() {
            let index = (offset + start) % DECODER_NAMES.len();
            let decoded = match index {
                0 => aidon::decode_notification_body(pdu.notification_body).ok(),
                1 => kaifa::decode_notification_body(pdu.notification_body, pdu.datetime.as_ref()).ok(),
                2 => kamstrup::decode_notification_body(pdu.notification_body, pdu.datetime.as_ref()).ok(),
                _ => unreachable!(),
            };
            if let Some(record) = decoded {
                self.previous_success = Some(index);
                return Some((DECODER_NAMES[index], record));
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordValue;
    use crate::value::{TAG_ARRAY, TAG_DOUBLE_LONG_UNSIGNED, TAG_OCTET_STRING, TAG_STRUCTURE};

    fn aidon_frame() -> Vec<u8> {
        let mut frame = vec![0xE6, 0xE6, 0x00, 0x0F, 0x00, 0x00, 0x00, 0x01, 0x00];
        let mut body = vec![TAG_ARRAY, 1, TAG_STRUCTURE, 2];
        body.extend_from_slice(&[TAG_OCTET_STRING, 6, 1, 1, 1, 7, 0, 255]);
        body.push(TAG_DOUBLE_LONG_UNSIGNED);
        body.extend_from_slice(&424u32.to_be_bytes());
        frame.extend_from_slice(&body);
        frame
    }

    #[test]
    fn decodes_aidon_frame_and_remembers_success() {
        let mut decoder = AutoDecoder::new();
        let (name, record) = decoder.decode_frame_content(&aidon_frame()).unwrap();
        assert_eq!(name, "Aidon");
        assert_eq!(record.get("active_power_import"), Some(&RecordValue::Integer(424)));
        assert_eq!(decoder.previous_success_decoder(), Some("Aidon"));

        let (name_again, _) = decoder.decode_frame_content(&aidon_frame()).unwrap();
        assert_eq!(name_again, "Aidon");
    }

    #[test]
    fn unrecognized_payload_decodes_to_none() {
        let mut decoder = AutoDecoder::new();
        let frame = vec![0xE6, 0xE6, 0x00, 0x0F, 0x00, 0x00, 0x00, 0x01, 0x00, 0xFF, 0xFF];
        assert!(decoder.decode_frame_content(&frame).is_none());
    }
}
