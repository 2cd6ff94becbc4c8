//! COSEM notification body decoders: Aidon, Kaifa and Kamstrup wire
//! grammars, plus the LLC PDU framing they all share and an
//! [`auto_decoder::AutoDecoder`] that picks among them.

pub mod aidon;
pub mod auto_decoder;
pub mod cursor;
pub mod kaifa;
pub mod kamstrup;
pub mod llc_pdu;
pub mod record;
pub mod value;

pub use auto_decoder::AutoDecoder;
pub use llc_pdu::LlcPdu;
pub use record::{Record, RecordValue};
pub use value::CosemValue;
