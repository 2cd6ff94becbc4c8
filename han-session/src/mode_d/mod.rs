//! IEC 62056-21 Mode D ("P1") ASCII readout assembly and decoding.

pub mod crc16;
pub mod dataset;
pub mod decode;
pub mod ident;
pub mod reader;
pub mod readout;

pub use dataset::{DataSet, DataSetValue};
pub use decode::{decode_p1_readout, decode_p1_readout_content, parse_p1_readout_content, FieldValue};
pub use ident::Ident;
pub use reader::ModeDReader;
pub use readout::DataReadout;
