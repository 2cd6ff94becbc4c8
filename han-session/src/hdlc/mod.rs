//! Incremental HDLC frame assembly (IEC 62056-46).

pub mod fcs;
pub mod frame;
pub mod reader;

pub use fcs::FcsCalc;
pub use frame::HdlcFrame;
pub use reader::HdlcReader;
