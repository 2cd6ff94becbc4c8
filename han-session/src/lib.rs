//! Incremental byte-stream readers for the meter ingest pipeline.
//!
//! Two physical transports, two framings: [`hdlc`] assembles IEC
//! 62056-46 HDLC frames, [`mode_d`] assembles IEC 62056-21 Mode D
//! ("P1") ASCII readouts. Both readers accept arbitrarily-chunked
//! input and carry their state between calls.

pub mod hdlc;
pub mod mode_d;

pub use hdlc::{HdlcFrame, HdlcReader};
pub use mode_d::{DataReadout, ModeDReader};
