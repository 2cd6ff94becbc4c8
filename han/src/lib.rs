//! Residential electricity-meter HAN/P1 ingest pipeline.
//!
//! Re-exports the public surface of the workspace's layered crates and
//! provides [`pipeline::spawn_hdlc_pipeline`]/[`pipeline::spawn_p1_pipeline`]
//! to wire transport, frame reader, decoder and output queue together
//! in one call.

pub mod factories;
pub mod pipeline;

pub use factories::{SerialConnectionFactory, TcpConnectionFactory};
pub use han_client::{
    BackOffStrategy, ConnectionCloser, ConnectionFactory, ConnectionManager, ExponentialBackOff,
    FrameAssembler, HdlcContentAssembler, ModeDAssembler, RawApduAssembler, RawHdlcAssembler,
};
pub use han_core::{fields, obis_catalog, HanError, HanResult, ObisCode};
pub use han_cosem::{AutoDecoder, Record, RecordValue};
pub use han_session::{hdlc, mode_d};
pub use han_transport::{ByteSource, SerialByteSource, SerialSettings, TcpByteSource, TcpSettings};

pub use pipeline::{spawn_hdlc_pipeline, spawn_p1_pipeline, spawn_raw_apdu_pipeline};
