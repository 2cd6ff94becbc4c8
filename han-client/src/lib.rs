//! The meter ingest pipeline's Connection Manager: keeps a byte source
//! connected, reconnecting with back-off, and feeds assembled frames
//! to a bounded queue.

pub mod back_off;
pub mod connection_manager;
pub mod frame_assembler;

pub use back_off::{BackOffStrategy, ExponentialBackOff};
pub use connection_manager::{ConnectionCloser, ConnectionFactory, ConnectionManager};
pub use frame_assembler::{FrameAssembler, HdlcContentAssembler, ModeDAssembler, RawApduAssembler, RawHdlcAssembler};
