//! Physical byte sources for the meter ingest pipeline: TCP and serial,
//! behind a shared [`ByteSource`] trait.

pub mod serial;
pub mod stream;
pub mod tcp;

pub use serial::{SerialByteSource, SerialSettings};
pub use stream::ByteSource;
pub use tcp::{TcpByteSource, TcpSettings};
