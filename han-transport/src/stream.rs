//! Byte-chunk source trait shared by every physical transport.
//!
//! The pipeline only ever listens to a meter (writing to meters is out
//! of scope), so this is narrower than the teacher's `StreamAccessor`:
//! read, timeout, and lifecycle only.

use async_trait::async_trait;
use han_core::HanResult;
use std::time::Duration;

/// A byte-chunk source: a physical transport delivering raw bytes to
/// an incremental frame reader ([`han_session::hdlc::HdlcReader`] or
/// [`han_session::mode_d::ModeDReader`]).
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Open the physical connection.
    async fn open(&mut self) -> HanResult<()>;

    /// Set the read timeout. `None` means wait indefinitely.
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> HanResult<()>;

    /// Read whatever is available into `buf`, returning the number of
    /// bytes read, or `0` on a clean end-of-stream.
    async fn read_chunk(&mut self, buf: &mut [u8]) -> HanResult<usize>;

    /// Whether the underlying connection has already been torn down.
    fn is_closed(&self) -> bool;

    /// Close the physical connection.
    async fn close(&mut self) -> HanResult<()>;
}
