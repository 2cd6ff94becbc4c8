//! Ready-made [`ConnectionFactory`] implementations for the two
//! transports `han-transport` supports.

use async_trait::async_trait;

use han_client::ConnectionFactory;
use han_core::HanResult;
use han_transport::{ByteSource, SerialByteSource, SerialSettings, TcpByteSource, TcpSettings};

/// Connects over TCP, e.g. to a serial-to-TCP bridge exposing a
/// meter's HAN port.
pub struct TcpConnectionFactory {
    settings: TcpSettings,
}

impl TcpConnectionFactory {
    pub fn new(settings: TcpSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ConnectionFactory for TcpConnectionFactory {
    async fn connect(&self) -> HanResult<Box<dyn ByteSource>> {
        Ok(Box::new(TcpByteSource::new(self.settings.clone())))
    }
}

/// Connects over a local serial port.
pub struct SerialConnectionFactory {
    settings: SerialSettings,
}

impl SerialConnectionFactory {
    pub fn new(settings: SerialSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ConnectionFactory for SerialConnectionFactory {
    async fn connect(&self) -> HanResult<Box<dyn ByteSource>> {
        Ok(Box::new(SerialByteSource::new(self.settings.clone())))
    }
}
