//! Serial-port byte source — the common case: a meter's HAN/P1 port
//! wired directly to the host.

use crate::stream::ByteSource;
use async_trait::async_trait;
use han_core::{HanError, HanResult};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

struct DebugSerialStream(SerialStream);

impl fmt::Debug for DebugSerialStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialStream").finish()
    }
}

impl Deref for DebugSerialStream {
    type Target = SerialStream;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DebugSerialStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Serial byte source settings.
#[derive(Debug, Clone)]
pub struct SerialSettings {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: tokio_serial::DataBits,
    pub stop_bits: tokio_serial::StopBits,
    pub parity: tokio_serial::Parity,
    pub flow_control: tokio_serial::FlowControl,
    pub timeout: Option<Duration>,
}

impl SerialSettings {
    pub fn new(port_name: String, baud_rate: u32) -> Self {
        Self {
            port_name,
            baud_rate,
            data_bits: tokio_serial::DataBits::Eight,
            stop_bits: tokio_serial::StopBits::One,
            parity: tokio_serial::Parity::None,
            flow_control: tokio_serial::FlowControl::None,
            timeout: Some(Duration::from_secs(30)),
        }
    }

    pub fn with_timeout(port_name: String, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::new(port_name, baud_rate)
        }
    }
}

/// Serial byte source.
#[derive(Debug)]
pub struct SerialByteSource {
    stream: Option<DebugSerialStream>,
    settings: SerialSettings,
    closed: bool,
}

impl SerialByteSource {
    pub fn new(settings: SerialSettings) -> Self {
        Self {
            stream: None,
            settings,
            closed: true,
        }
    }

    pub fn new_simple(port_name: String, baud_rate: u32) -> Self {
        Self::new(SerialSettings::new(port_name, baud_rate))
    }
}

#[async_trait]
impl ByteSource for SerialByteSource {
    async fn open(&mut self) -> HanResult<()> {
        if !self.closed {
            return Err(HanError::InvalidData("connection has already been opened".into()));
        }

        let builder = tokio_serial::new(&self.settings.port_name, self.settings.baud_rate)
            .data_bits(self.settings.data_bits)
            .stop_bits(self.settings.stop_bits)
            .parity(self.settings.parity)
            .flow_control(self.settings.flow_control);

        let stream = SerialStream::open(&builder).map_err(|e| {
            HanError::Connection(std::io::Error::other(format!("failed to open serial port: {}", e)))
        })?;

        self.stream = Some(DebugSerialStream(stream));
        self.closed = false;
        Ok(())
    }

    async fn set_timeout(&mut self, timeout: Option<Duration>) -> HanResult<()> {
        self.settings.timeout = timeout;
        Ok(())
    }

    async fn read_chunk(&mut self, buf: &mut [u8]) -> HanResult<usize> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| HanError::InvalidData("serial stream not connected".into()))?;

        let result = if let Some(timeout) = self.settings.timeout {
            tokio::time::timeout(timeout, stream.read(buf))
                .await
                .map_err(|_| HanError::Timeout)?
                .map_err(HanError::Connection)
        } else {
            stream.read(buf).await.map_err(HanError::Connection)
        };

        match result {
            Ok(0) => {
                self.closed = true;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e) => {
                self.closed = true;
                Err(e)
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> HanResult<()> {
        self.stream = None;
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_use_8n1_by_default() {
        let settings = SerialSettings::new("/dev/ttyUSB0".to_string(), 2400);
        assert_eq!(settings.port_name, "/dev/ttyUSB0");
        assert_eq!(settings.baud_rate, 2400);
        assert_eq!(settings.parity, tokio_serial::Parity::None);
    }

    #[test]
    fn unopened_source_is_closed() {
        let source = SerialByteSource::new_simple("/dev/ttyUSB0".to_string(), 2400);
        assert!(source.is_closed());
    }
}
