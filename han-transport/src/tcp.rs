//! TCP byte source — e.g. a serial-to-TCP bridge exposing the meter's
//! HAN port on the network.

use crate::stream::ByteSource;
use async_trait::async_trait;
use han_core::{HanError, HanResult};
use std::fmt;
use std::net::SocketAddr;
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

struct DebugTcpStream(TcpStream);

impl fmt::Debug for DebugTcpStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpStream").finish()
    }
}

impl Deref for DebugTcpStream {
    type Target = TcpStream;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DebugTcpStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// TCP byte source settings.
#[derive(Debug, Clone)]
pub struct TcpSettings {
    pub address: SocketAddr,
    pub timeout: Option<Duration>,
}

impl TcpSettings {
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            timeout: Some(Duration::from_secs(30)),
        }
    }

    pub fn with_timeout(address: SocketAddr, timeout: Duration) -> Self {
        Self {
            address,
            timeout: Some(timeout),
        }
    }
}

/// TCP byte source.
#[derive(Debug)]
pub struct TcpByteSource {
    stream: Option<DebugTcpStream>,
    settings: TcpSettings,
    closed: bool,
}

impl TcpByteSource {
    pub fn new(settings: TcpSettings) -> Self {
        Self {
            stream: None,
            settings,
            closed: true,
        }
    }

    pub fn from_address(address: &str) -> HanResult<Self> {
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| HanError::InvalidData(format!("invalid TCP address: {}", e)))?;
        Ok(Self::new(TcpSettings::new(addr)))
    }
}

#[async_trait]
impl ByteSource for TcpByteSource {
    async fn open(&mut self) -> HanResult<()> {
        if !self.closed {
            return Err(HanError::InvalidData("connection has already been opened".into()));
        }

        let stream = if let Some(timeout) = self.settings.timeout {
            tokio::time::timeout(timeout, TcpStream::connect(self.settings.address))
                .await
                .map_err(|_| HanError::Timeout)?
                .map_err(HanError::Connection)?
        } else {
            TcpStream::connect(self.settings.address)
                .await
                .map_err(HanError::Connection)?
        };

        self.stream = Some(DebugTcpStream(stream));
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
            .ok_or_else(|| HanError::InvalidData("TCP stream not connected".into()))?;

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
        if let Some(mut stream) = self.stream.take() {
            use tokio::io::AsyncWriteExt;
            let _ = stream.shutdown().await;
        }
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn settings_default_to_a_thirty_second_timeout() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let settings = TcpSettings::new(addr);
        assert_eq!(settings.address, addr);
        assert!(settings.timeout.is_some());
    }

    #[tokio::test]
    async fn unopened_source_is_closed() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let source = TcpByteSource::new(TcpSettings::new(addr));
        assert!(source.is_closed());
    }
}
