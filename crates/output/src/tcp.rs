//! TCP client connector

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use weir_protocol::{Error, Message};

use crate::Writer;

/// Configuration for the tcp output
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TcpOutputConfig {
    /// Remote address to connect to (host:port)
    pub address: String,
}

impl Default for TcpOutputConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:4195".to_string(),
        }
    }
}

/// Writes each part as one newline-terminated line to a remote host
///
/// Any stream failure surfaces as `NotConnected`, so the adaptor re-dials
/// and retries the whole message.
pub struct TcpWriter {
    address: String,
    stream: Option<TcpStream>,
}

impl TcpWriter {
    /// Build from configuration; an address is required
    pub fn new(conf: &TcpOutputConfig) -> Result<Self, crate::Error> {
        if conf.address.is_empty() {
            return Err(crate::Error::Config(
                "tcp output requires an address".to_string(),
            ));
        }
        Ok(Self {
            address: conf.address.clone(),
            stream: None,
        })
    }
}

#[async_trait]
impl Writer for TcpWriter {
    async fn connect(&mut self) -> Result<(), Error> {
        if self.stream.is_some() {
            return Ok(());
        }
        let stream = TcpStream::connect(&self.address)
            .await
            .map_err(|_| Error::NotConnected)?;
        self.stream = Some(stream);
        Ok(())
    }

    async fn write(&mut self, msg: &Message) -> Result<(), Error> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        let result: std::io::Result<()> = async {
            for part in msg.iter() {
                stream.write_all(part.as_slice()).await?;
                stream.write_all(b"\n").await?;
            }
            stream.flush().await
        }
        .await;

        if result.is_err() {
            self.stream = None;
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
    }
}
