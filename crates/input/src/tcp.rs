//! TCP client connector

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::net::TcpStream;
use weir_protocol::{Error, Message};

use crate::{Reader, lines};

/// Configuration for the tcp input
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TcpInputConfig {
    /// Remote address to connect to (host:port)
    pub address: String,

    /// Group blank-line-delimited runs of lines into multi-part messages
    pub multipart: bool,

    /// Accumulate up to this many parts per message
    pub max_batch_count: usize,
}

impl Default for TcpInputConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:4195".to_string(),
            multipart: false,
            max_batch_count: 1,
        }
    }
}

/// Connects to a remote host and reads newline-delimited messages
///
/// Any stream failure, including a remote close, surfaces as `NotConnected`
/// so the adaptor re-dials. The constructor wraps this reader in a preserver
/// because a consumed line cannot be re-read from the socket.
pub struct TcpReader {
    address: String,
    lines: Option<Lines<BufReader<TcpStream>>>,
    multipart: bool,
}

impl TcpReader {
    /// Build from configuration; an address is required
    pub fn new(conf: &TcpInputConfig) -> Result<Self, crate::Error> {
        if conf.address.is_empty() {
            return Err(crate::Error::Config(
                "tcp input requires an address".to_string(),
            ));
        }
        Ok(Self {
            address: conf.address.clone(),
            lines: None,
            multipart: conf.multipart,
        })
    }
}

#[async_trait]
impl Reader for TcpReader {
    async fn connect(&mut self) -> Result<(), Error> {
        if self.lines.is_some() {
            return Ok(());
        }
        let stream = TcpStream::connect(&self.address)
            .await
            .map_err(|_| Error::NotConnected)?;
        self.lines = Some(BufReader::new(stream).lines());
        Ok(())
    }

    async fn read(&mut self) -> Result<Message, Error> {
        let lines = self.lines.as_mut().ok_or(Error::NotConnected)?;
        match lines::next_message(lines, self.multipart).await {
            Ok(Some(msg)) => Ok(msg),
            Ok(None) | Err(_) => {
                self.lines = None;
                Err(Error::NotConnected)
            }
        }
    }

    async fn acknowledge(&mut self, _err: Option<&Error>) -> Result<(), Error> {
        Ok(())
    }

    async fn close(&mut self) {
        self.lines = None;
    }
}
