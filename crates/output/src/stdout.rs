//! Standard output connector

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWriteExt, Stdout};
use weir_protocol::{Error, Message};

use crate::Writer;

/// Configuration for the stdout output
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StdoutOutputConfig {}

/// Writes each part as one newline-terminated line on standard output
pub struct StdoutWriter {
    stdout: Option<Stdout>,
}

impl StdoutWriter {
    pub fn new(_conf: &StdoutOutputConfig) -> Self {
        Self { stdout: None }
    }
}

#[async_trait]
impl Writer for StdoutWriter {
    async fn connect(&mut self) -> Result<(), Error> {
        if self.stdout.is_none() {
            self.stdout = Some(tokio::io::stdout());
        }
        Ok(())
    }

    async fn write(&mut self, msg: &Message) -> Result<(), Error> {
        let stdout = self.stdout.as_mut().ok_or(Error::NotConnected)?;
        for part in msg.iter() {
            stdout.write_all(part.as_slice()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.flush().await?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut stdout) = self.stdout.take() {
            let _ = stdout.flush().await;
        }
    }
}
