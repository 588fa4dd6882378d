//! Standard input connector

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use weir_protocol::{Error, Message};

use crate::{Reader, lines};

/// Configuration for the stdin input
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StdinConfig {
    /// Group blank-line-delimited runs of lines into multi-part messages
    pub multipart: bool,

    /// Accumulate up to this many parts per message
    pub max_batch_count: usize,
}

impl Default for StdinConfig {
    fn default() -> Self {
        Self {
            multipart: false,
            max_batch_count: 1,
        }
    }
}

/// Reads newline-delimited messages from standard input
///
/// End of input is terminal: the adaptor observes `TypeClosed` and shuts
/// the input down, which propagates a clean exit through the engine.
pub struct StdinReader {
    lines: Option<Lines<BufReader<Stdin>>>,
    multipart: bool,
}

impl StdinReader {
    pub fn new(conf: &StdinConfig) -> Self {
        Self {
            lines: None,
            multipart: conf.multipart,
        }
    }
}

#[async_trait]
impl Reader for StdinReader {
    async fn connect(&mut self) -> Result<(), Error> {
        if self.lines.is_none() {
            self.lines = Some(BufReader::new(tokio::io::stdin()).lines());
        }
        Ok(())
    }

    async fn read(&mut self) -> Result<Message, Error> {
        let lines = self.lines.as_mut().ok_or(Error::NotConnected)?;
        match lines::next_message(lines, self.multipart).await? {
            Some(msg) => Ok(msg),
            None => Err(Error::TypeClosed),
        }
    }

    async fn acknowledge(&mut self, _err: Option<&Error>) -> Result<(), Error> {
        Ok(())
    }

    async fn close(&mut self) {
        self.lines = None;
    }
}
