//! File connector

use std::collections::VecDeque;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use weir_protocol::{Error, Message};

use crate::{Reader, lines};

/// Configuration for the file input
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FileInputConfig {
    /// Files to read, consumed in order
    pub paths: Vec<PathBuf>,

    /// Group blank-line-delimited runs of lines into multi-part messages
    pub multipart: bool,

    /// Accumulate up to this many parts per message
    pub max_batch_count: usize,
}

/// Reads newline-delimited messages from a list of files
///
/// Files are consumed in order; exhausting the last one is terminal.
pub struct FileReader {
    pending: VecDeque<PathBuf>,
    current: Option<Lines<BufReader<File>>>,
    multipart: bool,
}

impl FileReader {
    /// Build from configuration; at least one path is required
    pub fn new(conf: &FileInputConfig) -> Result<Self, crate::Error> {
        if conf.paths.is_empty() {
            return Err(crate::Error::Config(
                "file input requires at least one path".to_string(),
            ));
        }
        Ok(Self {
            pending: conf.paths.iter().cloned().collect(),
            current: None,
            multipart: conf.multipart,
        })
    }
}

#[async_trait]
impl Reader for FileReader {
    async fn connect(&mut self) -> Result<(), Error> {
        Ok(())
    }

    async fn read(&mut self) -> Result<Message, Error> {
        loop {
            if self.current.is_none() {
                let Some(path) = self.pending.pop_front() else {
                    return Err(Error::TypeClosed);
                };
                let file = File::open(&path).await.map_err(|err| {
                    Error::fatal(format!("failed to open {}: {err}", path.display()))
                })?;
                self.current = Some(BufReader::new(file).lines());
            }

            let lines = self.current.as_mut().ok_or(Error::NotConnected)?;
            match lines::next_message(lines, self.multipart).await? {
                Some(msg) => return Ok(msg),
                None => self.current = None,
            }
        }
    }

    async fn acknowledge(&mut self, _err: Option<&Error>) -> Result<(), Error> {
        Ok(())
    }

    async fn close(&mut self) {
        self.current = None;
        self.pending.clear();
    }
}
