//! File connector

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use weir_protocol::{Error, Message};

use crate::Writer;

/// Configuration for the file output
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// File to append to; created if absent
    pub path: PathBuf,
}

/// Appends each part as one newline-terminated line
pub struct FileWriter {
    path: PathBuf,
    file: Option<File>,
}

impl FileWriter {
    /// Build from configuration; a path is required
    pub fn new(conf: &FileOutputConfig) -> Result<Self, crate::Error> {
        if conf.path.as_os_str().is_empty() {
            return Err(crate::Error::Config(
                "file output requires a path".to_string(),
            ));
        }
        Ok(Self {
            path: conf.path.clone(),
            file: None,
        })
    }
}

#[async_trait]
impl Writer for FileWriter {
    async fn connect(&mut self) -> Result<(), Error> {
        if self.file.is_some() {
            return Ok(());
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        self.file = Some(file);
        Ok(())
    }

    async fn write(&mut self, msg: &Message) -> Result<(), Error> {
        let file = self.file.as_mut().ok_or(Error::NotConnected)?;
        for part in msg.iter() {
            file.write_all(part.as_slice()).await?;
            file.write_all(b"\n").await?;
        }
        file.flush().await?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weir_protocol::Part;

    #[tokio::test]
    async fn test_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");

        let mut writer = FileWriter::new(&FileOutputConfig { path: path.clone() }).unwrap();
        writer.connect().await.unwrap();

        writer
            .write(&Message::from(Part::new("first")))
            .await
            .unwrap();
        let mut multi = Message::from(Part::new("second"));
        multi.push(Part::new("third"));
        writer.write(&multi).await.unwrap();
        writer.close().await;

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\nthird\n");
    }

    #[test]
    fn test_empty_path_rejected() {
        assert!(FileWriter::new(&FileOutputConfig::default()).is_err());
    }
}
