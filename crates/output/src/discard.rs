//! Discarding connector

use async_trait::async_trait;
use weir_protocol::{Error, Message};

use crate::Writer;

/// Accepts and discards every message
///
/// Useful as a switch default and in tests: the drop is explicit, so the
/// upstream still receives a success acknowledgement.
pub struct DropWriter;

#[async_trait]
impl Writer for DropWriter {
    async fn connect(&mut self) -> Result<(), Error> {
        Ok(())
    }

    async fn write(&mut self, _msg: &Message) -> Result<(), Error> {
        Ok(())
    }

    async fn close(&mut self) {}
}
