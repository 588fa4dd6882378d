//! Pass-through processor

use weir_protocol::Message;

use crate::{Processor, ProcessorOutput};

/// Emits its input unchanged
///
/// Present in a pipeline, it is indistinguishable from being absent.
pub struct Noop;

impl Processor for Noop {
    fn process(&self, msg: Message) -> ProcessorOutput {
        (vec![msg], None)
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
