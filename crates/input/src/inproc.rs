//! In-process pipe connector

use crate::{Context, Input};

/// Attach to a named in-process pipe as an input
///
/// The pipe carries whole transactions, so acknowledgements resolve at the
/// original producer on the output side of the pipe; no adaptor is needed.
/// The manager keeps the pipe alive for the life of the process, so this
/// stream only ends at shutdown.
pub(crate) fn new_inproc_input(pipe: &str, ctx: &Context) -> Input {
    let rx = ctx.manager.pipe_receiver(pipe);
    tracing::debug!(pipe, "inproc input attached");
    Input::new("inproc", rx, ctx.cancel.clone(), Vec::new())
}
