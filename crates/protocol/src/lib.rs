//! Weir Protocol - Core types that flow through the pipeline
//!
//! This crate provides the foundational types every other weir crate builds
//! on:
//! - `Part` - A payload (`bytes::Bytes`) plus ordered metadata, with a lazily
//!   parsed structured view for JSON payloads
//! - `Message` - An ordered sequence of parts
//! - `Transaction` - A message coupled with a single-use response channel and
//!   a shutdown signal; the unit of transport between stages
//! - `Error` - The response error kinds every component interprets
//!
//! # Design Principles
//!
//! - **Zero-copy**: payloads are reference-counted `Bytes`; cloning a message
//!   never copies payload data
//! - **Immutable in flight**: a part attached to a transaction is only
//!   replaced, never mutated, by downstream components
//! - **One primitive**: the transaction's response channel is the only
//!   acknowledgement and backpressure mechanism in the engine
//!
//! # Example
//!
//! ```
//! use weir_protocol::{Message, Part, Transaction};
//! use tokio_util::sync::CancellationToken;
//!
//! let mut message = Message::new();
//! message.push(Part::new("hello world"));
//!
//! let (txn, mut response) = Transaction::new(message, CancellationToken::new());
//! txn.resolve(Ok(()));
//! assert_eq!(response.try_recv().unwrap(), Ok(()));
//! ```

mod error;
mod message;
mod metadata;
mod part;
mod transaction;
mod value;

pub use error::{Error, Response};
pub use message::Message;
pub use metadata::Metadata;
pub use part::Part;
pub use transaction::{
    ResponseRx, Transaction, TransactionRx, TransactionTx, transaction_channel,
};
pub use value::lookup_path;

// Re-export bytes for convenience
pub use bytes::Bytes;

/// Default capacity for inter-stage transaction channels
///
/// Channels are deliberately small so a slow consumer transparently slows
/// the whole pipeline instead of accumulating in-flight messages.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// Metadata keys with this prefix are reserved for engine-internal use
pub const RESERVED_METADATA_PREFIX: &str = "_";

#[cfg(test)]
mod message_test;
