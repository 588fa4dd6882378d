//! Message parts
//!
//! A part is a payload plus metadata. The payload is an opaque byte string;
//! parts with JSON payloads can expose a parsed structured view that is
//! computed once and shared across processors.

use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use serde_json::Value;

use crate::Metadata;

/// A single payload with its metadata
///
/// Parts are immutable by convention once attached to an in-flight
/// transaction: a processor that "modifies" a part produces a new one, so
/// branches created at fan-out points never observe each other's changes.
#[derive(Clone, Default)]
pub struct Part {
    data: Bytes,
    metadata: Metadata,
    structured: OnceLock<Option<Arc<Value>>>,
}

impl Part {
    /// Create a part from payload bytes
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            metadata: Metadata::new(),
            structured: OnceLock::new(),
        }
    }

    /// Create a part from payload bytes and metadata
    pub fn with_metadata(data: impl Into<Bytes>, metadata: Metadata) -> Self {
        Self {
            data: data.into(),
            metadata,
            structured: OnceLock::new(),
        }
    }

    /// Create a part from a structured value, seeding the parsed view
    ///
    /// The payload is the compact JSON serialization of the value; callers
    /// reading `structured()` afterwards pay no parse cost.
    pub fn from_structured(value: Value) -> Self {
        let data = Bytes::from(serde_json::to_vec(&value).unwrap_or_default());
        let structured = OnceLock::new();
        let _ = structured.set(Some(Arc::new(value)));
        Self {
            data,
            metadata: Metadata::new(),
            structured,
        }
    }

    /// The payload bytes
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// The payload as a byte slice
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Replace the payload, invalidating any cached structured view
    pub fn set_data(&mut self, data: impl Into<Bytes>) {
        self.data = data.into();
        self.structured = OnceLock::new();
    }

    /// The part's metadata
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Mutable access to the part's metadata
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// The parsed structured view of the payload, if it is valid JSON
    ///
    /// Parsed at most once per part; clones of the part share the cached
    /// result. Returns `None` for non-JSON payloads.
    pub fn structured(&self) -> Option<&Arc<Value>> {
        self.structured
            .get_or_init(|| serde_json::from_slice(&self.data).ok().map(Arc::new))
            .as_ref()
    }

    /// Copy the part so downstream metadata writes cannot reach the original
    ///
    /// Payload bytes are immutable and stay reference-shared; the metadata
    /// map is copied eagerly.
    pub fn deep_copy(&self) -> Part {
        Part {
            data: self.data.clone(),
            metadata: self.metadata.clone(),
            structured: self.structured.clone(),
        }
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for Part {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Part")
            .field("bytes", &self.data.len())
            .field("metadata", &self.metadata.len())
            .finish()
    }
}
