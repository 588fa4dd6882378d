//! Part compression

use std::io::{Read, Write};

use flate2::Compression;
use weir_metrics::{Metrics, event};
use weir_protocol::{Message, Part};

use crate::{CompressConfig, Error, Processor, ProcessorOutput, resolve_targets};

/// Supported compression algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Algorithm {
    Gzip,
    Zlib,
    Deflate,
}

impl Algorithm {
    pub(crate) fn parse(name: &str) -> Result<Self, Error> {
        match name {
            "gzip" => Ok(Self::Gzip),
            "zlib" => Ok(Self::Zlib),
            "deflate" => Ok(Self::Deflate),
            other => Err(Error::UnknownAlgorithm(other.to_string())),
        }
    }

    pub(crate) fn compress(self, level: u32, data: &[u8]) -> std::io::Result<Vec<u8>> {
        let level = Compression::new(level.min(9));
        match self {
            Self::Gzip => {
                let mut encoder = flate2::write::GzEncoder::new(Vec::new(), level);
                encoder.write_all(data)?;
                encoder.finish()
            }
            Self::Zlib => {
                let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), level);
                encoder.write_all(data)?;
                encoder.finish()
            }
            Self::Deflate => {
                let mut encoder = flate2::write::DeflateEncoder::new(Vec::new(), level);
                encoder.write_all(data)?;
                encoder.finish()
            }
        }
    }

    pub(crate) fn decompress(self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            Self::Gzip => {
                flate2::read::GzDecoder::new(data).read_to_end(&mut out)?;
            }
            Self::Zlib => {
                flate2::read::ZlibDecoder::new(data).read_to_end(&mut out)?;
            }
            Self::Deflate => {
                flate2::read::DeflateDecoder::new(data).read_to_end(&mut out)?;
            }
        }
        Ok(out)
    }
}

/// Compresses targeted parts of a message
///
/// Parts that fail to compress are removed from the message; if nothing
/// remains the message is skipped with a success response.
pub struct Compress {
    algorithm: Algorithm,
    level: u32,
    parts: Vec<isize>,
    metrics: Metrics,
}

impl Compress {
    /// Build from configuration
    pub fn new(conf: &CompressConfig, metrics: &Metrics) -> Result<Self, Error> {
        Ok(Self {
            algorithm: Algorithm::parse(&conf.algorithm)?,
            level: conf.level,
            parts: conf.parts.clone(),
            metrics: metrics.child("compress"),
        })
    }
}

impl Processor for Compress {
    fn process(&self, msg: Message) -> ProcessorOutput {
        self.metrics.incr(event::COUNT);

        let targets = resolve_targets(&msg, &self.parts);
        let mut out = Message::new();
        for (index, part) in msg.iter().enumerate() {
            if !targets.contains(&index) {
                out.push(part.clone());
                continue;
            }
            match self.algorithm.compress(self.level, part.as_slice()) {
                Ok(converted) => {
                    self.metrics.incr(event::SUCCESS);
                    out.push(Part::with_metadata(converted, part.metadata().clone()));
                }
                Err(err) => {
                    self.metrics.incr(event::ERROR);
                    tracing::warn!(error = %err, part = index, "failed to compress part");
                }
            }
        }

        if out.is_empty() {
            self.metrics.incr(event::SKIPPED);
            return (Vec::new(), Some(Ok(())));
        }
        self.metrics.incr(event::SENT);
        (vec![out], None)
    }

    fn name(&self) -> &'static str {
        "compress"
    }
}
