//! A streaming redactor/filter for JVM heap dumps in the HPROF binary
//! format ("JAVA PROFILE 1.0.2", as emitted by HotSpot).
//!
//! [pipeline::filter] (or the instance-based [pipeline::HprofFilter])
//! reads an HPROF file in two passes and writes a second HPROF file in
//! which selected payload values -- UTF-8 symbol strings and/or
//! primitive field/static/constant-pool/array values -- have been
//! replaced by a pluggable [transform::Transformer], while every
//! structural detail (class/field/method metadata, object graph
//! topology, instance layout, record framing) is left exactly as it
//! was so that standard HPROF analyzers read the output identically.
//!
//! # Examples
//!
//! Redacting a heap dump with the built-in zeroing policy:
//!
//! ```no_run
//! use hprof_redact::pipeline::{filter, PathSource};
//! use hprof_redact::policies::Zero;
//! use std::fs::File;
//!
//! let source = PathSource::new("input.hprof");
//! let mut output = File::create("redacted.hprof").unwrap();
//! filter(&source, &mut output, &Zero).unwrap();
//! ```

pub mod byteio;
pub mod error;
pub mod gzip;
pub mod heap_dump;
pub mod id;
pub mod metadata;
pub mod mutf8;
pub mod namekind;
pub mod pipeline;
pub mod policies;
pub mod primitive;
pub mod record;
pub mod transform;
pub mod verbose;

pub use error::{HprofRedactError, Result};
pub use id::{Id, IdSize, Serial};
pub use transform::Transformer;
