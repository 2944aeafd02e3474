//! QAPI to protobuf translator — turn QEMU's `qapi/*.json` schema files into
//! proto3 messages, enums, and an RPC service.
//!
//! QAPI documents are JSON-like (single-quoted strings, `#` comments, several
//! top-level objects per file) and carry their documentation in `##`-fenced
//! comment blocks. For each document, structs become messages and enums
//! become enums, with the documentation carried over as `//` comments.
//! Commands and events are collected across all documents into a single
//! `service.proto` and `events.proto`.
//!
//! # Translating a QEMU tree
//!
//! ```no_run
//! use qapi2proto::Qapi2Proto;
//!
//! let output = Qapi2Proto::new().generate("qemu/", "proto/")?;
//! for file in &output.files {
//!     println!("wrote {}", file.name);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Translating a single document
//!
//! ```
//! use qapi2proto::Qapi2Proto;
//!
//! let output = Qapi2Proto::new()
//!     .translate_str_named("{ 'enum': 'Color', 'data': [ 'red', 'green' ] }", "color.json")?;
//! let color = output.file("color.proto").unwrap();
//! assert!(color.contents.ends_with("enum Color {\n\tred = 0;\n\tgreen = 1;\n}\n\n"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Error handling
//!
//! All fallible methods return [`miette::Result`]. Decode errors carry a
//! source span into the normalized document and render with `{:?}`.

pub mod compiler;
pub mod doc_comments;
pub mod error;
pub mod model;
pub mod reader;
pub mod registry;
pub mod translate;

// Re-export the small number of public API at the crate root.
pub use compiler::{ProtoFile, ProtoOutput, Qapi2Proto, SchemaDocument};
