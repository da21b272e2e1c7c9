//! Infer a wire schema (messages, fields, nested and map entry types) from an
//! introspector's description of a type graph.
//!
//! ```no_run
//! use proto_osi::{catalog::Catalog, inference::Inference};
//!
//! let catalog = Catalog::load("team.json".as_ref())?;
//! let root = catalog.root(None)?;
//! let schema = Inference::new().infer(&catalog, &root)?;
//! println!("{}", proto_osi::emit::emit_schema(&schema));
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```
pub mod shape;
pub mod ir;
pub mod error;
pub mod inference;
pub mod emit;
pub mod catalog;
pub mod path_de;

pub use error::{InferenceError, Result};
pub use inference::{infer_schema, Inference, InferenceOptions};
pub use ir::{Field, FieldType, Label, Message, Schema, TypeElement};
pub use shape::{Identity, Introspector, Property, ScalarKind, TypeKind, TypeShape};
