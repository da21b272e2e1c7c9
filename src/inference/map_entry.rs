//! Synthetic `key`/`value` entry messages standing in for map properties.
//!
//! One entry type per distinct (key shape, value shape) pair per run. The
//! first one takes the configured base name, later ones get a numeric suffix.
//! Suffixes already taken by other definitions are skipped.
use indexmap::IndexMap;
use tracing::debug;

use crate::ir::{Field, FieldType, Label, Message};
use crate::shape::{ScalarKind, TypeShape};

pub const KEY_TAG: u32 = 1;
pub const VALUE_TAG: u32 = 2;

/// Key shape of a map, if it may key a map at all.
pub fn legal_key(key: &TypeShape) -> Option<ScalarKind> {
    key.as_scalar().filter(|k| k.is_legal_map_key())
}

#[derive(Debug)]
pub struct MapEntrySynthesizer {
    base_name: String,
    next_suffix: u32,
    entries: IndexMap<(TypeShape, TypeShape), String>,
}

impl MapEntrySynthesizer {
    pub fn new(base_name: impl Into<String>) -> Self {
        Self { base_name: base_name.into(), next_suffix: 1, entries: IndexMap::new() }
    }

    pub fn lookup(&self, key: &TypeShape, value: &TypeShape) -> Option<&str> {
        self.entries
            .get(&(key.clone(), value.clone()))
            .map(String::as_str)
    }

    /// Build the entry message for a pair not seen before. `value` is the
    /// already resolved type of the map's values; `taken` reports names
    /// other definitions already use.
    pub fn synthesize(
        &mut self,
        key_shape: &TypeShape,
        value_shape: &TypeShape,
        key: ScalarKind,
        value: FieldType,
        taken: impl Fn(&str) -> bool,
    ) -> Message {
        let name = loop {
            let candidate = match self.next_suffix {
                1 => self.base_name.clone(),
                n => format!("{}{}", self.base_name, n),
            };
            self.next_suffix += 1;
            if !taken(&candidate) {
                break candidate;
            }
        };
        debug!(entry = %name, key = %key_shape, value = %value_shape, "synthesizing map entry");
        self.entries.insert((key_shape.clone(), value_shape.clone()), name.clone());

        Message {
            name,
            documentation: None,
            fields: vec![
                Field { name: "key".into(), tag: KEY_TAG, label: Label::Optional, ty: FieldType::Scalar(key) },
                Field { name: "value".into(), tag: VALUE_TAG, label: Label::Optional, ty: value },
            ],
            nested: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
