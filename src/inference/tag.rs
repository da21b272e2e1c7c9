use std::collections::BTreeSet;

use crate::error::{InferenceError, Result};
use crate::shape::Property;

/// Numbering strategy of one message. Chosen by the first property tagged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagStrategy {
    /// 1, 2, 3, ... in visit order.
    Sequential { next: u32 },
    /// Each property carries its own declared index.
    Declared,
}

#[derive(Clone, Debug)]
pub struct TagAllocator {
    message: String,
    strategy: Option<TagStrategy>, // `Some` == locked
    used: BTreeSet<u32>,
}

impl TagAllocator {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), strategy: None, used: BTreeSet::new() }
    }

    pub fn strategy(&self) -> Option<&TagStrategy> {
        self.strategy.as_ref()
    }

    pub fn next_tag(&mut self, property: &Property) -> Result<u32> {
        let strategy = self.strategy.get_or_insert_with(|| match property.index {
            Some(_) => TagStrategy::Declared,
            None => TagStrategy::Sequential { next: 1 },
        });

        let tag = match (strategy, property.index) {
            (TagStrategy::Sequential { next }, None) => {
                let tag = *next;
                *next += 1;
                tag
            }
            (TagStrategy::Declared, Some(0)) => {
                return Err(InferenceError::InvalidTag {
                    message: self.message.clone(),
                    property: property.name.clone(),
                    tag: 0,
                });
            }
            (TagStrategy::Declared, Some(tag)) => tag,
            (TagStrategy::Sequential { .. }, Some(_)) | (TagStrategy::Declared, None) => {
                return Err(InferenceError::ConflictingTagStrategy {
                    message: self.message.clone(),
                    property: property.name.clone(),
                });
            }
        };

        if !self.used.insert(tag) {
            return Err(InferenceError::DuplicateTag {
                message: self.message.clone(),
                property: property.name.clone(),
                tag,
            });
        }
        Ok(tag)
    }
}
