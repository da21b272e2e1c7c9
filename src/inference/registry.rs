//! Run-wide ledger of every named type we have started or finished building.
//!
//! An identity goes `InProgress -> Built` exactly once. Meeting an
//! `InProgress` identity again means we are inside a cycle: the caller gets a
//! forward reference and stops descending.
use indexmap::IndexMap;
use tracing::trace;

use crate::error::{InferenceError, Result};
use crate::ir::FieldType;
use crate::shape::{Identity, ScalarKind};

/// What a finished identity turned into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolved {
    /// A message or enum definition, referenced by name.
    Named(String),
    /// A named type that is a plain scalar on the wire.
    Scalar(ScalarKind),
    /// A type that serializes as an array of the given element.
    Sequence(FieldType),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    InProgress,
    Built(Resolved),
}

/// Answer to "what is this identity?" during a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reference {
    /// Still being built further up the stack.
    Forward(Identity),
    Built(Resolved),
}

#[derive(Debug, Default)]
pub struct TypeRegistry {
    entries: IndexMap<Identity, Entry>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, id: &Identity) -> Option<Reference> {
        self.entries.get(id).map(|entry| match entry {
            Entry::InProgress => Reference::Forward(id.clone()),
            Entry::Built(resolved) => Reference::Built(resolved.clone()),
        })
    }

    pub fn begin(&mut self, id: &Identity) -> Result<()> {
        if self.entries.contains_key(id) {
            return Err(InferenceError::DuplicateBuildInvariantViolation(id.clone()));
        }
        trace!(%id, "registry: in progress");
        self.entries.insert(id.clone(), Entry::InProgress);
        Ok(())
    }

    pub fn finish(&mut self, id: &Identity, resolved: Resolved) -> Result<()> {
        match self.entries.get_mut(id) {
            Some(entry) if *entry == Entry::InProgress => {
                trace!(%id, ?resolved, "registry: built");
                *entry = Entry::Built(resolved);
                Ok(())
            }
            _ => Err(InferenceError::DuplicateBuildInvariantViolation(id.clone())),
        }
    }

    /// Already established as array-like by an earlier path through the graph.
    pub fn is_sequence(&self, id: &Identity) -> bool {
        matches!(self.entries.get(id), Some(Entry::Built(Resolved::Sequence(_))))
    }

    /// Identities in the order they were first met.
    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_progress_yields_forward_reference() {
        let mut reg = TypeRegistry::new();
        let id = Identity::new("demo.Node");
        assert_eq!(reg.lookup(&id), None);
        reg.begin(&id).unwrap();
        assert_eq!(reg.lookup(&id), Some(Reference::Forward(id.clone())));
        reg.finish(&id, Resolved::Named("Node".into())).unwrap();
        assert_eq!(reg.lookup(&id), Some(Reference::Built(Resolved::Named("Node".into()))));
    }

    #[test]
    fn building_twice_is_an_invariant_violation() {
        let mut reg = TypeRegistry::new();
        let id = Identity::new("demo.Node");
        reg.begin(&id).unwrap();
        reg.finish(&id, Resolved::Named("Node".into())).unwrap();
        assert!(matches!(reg.begin(&id), Err(InferenceError::DuplicateBuildInvariantViolation(_))));
        assert!(matches!(
            reg.finish(&id, Resolved::Named("Node".into())),
            Err(InferenceError::DuplicateBuildInvariantViolation(_))
        ));
    }

    #[test]
    fn sequence_flag_only_after_built() {
        let mut reg = TypeRegistry::new();
        let id = Identity::new("demo.Chain");
        reg.begin(&id).unwrap();
        assert!(!reg.is_sequence(&id));
        reg.finish(&id, Resolved::Sequence(FieldType::named("Link"))).unwrap();
        assert!(reg.is_sequence(&id));
        assert_eq!(reg.identities().count(), 1);
    }
}
