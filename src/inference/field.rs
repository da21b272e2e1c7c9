// Property shape → field label + type. May recurse into named types and map
// entry synthesis through the run.
use tracing::trace;

use super::map_entry;
use super::registry::{Reference, Resolved};
use super::{Run, SchemaBuilder};
use crate::error::{InferenceError, Result};
use crate::ir::{Field, FieldType, Label, TypeElement};
use crate::shape::{Identity, Introspector, Property, ScalarKind, TypeKind, TypeShape};

/// Resolved element of an array-shaped thing.
enum Element {
    /// Byte blobs: an array of them is one blob on the wire.
    Blob,
    Repeated(FieldType),
}

impl<'i, I: Introspector> Run<'i, I> {
    fn unsupported(enclosing: &SchemaBuilder, property: &Property) -> InferenceError {
        InferenceError::UnsupportedPropertyShape {
            message: enclosing.name().to_string(),
            property: property.name.clone(),
            shape: property.shape.clone(),
        }
    }

    /// Element of `id` if it describes as a `Sequence`. Sequences have no
    /// definition, so a forward reference must not name them.
    fn sequence_element(&self, id: &Identity) -> Option<TypeShape> {
        match self.introspector.describe(id) {
            Some(TypeKind::Sequence(element)) => Some(element),
            _ => None,
        }
    }

    /// Type of a forward reference to a record or enum still being built.
    fn forward_type(id: &Identity) -> FieldType {
        FieldType::named(id.simple_name())
    }

    pub(super) fn resolve_field(&mut self, enclosing: &mut SchemaBuilder, property: &Property, tag: u32) -> Result<Field> {
        let requested = if property.required { Label::Required } else { Label::Optional };

        let (label, ty) = match &property.shape {
            TypeShape::Scalar(k) => (requested, FieldType::Scalar(*k)),
            TypeShape::Array(element) => match self.resolve_element(enclosing, property, element)? {
                Element::Blob => (requested, FieldType::Scalar(ScalarKind::Bytes)),
                Element::Repeated(ty) => (Label::Repeated, ty),
            },
            TypeShape::MapLike { key, value } => (Label::Repeated, self.resolve_map(enclosing, property, key, value)?),
            TypeShape::Object(id) => match self.resolve_object(enclosing, property, id)? {
                // a sequence still in progress: go through to its element,
                // which is itself in progress and stops the descent
                Reference::Forward(id) => match self.sequence_element(&id) {
                    Some(element) => match self.resolve_element(enclosing, property, &element)? {
                        Element::Blob => (requested, FieldType::Scalar(ScalarKind::Bytes)),
                        Element::Repeated(ty) => (Label::Repeated, ty),
                    },
                    None => (requested, Self::forward_type(&id)),
                },
                Reference::Built(resolved) => {
                    // already established as array-like elsewhere in the run
                    let label = if self.registry.is_sequence(id) { Label::Repeated } else { requested };
                    let ty = match resolved {
                        Resolved::Named(name) => FieldType::Named(name),
                        Resolved::Scalar(k) => FieldType::Scalar(k),
                        Resolved::Sequence(ty) => ty,
                    };
                    (label, ty)
                }
            },
        };

        Ok(Field { name: property.name.clone(), tag, label, ty })
    }

    fn resolve_object(&mut self, enclosing: &mut SchemaBuilder, property: &Property, id: &Identity) -> Result<Reference> {
        let (reference, built_now) = self.get_or_build(id, |run| run.build_named(enclosing, property, id))?;
        if built_now {
            trace!(%id, "built");
        }
        Ok(reference)
    }

    fn resolve_element(&mut self, enclosing: &mut SchemaBuilder, property: &Property, element: &TypeShape) -> Result<Element> {
        match element {
            TypeShape::Scalar(ScalarKind::Bytes) => Ok(Element::Blob),
            TypeShape::Scalar(k) => Ok(Element::Repeated(FieldType::Scalar(*k))),
            TypeShape::Object(id) => match self.resolve_object(enclosing, property, id)? {
                // array of arrays, including a sequence of itself
                Reference::Forward(id) if self.sequence_element(&id).is_some() => Err(Self::unsupported(enclosing, property)),
                Reference::Forward(id) => Ok(Element::Repeated(Self::forward_type(&id))),
                Reference::Built(Resolved::Named(name)) => Ok(Element::Repeated(FieldType::Named(name))),
                Reference::Built(Resolved::Scalar(ScalarKind::Bytes)) => Ok(Element::Blob),
                Reference::Built(Resolved::Scalar(k)) => Ok(Element::Repeated(FieldType::Scalar(k))),
                Reference::Built(Resolved::Sequence(_)) => Err(Self::unsupported(enclosing, property)),
            },
            TypeShape::Array(_) | TypeShape::MapLike { .. } => Err(Self::unsupported(enclosing, property)),
        }
    }

    /// What a `Sequence` identity stands for once its element is known.
    pub(super) fn resolve_sequence(&mut self, enclosing: &mut SchemaBuilder, property: &Property, element: &TypeShape) -> Result<Resolved> {
        Ok(match self.resolve_element(enclosing, property, element)? {
            Element::Blob => Resolved::Scalar(ScalarKind::Bytes),
            Element::Repeated(ty) => Resolved::Sequence(ty),
        })
    }

    fn resolve_map(
        &mut self,
        enclosing: &mut SchemaBuilder,
        property: &Property,
        key: &TypeShape,
        value: &TypeShape,
    ) -> Result<FieldType> {
        let Some(key_kind) = map_entry::legal_key(key) else {
            return Err(InferenceError::IllegalMapKeyType {
                message: enclosing.name().to_string(),
                property: property.name.clone(),
                key: key.clone(),
            });
        };
        if let Some(name) = self.map_entries.lookup(key, value) {
            return Ok(FieldType::named(name));
        }

        let value_ty = match value {
            TypeShape::Scalar(k) => FieldType::Scalar(*k),
            TypeShape::Object(id) => match self.resolve_object(enclosing, property, id)? {
                Reference::Forward(id) if self.sequence_element(&id).is_some() => {
                    return Err(Self::unsupported(enclosing, property));
                }
                Reference::Forward(id) => Self::forward_type(&id),
                Reference::Built(Resolved::Named(name)) => FieldType::Named(name),
                Reference::Built(Resolved::Scalar(k)) => FieldType::Scalar(k),
                Reference::Built(Resolved::Sequence(_)) => return Err(Self::unsupported(enclosing, property)),
            },
            TypeShape::Array(_) | TypeShape::MapLike { .. } => return Err(Self::unsupported(enclosing, property)),
        };

        // building the value may have met the same pair through a cycle
        if let Some(name) = self.map_entries.lookup(key, value) {
            return Ok(FieldType::named(name));
        }
        let names = &self.names;
        let entry = self.map_entries.synthesize(key, value, key_kind, value_ty, |n| names.contains_key(n));
        let name = entry.name.clone();
        self.claim_name(&name, format!("map<{key}, {value}>"))?;
        self.top_level.push(TypeElement::Message(entry));
        Ok(FieldType::Named(name))
    }
}
