//! Schema inference engine (single run, depth-first, single-threaded).
//!
//! Pull each record's properties from an `Introspector`, fold them into a
//! `Message`, and recurse into every named type a property refers to. One
//! run owns all of its state (`Run`): the type registry, the map-entry cache
//! and the list of top-level definitions. Nothing is global, so independent
//! runs never see each other.
//!
//! Invariants held per run:
//! - every identity is built at most once (registry: in progress → built);
//! - a reference to an identity still in progress is a forward reference,
//!   which is what makes self-referential graphs terminate;
//! - field order == property visit order, tags unique per message;
//! - one synthetic map entry per distinct (key, value) shape pair;
//! - one definition per name across the whole schema.
pub mod tag;
pub mod registry;
pub mod map_entry;
pub mod scope;
mod field;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::{InferenceError, Result};
use crate::ir::{EnumType, EnumValue, Message, Schema, TypeElement};
use crate::shape::{Identity, Introspector, Property, ScalarKind, TypeKind, TypeShape};

pub use map_entry::MapEntrySynthesizer;
pub use registry::{Reference, Resolved, TypeRegistry};
pub use scope::Placement;
pub use tag::{TagAllocator, TagStrategy};

// ------------------------------- Policy ---------------------------------- //

pub const DEFAULT_MAP_ENTRY_NAME: &str = "MapFieldEntry";

#[derive(Clone, Debug)]
pub struct InferenceOptions {
    /// Name of the first synthetic map entry type; later ones get a suffix.
    pub map_entry_name: String,
    /// Attach the introspector's documentation to definitions.
    pub documentation: bool,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self { map_entry_name: DEFAULT_MAP_ENTRY_NAME.to_string(), documentation: true }
    }
}

// ---------------------------- SchemaBuilder ------------------------------ //

/// Accumulates one message. Consumed by `finish`, so it cannot be finished
/// twice.
#[derive(Debug)]
pub struct SchemaBuilder {
    identity: Identity,
    message: Message,
    tags: TagAllocator,
}

impl SchemaBuilder {
    pub fn new(identity: Identity, documentation: Option<String>) -> Self {
        let name = identity.simple_name().to_string();
        Self {
            tags: TagAllocator::new(name.clone()),
            message: Message { name, documentation, ..Message::default() },
            identity,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        &self.message.name
    }

    pub fn visit_property<I: Introspector>(&mut self, run: &mut Run<'_, I>, property: Property) -> Result<()> {
        let tag = self.tags.next_tag(&property)?;
        let field = run.resolve_field(self, &property, tag)?;
        trace!(message = %self.message.name, field = %field.name, tag, label = ?field.label, ty = %field.ty.name(), "field");
        self.message.fields.push(field);
        Ok(())
    }

    pub fn visit_scalar_property<I: Introspector>(
        &mut self,
        run: &mut Run<'_, I>,
        name: &str,
        required: bool,
        kind: ScalarKind,
    ) -> Result<()> {
        self.visit_nested_property(run, name, required, TypeShape::Scalar(kind))
    }

    pub fn visit_nested_property<I: Introspector>(
        &mut self,
        run: &mut Run<'_, I>,
        name: &str,
        required: bool,
        shape: TypeShape,
    ) -> Result<()> {
        let property = Property { name: name.to_string(), shape, required, index: None };
        self.visit_property(run, property)
    }

    pub(crate) fn add_nested(&mut self, element: TypeElement) {
        self.message.nested.push(element);
    }

    pub fn finish(self) -> Message {
        self.message
    }
}

// --------------------------------- Run ----------------------------------- //

/// Build context shared by every recursive step of one run.
pub struct Run<'i, I> {
    introspector: &'i I,
    options: &'i InferenceOptions,
    registry: TypeRegistry,
    map_entries: MapEntrySynthesizer,
    top_level: Vec<TypeElement>,
    /// Definition name -> what claimed it.
    names: IndexMap<String, String>,
}

impl<'i, I: Introspector> Run<'i, I> {
    pub fn new(introspector: &'i I, options: &'i InferenceOptions) -> Self {
        Self {
            introspector,
            options,
            registry: TypeRegistry::new(),
            map_entries: MapEntrySynthesizer::new(options.map_entry_name.clone()),
            top_level: Vec::new(),
            names: IndexMap::new(),
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn documentation(&self, id: &Identity) -> Option<String> {
        if self.options.documentation { self.introspector.documentation(id) } else { None }
    }

    fn claim_name(&mut self, name: &str, owner: String) -> Result<()> {
        if let Some(first) = self.names.get(name) {
            return Err(InferenceError::DuplicateTypeName {
                name: name.to_string(),
                first: first.clone(),
                second: owner,
            });
        }
        self.names.insert(name.to_string(), owner);
        Ok(())
    }

    /// Return what `id` resolved to, building it with `build` if it has never
    /// been seen. The flag tells whether this call did the building.
    pub fn get_or_build(
        &mut self,
        id: &Identity,
        build: impl FnOnce(&mut Self) -> Result<Resolved>,
    ) -> Result<(Reference, bool)> {
        if let Some(reference) = self.registry.lookup(id) {
            trace!(%id, ?reference, "already known");
            return Ok((reference, false));
        }
        self.registry.begin(id)?;
        let resolved = build(self)?;
        self.registry.finish(id, resolved.clone())?;
        Ok((Reference::Built(resolved), true))
    }

    fn build_record(&mut self, id: &Identity) -> Result<Message> {
        self.claim_name(id.simple_name(), id.to_string())?;
        let introspector = self.introspector;
        let mut builder = SchemaBuilder::new(id.clone(), self.documentation(id));
        for property in introspector.properties(id) {
            builder.visit_property(self, property)?;
        }
        Ok(builder.finish())
    }

    /// Build whatever `id` describes as; message and enum definitions are
    /// placed inside `enclosing` or at top level.
    fn build_named(&mut self, enclosing: &mut SchemaBuilder, property: &Property, id: &Identity) -> Result<Resolved> {
        let kind = self.introspector
            .describe(id)
            .ok_or_else(|| InferenceError::UnresolvedType(id.clone()))?;
        let placement = scope::decide(self.introspector, enclosing.identity(), id);

        let (resolved, element) = match kind {
            TypeKind::Record => {
                let message = self.build_record(id)?;
                (Resolved::Named(message.name.clone()), Some(TypeElement::Message(message)))
            }
            TypeKind::Enumeration(values) => {
                self.claim_name(id.simple_name(), id.to_string())?;
                let en = EnumType {
                    name: id.simple_name().to_string(),
                    documentation: self.documentation(id),
                    values: values.into_iter()
                        .zip(0..)
                        .map(|(name, number)| EnumValue { name, number })
                        .collect(),
                };
                (Resolved::Named(en.name.clone()), Some(TypeElement::Enum(en)))
            }
            TypeKind::Scalar(k) => (Resolved::Scalar(k), None),
            TypeKind::Sequence(element) => (self.resolve_sequence(enclosing, property, &element)?, None),
        };

        if let Some(element) = element {
            match placement {
                Placement::Nested => enclosing.add_nested(element),
                Placement::TopLevel => self.top_level.push(element),
            }
        }
        Ok(resolved)
    }

    fn into_schema(self, root: Message) -> Schema {
        debug!(
            root = %root.name,
            types = self.registry.len(),
            map_entries = self.map_entries.len(),
            top_level = self.top_level.len(),
            "run finished"
        );
        Schema { root, top_level: self.top_level }
    }
}

// ------------------------------- Front API -------------------------------- //

#[derive(Clone, Debug, Default)]
pub struct Inference {
    options: InferenceOptions,
}

impl Inference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: InferenceOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &InferenceOptions {
        &self.options
    }

    /// One complete run rooted at `root`. Any error discards the whole run.
    pub fn infer<I: Introspector>(&self, introspector: &I, root: &Identity) -> Result<Schema> {
        debug!(%root, "run started");
        match introspector.describe(root) {
            Some(TypeKind::Record) => {}
            Some(_) => return Err(InferenceError::RootNotAMessage(root.clone())),
            None => return Err(InferenceError::UnresolvedType(root.clone())),
        }

        let mut run = Run::new(introspector, &self.options);
        run.registry.begin(root)?;
        let message = run.build_record(root)?;
        run.registry.finish(root, Resolved::Named(message.name.clone()))?;
        Ok(run.into_schema(message))
    }
}

pub fn infer_schema<I: Introspector>(introspector: &I, root: &Identity) -> Result<Schema> {
    Inference::new().infer(introspector, root)
}

// ------------------------------- Tests ------------------------------------ //
