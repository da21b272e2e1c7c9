//! Input side of inference: what the introspector tells us about types.
//!
//! The engine never reflects on anything itself. It only sees `TypeShape`s
//! handed over per property, and asks the `Introspector` to describe the
//! named (`Object`) identities it runs into.
use std::fmt;

// ————————————————————————————————————————————————————————————————————————————
// SCALARS
// ————————————————————————————————————————————————————————————————————————————

/// Wire-level scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScalarKind {
    Double,
    Float,
    Int32,
    Int64,
    UInt32,
    UInt64,
    SInt32,
    SInt64,
    Fixed32,
    Fixed64,
    SFixed32,
    SFixed64,
    Bool,
    String,
    Bytes,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 15] = [
        Self::Double, Self::Float,
        Self::Int32, Self::Int64, Self::UInt32, Self::UInt64,
        Self::SInt32, Self::SInt64,
        Self::Fixed32, Self::Fixed64, Self::SFixed32, Self::SFixed64,
        Self::Bool, Self::String, Self::Bytes,
    ];

    /// Name as written in a schema definition.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Float => "float",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::SInt32 => "sint32",
            Self::SInt64 => "sint64",
            Self::Fixed32 => "fixed32",
            Self::Fixed64 => "fixed64",
            Self::SFixed32 => "sfixed32",
            Self::SFixed64 => "sfixed64",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Floating point and byte blobs cannot key a map.
    pub fn is_legal_map_key(self) -> bool {
        !matches!(self, Self::Double | Self::Float | Self::Bytes)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// IDENTITY
// ————————————————————————————————————————————————————————————————————————————

/// Stable, comparable key for "the same underlying type" across one run.
///
/// Canonical dotted name, e.g. `demo.Team.Member`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn new(canonical: impl Into<String>) -> Self {
        Self(canonical.into())
    }

    pub fn canonical(&self) -> &str {
        &self.0
    }

    /// Last path segment; this is what a schema definition is named after.
    pub fn simple_name(&self) -> &str {
        self.0
            .rsplit(['.', '$'])
            .next()
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SHAPES
// ————————————————————————————————————————————————————————————————————————————

/// Structural kind of one property's type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeShape {
    Scalar(ScalarKind),
    Array(Box<TypeShape>),
    MapLike { key: Box<TypeShape>, value: Box<TypeShape> },
    Object(Identity),
}

impl TypeShape {
    pub fn array(element: TypeShape) -> Self {
        Self::Array(Box::new(element))
    }

    pub fn map(key: TypeShape, value: TypeShape) -> Self {
        Self::MapLike { key: Box::new(key), value: Box::new(value) }
    }

    pub fn object(identity: impl Into<String>) -> Self {
        Self::Object(Identity::new(identity))
    }

    pub fn as_scalar(&self) -> Option<ScalarKind> {
        match self {
            Self::Scalar(k) => Some(*k),
            _ => None,
        }
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(k) => write!(f, "{k}"),
            Self::Array(el) => write!(f, "array<{el}>"),
            Self::MapLike { key, value } => write!(f, "map<{key}, {value}>"),
            Self::Object(id) => write!(f, "{id}"),
        }
    }
}

/// How a named identity serializes, as reported by the introspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// A message with properties.
    Record,
    /// Serializes as an array of the given element.
    Sequence(TypeShape),
    /// Serializes as a plain scalar (wrappers, newtypes).
    Scalar(ScalarKind),
    /// Closed set of named values, in declaration order.
    Enumeration(Vec<String>),
}

/// One property of a record, in visit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub shape: TypeShape,
    pub required: bool,
    /// Explicit field number declared by the source type, if any.
    pub index: Option<u32>,
}

impl Property {
    pub fn optional(name: impl Into<String>, shape: TypeShape) -> Self {
        Self { name: name.into(), shape, required: false, index: None }
    }

    pub fn required(name: impl Into<String>, shape: TypeShape) -> Self {
        Self { name: name.into(), shape, required: true, index: None }
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTROSPECTOR
// ————————————————————————————————————————————————————————————————————————————

/// The external collaborator that knows the source types.
pub trait Introspector {
    /// `None` when the identity is unknown.
    fn describe(&self, id: &Identity) -> Option<TypeKind>;

    /// Properties of a `Record` in declaration order. Must be restartable:
    /// calling it again yields the same sequence.
    fn properties<'a>(&'a self, id: &Identity) -> impl Iterator<Item = Property> + 'a;

    /// Whether `candidate` is declared lexically inside `enclosing`.
    fn is_declared_inside(&self, enclosing: &Identity, candidate: &Identity) -> bool;

    fn documentation(&self, id: &Identity) -> Option<String> {
        Some(format!("Message for {}", id.canonical()))
    }
}
