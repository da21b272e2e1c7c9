//! Declarative type catalog: a JSON document that plays the introspector.
//!
//! ```json
//! {
//!   "root": "demo.Team",
//!   "types": {
//!     "demo.Person": { "kind": "record", "properties": [
//!       { "name": "name", "type": "string" },
//!       { "name": "tags", "type": { "array": "string" } }
//!     ]},
//!     "demo.Team": { "kind": "record", "properties": [
//!       { "name": "members", "type": { "map": { "key": "string", "value": "demo.Person" } } }
//!     ]},
//!     "demo.Team.Role": { "kind": "enum", "enclosing": "demo.Team", "values": ["LEAD", "MEMBER"] }
//!   }
//! }
//! ```
//!
//! A type name that is a wire scalar (`int32`, `string`, ...) is that scalar;
//! anything else names a declared type.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::path_de::{self, PathError};
use crate::shape::{Identity, Introspector, Property, ScalarKind, TypeKind, TypeShape};

static TYPE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:[.$][A-Za-z_][A-Za-z0-9_]*)*$").expect("valid type name regex")
});
static FIELD_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid field name regex")
});

// ————————————————————————————————————————————————————————————————————————————
// ERRORS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed catalog {0}")]
    Decode(#[from] PathError),

    #[error("invalid {what} name `{name}`")]
    InvalidName { what: &'static str, name: String },

    #[error("type `{ty}` declares property `{property}` twice")]
    DuplicateProperty { ty: String, property: String },

    #[error("type `{ty}` is declared inside unknown type `{enclosing}`")]
    UnknownEnclosing { ty: String, enclosing: String },

    #[error("no root type: the catalog declares none and none was given")]
    MissingRoot,

    #[error("root type `{0}` is not declared in the catalog")]
    UnknownRoot(String),
}

// ————————————————————————————————————————————————————————————————————————————
// DOCUMENT FORMAT
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDoc {
    root: Option<String>,
    types: IndexMap<String, TypeDecl>,
}

#[derive(Debug, Deserialize)]
struct TypeDecl {
    /// Canonical name of the type this one is declared inside.
    enclosing: Option<String>,
    doc: Option<String>,
    #[serde(flatten)]
    body: TypeBody,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum TypeBody {
    Record {
        #[serde(default)]
        properties: Vec<PropertyDecl>,
    },
    Sequence {
        element: ShapeDecl,
    },
    Scalar {
        scalar: String,
    },
    Enum {
        values: Vec<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PropertyDecl {
    name: String,
    #[serde(rename = "type")]
    shape: ShapeDecl,
    #[serde(default)]
    required: bool,
    index: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ShapeDecl {
    Name(String),
    Array { array: Box<ShapeDecl> },
    Map { map: Box<MapDecl> },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MapDecl {
    key: ShapeDecl,
    value: ShapeDecl,
}

impl ShapeDecl {
    fn into_shape(self) -> Result<TypeShape, CatalogError> {
        Ok(match self {
            Self::Name(name) => match ScalarKind::from_name(&name) {
                Some(k) => TypeShape::Scalar(k),
                None => TypeShape::Object(type_identity(name)?),
            },
            Self::Array { array } => TypeShape::array(array.into_shape()?),
            Self::Map { map } => {
                let MapDecl { key, value } = *map;
                TypeShape::map(key.into_shape()?, value.into_shape()?)
            }
        })
    }
}

fn type_identity(name: String) -> Result<Identity, CatalogError> {
    if TYPE_NAME.is_match(&name) {
        Ok(Identity::new(name))
    } else {
        Err(CatalogError::InvalidName { what: "type", name })
    }
}

fn field_name(what: &'static str, name: String) -> Result<String, CatalogError> {
    if FIELD_NAME.is_match(&name) {
        Ok(name)
    } else {
        Err(CatalogError::InvalidName { what, name })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CATALOG
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone)]
struct CatalogType {
    kind: TypeKind,
    properties: Vec<Property>,
    enclosing: Option<Identity>,
    doc: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    root: Option<Identity>,
    types: IndexMap<Identity, CatalogType>,
}

impl Catalog {
    pub fn from_value(value: serde_json::Value) -> Result<Self, CatalogError> {
        Self::from_doc(path_de::from_value_with_path(value)?)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let src = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        src.parse()
    }

    fn from_doc(doc: CatalogDoc) -> Result<Self, CatalogError> {
        let mut types = IndexMap::with_capacity(doc.types.len());
        for (name, decl) in doc.types {
            let id = type_identity(name)?;
            let ty = Self::convert(&id, decl)?;
            types.insert(id, ty);
        }

        for (id, ty) in &types {
            if let Some(enclosing) = &ty.enclosing {
                if !types.contains_key(enclosing) {
                    return Err(CatalogError::UnknownEnclosing {
                        ty: id.to_string(),
                        enclosing: enclosing.to_string(),
                    });
                }
            }
        }

        let root = doc.root.map(type_identity).transpose()?;
        debug!(types = types.len(), root = ?root.as_ref().map(Identity::canonical), "catalog loaded");
        Ok(Self { root, types })
    }

    fn convert(id: &Identity, decl: TypeDecl) -> Result<CatalogType, CatalogError> {
        let enclosing = decl.enclosing.map(type_identity).transpose()?;
        let (kind, properties) = match decl.body {
            TypeBody::Record { properties } => {
                let mut seen = BTreeSet::new();
                let mut out = Vec::with_capacity(properties.len());
                for p in properties {
                    let name = field_name("property", p.name)?;
                    if !seen.insert(name.clone()) {
                        return Err(CatalogError::DuplicateProperty { ty: id.to_string(), property: name });
                    }
                    out.push(Property { name, shape: p.shape.into_shape()?, required: p.required, index: p.index });
                }
                (TypeKind::Record, out)
            }
            TypeBody::Sequence { element } => (TypeKind::Sequence(element.into_shape()?), Vec::new()),
            TypeBody::Scalar { scalar } => match ScalarKind::from_name(&scalar) {
                Some(k) => (TypeKind::Scalar(k), Vec::new()),
                None => return Err(CatalogError::InvalidName { what: "scalar", name: scalar }),
            },
            TypeBody::Enum { values } => {
                let values = values.into_iter()
                    .map(|v| field_name("enum value", v))
                    .collect::<Result<Vec<_>, _>>()?;
                (TypeKind::Enumeration(values), Vec::new())
            }
        };
        Ok(CatalogType { kind, properties, enclosing, doc: decl.doc })
    }

    /// Root to infer from: `requested` if given, else the catalog's own.
    pub fn root(&self, requested: Option<&str>) -> Result<Identity, CatalogError> {
        let root = match requested {
            Some(name) => Identity::new(name),
            None => self.root.clone().ok_or(CatalogError::MissingRoot)?,
        };
        if !self.types.contains_key(&root) {
            return Err(CatalogError::UnknownRoot(root.to_string()));
        }
        Ok(root)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromStr for Catalog {
    type Err = CatalogError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Self::from_doc(path_de::from_str_with_path(src)?)
    }
}

impl Introspector for Catalog {
    fn describe(&self, id: &Identity) -> Option<TypeKind> {
        self.types.get(id).map(|t| t.kind.clone())
    }

    fn properties<'a>(&'a self, id: &Identity) -> impl Iterator<Item = Property> + 'a {
        self.types
            .get(id)
            .into_iter()
            .flat_map(|t| t.properties.iter().cloned())
    }

    fn is_declared_inside(&self, enclosing: &Identity, candidate: &Identity) -> bool {
        self.types
            .get(candidate)
            .and_then(|t| t.enclosing.as_ref())
            .is_some_and(|e| e == enclosing)
    }

    fn documentation(&self, id: &Identity) -> Option<String> {
        match self.types.get(id).and_then(|t| t.doc.clone()) {
            Some(doc) => Some(doc),
            None => Some(format!("Message for {}", id.canonical())),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::emit::emit_schema;
    use crate::error::InferenceError;
    use crate::inference::infer_schema;
    use crate::ir::{FieldType, Label};

    fn team_catalog() -> serde_json::Value {
        json!({
            "root": "demo.Team",
            "types": {
                "demo.Person": { "kind": "record", "properties": [
                    { "name": "name", "type": "string" },
                    { "name": "age", "type": "int32" },
                    { "name": "tags", "type": { "array": "string" } }
                ]},
                "demo.Team": { "kind": "record", "doc": "A team.", "properties": [
                    { "name": "name", "type": "string", "required": true },
                    { "name": "members", "type": { "map": { "key": "string", "value": "demo.Person" } } },
                    { "name": "role", "type": "demo.Team.Role" }
                ]},
                "demo.Team.Role": { "kind": "enum", "enclosing": "demo.Team", "values": ["LEAD", "MEMBER"] }
            }
        })
    }

    #[test]
    fn catalog_drives_a_full_run() {
        let catalog = Catalog::from_value(team_catalog()).unwrap();
        let root = catalog.root(None).unwrap();
        let schema = infer_schema(&catalog, &root).unwrap();

        assert_eq!(schema.root.name, "Team");
        assert_eq!(schema.root.documentation.as_deref(), Some("A team."));
        assert_eq!(schema.root.field("name").unwrap().label, Label::Required);
        assert_eq!(schema.root.field("members").unwrap().ty, FieldType::named("MapFieldEntry"));
        assert_eq!(schema.root.field("role").unwrap().ty, FieldType::named("Role"));
        assert_eq!(schema.root.nested.len(), 1);

        let person = schema.top_level_message("Person").unwrap();
        assert_eq!(person.documentation.as_deref(), Some("Message for demo.Person"));

        let view = emit_schema(&schema);
        assert_eq!(view["root"]["nested"][0]["kind"], "enum");
        assert_eq!(view["types"][1]["fields"][1]["type"], "Person");
    }

    #[test]
    fn bad_map_key_from_catalog() {
        let catalog = Catalog::from_value(json!({
            "root": "Bad",
            "types": { "Bad": { "kind": "record", "properties": [
                { "name": "m", "type": { "map": { "key": "double", "value": "string" } } }
            ]}}
        })).unwrap();
        let root = catalog.root(None).unwrap();
        assert!(matches!(infer_schema(&catalog, &root), Err(InferenceError::IllegalMapKeyType { .. })));
    }

    #[test]
    fn declared_indexes_and_named_scalars() {
        let catalog = Catalog::from_value(json!({
            "types": {
                "Id": { "kind": "scalar", "scalar": "fixed64" },
                "Path": { "kind": "sequence", "element": "Id" },
                "Doc": { "kind": "record", "properties": [
                    { "name": "id", "type": "Id", "index": 4 },
                    { "name": "trail", "type": "Path", "index": 9 }
                ]}
            }
        })).unwrap();
        let root = catalog.root(Some("Doc")).unwrap();
        let schema = infer_schema(&catalog, &root).unwrap();
        let trail = schema.root.field("trail").unwrap();
        assert_eq!((trail.tag, trail.label, trail.ty.clone()), (9, Label::Repeated, FieldType::Scalar(ScalarKind::Fixed64)));
        assert_eq!(schema.root.field("id").unwrap().tag, 4);
    }

    #[test]
    fn decode_errors_point_at_the_problem() {
        let err = Catalog::from_str(r#"{"types": {"A": {"kind": "record", "properties": [{"name": "x"}]}}}"#).unwrap_err();
        assert!(matches!(err, CatalogError::Decode(_)), "{err}");
        assert!(err.to_string().contains("types.A"), "{err}");
    }

    #[test]
    fn names_are_validated() {
        let err = Catalog::from_value(json!({"types": {"no spaces": {"kind": "record"}}})).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidName { what: "type", .. }));

        let err = Catalog::from_value(json!({"types": {"A": {"kind": "record", "properties": [
            { "name": "1x", "type": "string" }
        ]}}})).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidName { what: "property", .. }));

        let err = Catalog::from_value(json!({"types": {"A": {"kind": "scalar", "scalar": "decimal"}}})).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidName { what: "scalar", .. }));

        let err = Catalog::from_value(json!({"types": {"A": {"kind": "record", "properties": [
            { "name": "x", "type": "string" }, { "name": "x", "type": "int32" }
        ]}}})).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateProperty { .. }));
    }

    #[test]
    fn roots_and_enclosures_are_checked() {
        let err = Catalog::from_value(json!({"types": {"A": {"kind": "record", "enclosing": "B"}}})).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownEnclosing { .. }));

        let catalog = Catalog::from_value(json!({"types": {"A": {"kind": "record"}}})).unwrap();
        assert!(matches!(catalog.root(None), Err(CatalogError::MissingRoot)));
        assert!(matches!(catalog.root(Some("B")), Err(CatalogError::UnknownRoot(_))));
        assert_eq!(catalog.root(Some("A")).unwrap(), Identity::new("A"));
        assert_eq!(catalog.len(), 1);
    }
}
