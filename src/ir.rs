// Schema tree produced by inference. Immutable once handed out.
use crate::shape::ScalarKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Required,
    Optional,
    Repeated,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Optional => "optional",
            Self::Repeated => "repeated",
        }
    }
}

/// What a field's type points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Scalar(ScalarKind),
    /// Reference to a message or enum by its (simple) name.
    Named(String),
}

impl FieldType {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(k) => k.as_str(),
            Self::Named(n) => n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub tag: u32,
    pub label: Label,
    pub ty: FieldType,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub name: String,
    pub documentation: Option<String>,
    pub fields: Vec<Field>,      // visit order == wire order
    pub nested: Vec<TypeElement>,
}

impl Message {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn nested_message(&self, name: &str) -> Option<&Message> {
        self.nested.iter().find_map(|el| match el {
            TypeElement::Message(m) if m.name == name => Some(m),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub documentation: Option<String>,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeElement {
    Message(Message),
    Enum(EnumType),
}

impl TypeElement {
    pub fn name(&self) -> &str {
        match self {
            Self::Message(m) => &m.name,
            Self::Enum(e) => &e.name,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(m) => Some(m),
            Self::Enum(_) => None,
        }
    }
}

/// Result of one inference run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub root: Message,
    /// Referenced types emitted separately, in build-completion order.
    pub top_level: Vec<TypeElement>,
}

impl Schema {
    pub fn top_level_message(&self, name: &str) -> Option<&Message> {
        self.top_level.iter().find_map(|el| el.as_message().filter(|m| m.name == name))
    }

    /// Every message in the tree, depth first, root first.
    pub fn messages(&self) -> Vec<&Message> {
        fn walk<'a>(m: &'a Message, out: &mut Vec<&'a Message>) {
            out.push(m);
            for el in &m.nested {
                if let TypeElement::Message(n) = el { walk(n, out); }
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        for el in &self.top_level {
            if let TypeElement::Message(m) = el { walk(m, &mut out); }
        }
        out
    }

    /// Every element name in the tree, including enums and nested types.
    pub fn element_names(&self) -> Vec<&str> {
        fn walk<'a>(el: &'a TypeElement, out: &mut Vec<&'a str>) {
            out.push(el.name());
            if let TypeElement::Message(m) = el {
                for n in &m.nested { walk(n, out); }
            }
        }
        let mut out = vec![self.root.name.as_str()];
        for n in &self.root.nested { walk(n, &mut out); }
        for el in &self.top_level { walk(el, &mut out); }
        out
    }
}
