//! JSON view of an inferred schema tree (debugging / tooling interchange).
//!
//! Not a schema definition language; just the tree, field by field.
use serde_json::{json, Map, Value};

use crate::ir::{EnumType, Field, Message, Schema, TypeElement};

pub fn emit_schema(schema: &Schema) -> Value {
    json!({
        "root": emit_message(&schema.root),
        "types": schema.top_level.iter().map(emit_element).collect::<Vec<_>>(),
    })
}

pub fn emit_element(element: &TypeElement) -> Value {
    match element {
        TypeElement::Message(m) => emit_message(m),
        TypeElement::Enum(e) => emit_enum(e),
    }
}

pub fn emit_message(message: &Message) -> Value {
    let mut o = json!({
        "kind": "message",
        "name": message.name,
        "fields": message.fields.iter().map(emit_field).collect::<Vec<_>>(),
    });
    if let Some(doc) = &message.documentation {
        o["documentation"] = Value::from(doc.clone());
    }
    if !message.nested.is_empty() {
        o["nested"] = Value::Array(message.nested.iter().map(emit_element).collect());
    }
    o
}

fn emit_enum(en: &EnumType) -> Value {
    let mut values = Map::new();
    for v in &en.values {
        values.insert(v.name.clone(), Value::from(v.number));
    }
    let mut o = json!({ "kind": "enum", "name": en.name, "values": values });
    if let Some(doc) = &en.documentation {
        o["documentation"] = Value::from(doc.clone());
    }
    o
}

fn emit_field(field: &Field) -> Value {
    json!({
        "name": field.name,
        "tag": field.tag,
        "label": field.label.as_str(),
        "type": field.ty.name(),
    })
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{EnumValue, FieldType, Label};
    use crate::shape::ScalarKind;

    fn person() -> Message {
        Message {
            name: "Person".into(),
            documentation: Some("Message for demo.Person".into()),
            fields: vec![
                Field { name: "name".into(), tag: 1, label: Label::Optional, ty: FieldType::Scalar(ScalarKind::String) },
                Field { name: "tags".into(), tag: 2, label: Label::Repeated, ty: FieldType::Scalar(ScalarKind::String) },
            ],
            nested: vec![TypeElement::Enum(EnumType {
                name: "Kind".into(),
                documentation: None,
                values: vec![EnumValue { name: "A".into(), number: 0 }, EnumValue { name: "B".into(), number: 1 }],
            })],
        }
    }

    #[test]
    fn message_view() {
        let v = emit_message(&person());
        assert_eq!(v["name"], "Person");
        assert_eq!(v["documentation"], "Message for demo.Person");
        assert_eq!(v["fields"][1], json!({"name": "tags", "tag": 2, "label": "repeated", "type": "string"}));
        assert_eq!(v["nested"][0]["values"], json!({"A": 0, "B": 1}));
    }

    #[test]
    fn schema_view_lists_top_level_types() {
        let mut root = person();
        root.nested.clear();
        root.documentation = None;
        let schema = Schema {
            root,
            top_level: vec![TypeElement::Message(Message { name: "MapFieldEntry".into(), ..Message::default() })],
        };
        let v = emit_schema(&schema);
        assert!(v["root"].get("documentation").is_none());
        assert!(v["root"].get("nested").is_none());
        assert_eq!(v["types"][0]["name"], "MapFieldEntry");
        assert_eq!(v["types"][0]["kind"], "message");
    }
}
