use crate::types::{Annotation, Type, Value};
use serde_derive::Deserialize;

/* Discriminant value of a field that is not a union member */
pub const NO_DISCRIMINANT: u16 = 0xffff;

fn no_discriminant() -> u16 {
    NO_DISCRIMINANT
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NestedNode {
    pub name: String,
    #[serde(deserialize_with = "crate::ids::id")]
    pub id: u64,
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(deserialize_with = "crate::ids::id")]
    pub id: u64,
    pub display_name: String,
    #[serde(default)]
    pub display_name_prefix_length: u32,
    #[serde(default, deserialize_with = "crate::ids::id")]
    pub scope_id: u64,
    #[serde(default)]
    pub nested_nodes: Vec<NestedNode>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    pub fn as_struct(&self) -> Option<&StructNode> {
        match &self.kind {
            NodeKind::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut StructNode> {
        match &mut self.kind {
            NodeKind::Struct(s) => Some(s),
            _ => None,
        }
    }

    /* Groups are inlined into their parent struct */
    pub fn is_group(&self) -> bool {
        matches!(&self.kind, NodeKind::Struct(s) if s.is_group)
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::File => "file",
            NodeKind::Struct(_) => "struct",
            NodeKind::Enum(_) => "enum",
            NodeKind::Interface(_) => "interface",
            NodeKind::Const(_) => "const",
            NodeKind::Annotation(_) => "annotation",
        }
    }
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    File,
    Struct(StructNode),
    Enum(EnumNode),
    Interface(InterfaceNode),
    Const(ConstNode),
    Annotation(AnnotationNode),
}

#[derive(Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct StructNode {
    #[serde(default)]
    pub data_word_count: u16,
    #[serde(default)]
    pub pointer_count: u16,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub discriminant_count: u16,
    #[serde(default)]
    pub discriminant_offset: u32,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl StructNode {
    /* A group whose every field is a union member */
    pub fn is_union_only(&self) -> bool {
        self.discriminant_count > 0 && self.discriminant_count as usize == self.fields.len()
    }
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Enumerant {
    pub name: String,
    #[serde(default)]
    pub code_order: u16,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnumNode {
    #[serde(default)]
    pub enumerants: Vec<Enumerant>,
}

#[derive(Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceNode {}

#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConstNode {
    #[serde(rename = "type")]
    pub ty: Type,
    #[serde(default)]
    pub value: Value,
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationNode {
    #[serde(rename = "type", default)]
    pub ty: Option<Type>,
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub code_order: u16,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default = "no_discriminant")]
    pub discriminant_value: u16,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl Field {
    pub fn in_union(&self) -> bool {
        self.discriminant_value != NO_DISCRIMINANT
    }

    pub fn as_slot(&self) -> Option<&Slot> {
        match &self.kind {
            FieldKind::Slot(slot) => Some(slot),
            FieldKind::Group(_) => None,
        }
    }

    pub fn group_id(&self) -> Option<u64> {
        match &self.kind {
            FieldKind::Group(group) => Some(group.type_id),
            FieldKind::Slot(_) => None,
        }
    }
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Slot(Slot),
    Group(Group),
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[serde(default)]
    pub offset: u32,
    #[serde(rename = "type")]
    pub ty: Type,
    #[serde(default)]
    pub default_value: Value,
    #[serde(default)]
    pub had_explicit_default: bool,
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(deserialize_with = "crate::ids::id")]
    pub type_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_node_from_json() {
        let node: Node = serde_json::from_str(
            r#"{
                "id": "0xa1",
                "displayName": "shapes.capnp:Shape",
                "displayNamePrefixLength": 13,
                "scopeId": 1,
                "nestedNodes": [],
                "isGeneric": false,
                "struct": {
                    "dataWordCount": 2,
                    "pointerCount": 0,
                    "isGroup": false,
                    "discriminantCount": 2,
                    "discriminantOffset": 0,
                    "fields": [
                        {"name": "circle", "codeOrder": 0, "discriminantValue": 0,
                         "group": {"typeId": "0xa2"}},
                        {"name": "area", "codeOrder": 1,
                         "slot": {"offset": 1, "type": {"float64": null},
                                  "defaultValue": {"float64": 0}}}
                    ]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(&node.display_name[node.display_name_prefix_length as usize..], "Shape");
        let s = node.as_struct().unwrap();
        assert_eq!(s.fields.len(), 2);
        assert!(s.fields[0].in_union());
        assert_eq!(s.fields[0].group_id(), Some(0xa2));
        assert!(!s.fields[1].in_union());
        assert_eq!(s.fields[1].as_slot().unwrap().ty, Type::Float64);
    }

    #[test]
    fn test_file_and_const_nodes() {
        let file: Node = serde_json::from_str(
            r#"{"id": 1, "displayName": "a.capnp", "file": null,
                "nestedNodes": [{"name": "Limit", "id": 2}]}"#,
        )
        .unwrap();
        assert_eq!(file.kind, NodeKind::File);
        assert_eq!(file.nested_nodes[0].id, 2);

        let c: Node = serde_json::from_str(
            r#"{"id": 2, "displayName": "a.capnp:Limit", "displayNamePrefixLength": 8,
                "const": {"type": {"uint32": null}, "value": {"uint32": 7}}}"#,
        )
        .unwrap();
        assert_eq!(c.kind_name(), "const");
        assert!(!c.is_group());
    }
}
