use serde_derive::Deserialize;

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    #[serde(deserialize_with = "crate::ids::id")]
    pub type_id: u64,
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ListType {
    pub element_type: Box<Type>,
}

/* Constraint details of an AnyPointer (unconstrained, parameter, ...) are
 * irrelevant to the wire layout and are skipped. */
#[derive(Deserialize, Debug, PartialEq, Eq, Clone, Default)]
pub struct AnyPointerType {}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub enum Type {
    Void,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Text,
    Data,
    List(ListType),
    Enum(TypeRef),
    Struct(TypeRef),
    Interface(TypeRef),
    AnyPointer(AnyPointerType),
}

impl Type {
    pub fn list_of(element: Type) -> Self {
        Type::List(ListType {
            element_type: Box::new(element),
        })
    }

    /* Element type when this is a list */
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::List(list) => Some(&list.element_type),
            _ => None,
        }
    }

    /* Node id referenced by an enum, struct or interface type */
    pub fn type_id(&self) -> Option<u64> {
        match self {
            Type::Enum(r) | Type::Struct(r) | Type::Interface(r) => Some(r.type_id),
            _ => None,
        }
    }

    /* True for types stored in the pointer section */
    pub fn is_pointer(&self) -> bool {
        matches!(
            self,
            Type::Text
                | Type::Data
                | Type::List(_)
                | Type::Struct(_)
                | Type::Interface(_)
                | Type::AnyPointer(_)
        )
    }

    pub fn tag_name(&self) -> &'static str {
        match self {
            Type::Void => "void",
            Type::Bool => "bool",
            Type::Int8 => "int8",
            Type::Int16 => "int16",
            Type::Int32 => "int32",
            Type::Int64 => "int64",
            Type::Uint8 => "uint8",
            Type::Uint16 => "uint16",
            Type::Uint32 => "uint32",
            Type::Uint64 => "uint64",
            Type::Float32 => "float32",
            Type::Float64 => "float64",
            Type::Text => "text",
            Type::Data => "data",
            Type::List(_) => "list",
            Type::Enum(_) => "enum",
            Type::Struct(_) => "struct",
            Type::Interface(_) => "interface",
            Type::AnyPointer(_) => "anyPointer",
        }
    }
}

/* A single-segment message whose first word is the root pointer of the value */
#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(transparent)]
pub struct PointerBlob(pub Vec<u8>);

impl PointerBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    #[default]
    Void,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(#[serde(deserialize_with = "crate::ids::int64")] i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(#[serde(deserialize_with = "crate::ids::id")] u64),
    Float32(#[serde(deserialize_with = "crate::ids::float32")] f32),
    Float64(#[serde(deserialize_with = "crate::ids::float64")] f64),
    Text(String),
    Data(Vec<u8>),
    List(Option<PointerBlob>),
    Enum(u16),
    Struct(Option<PointerBlob>),
    Interface,
    AnyPointer(Option<PointerBlob>),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn tag_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Bool(_) => "bool",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Uint8(_) => "uint8",
            Value::Uint16(_) => "uint16",
            Value::Uint32(_) => "uint32",
            Value::Uint64(_) => "uint64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::Text(_) => "text",
            Value::Data(_) => "data",
            Value::List(_) => "list",
            Value::Enum(_) => "enum",
            Value::Struct(_) => "struct",
            Value::Interface => "interface",
            Value::AnyPointer(_) => "anyPointer",
        }
    }
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    #[serde(deserialize_with = "crate::ids::id")]
    pub id: u64,
    #[serde(default)]
    pub value: Value,
}
