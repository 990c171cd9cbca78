/* Per-file generation state. Everything mutable during a pass lives here;
 * the schema index and name table are shared read-only. */

use super::buffer::CodeBuf;
use super::helpers::field_name;
use crate::error::CodegenResult;
use crate::layout::{SlotLayout, ValueDecoder, ValueDescriptor};
use crate::schema::annotations::mapname;
use crate::schema::{FileOptions, NameTable, SchemaIndex};
use capn_schema::{Field, Node, Type, Value};

pub struct FileContext<'a> {
    pub index: &'a SchemaIndex,
    pub names: &'a NameTable,
    pub options: &'a FileOptions,
    pub values: ValueDecoder,
    pub val0_used: bool,
    pub null_used: bool,
    pub header: CodeBuf,
    pub source: CodeBuf,
}

/// A slot field with its decoded default and storage geometry.
#[derive(Debug, Clone)]
pub struct MemberSlot<'a> {
    pub field: &'a Field,
    /// Wire member name (reserved words prefixed).
    pub name: String,
    /// Native member name: the field's mapname, else the wire name.
    pub native: String,
    pub layout: SlotLayout,
    pub value: ValueDescriptor,
}

impl MemberSlot<'_> {
    pub fn ty(&self) -> &Type {
        &self.value.ty
    }

    pub fn tname(&self) -> &str {
        &self.value.tname
    }
}

impl<'a> FileContext<'a> {
    pub fn new(index: &'a SchemaIndex, names: &'a NameTable, options: &'a FileOptions) -> Self {
        Self {
            index,
            names,
            options,
            values: ValueDecoder::new(),
            val0_used: false,
            null_used: false,
            header: CodeBuf::new(),
            source: CodeBuf::new(),
        }
    }

    pub fn codec_gen(&self) -> bool {
        self.options.codec_gen
    }

    pub fn name_of(&self, id: u64) -> CodegenResult<&'a str> {
        self.names.name(id)
    }

    /// C type used for a value of `ty` in the wire struct.
    pub fn type_name(&self, ty: &Type) -> CodegenResult<String> {
        let name = match ty {
            Type::Void => "void".to_string(),
            Type::Bool => "unsigned".to_string(),
            Type::Int8 => "int8_t".to_string(),
            Type::Int16 => "int16_t".to_string(),
            Type::Int32 => "int32_t".to_string(),
            Type::Int64 => "int64_t".to_string(),
            Type::Uint8 => "uint8_t".to_string(),
            Type::Uint16 => "uint16_t".to_string(),
            Type::Uint32 => "uint32_t".to_string(),
            Type::Uint64 => "uint64_t".to_string(),
            Type::Float32 => "float".to_string(),
            Type::Float64 => "double".to_string(),
            Type::Text => "capn_text".to_string(),
            Type::Data => "capn_data".to_string(),
            Type::Enum(r) => format!("enum {}", self.name_of(r.type_id)?),
            Type::Struct(r) | Type::Interface(r) => format!("{}_ptr", self.name_of(r.type_id)?),
            Type::AnyPointer(_) => "capn_ptr".to_string(),
            Type::List(list) => match list.element_type.as_ref() {
                Type::Bool => "capn_list1".to_string(),
                Type::Int8 | Type::Uint8 => "capn_list8".to_string(),
                Type::Int16 | Type::Uint16 | Type::Enum(_) => "capn_list16".to_string(),
                Type::Int32 | Type::Uint32 | Type::Float32 => "capn_list32".to_string(),
                Type::Int64 | Type::Uint64 | Type::Float64 => "capn_list64".to_string(),
                Type::Struct(r) | Type::Interface(r) => {
                    format!("{}_list", self.name_of(r.type_id)?)
                }
                Type::Void | Type::Text | Type::Data | Type::AnyPointer(_) | Type::List(_) => {
                    "capn_ptr".to_string()
                }
            },
        };
        Ok(name)
    }

    /// Decode a value and flush any definition it produced into the source.
    pub fn decode_value(
        &mut self,
        ty: &Type,
        value: &Value,
        symbol: Option<&str>,
    ) -> CodegenResult<ValueDescriptor> {
        let tname = self.type_name(ty)?;
        let descriptor = self.values.decode(ty, &tname, value, symbol)?;
        let definitions = self.values.take_definitions();
        self.source.raw(&definitions);
        Ok(descriptor)
    }

    pub fn member_slot(&mut self, owner: &Node, field: &'a Field) -> CodegenResult<Option<MemberSlot<'a>>> {
        let Some(slot) = field.as_slot() else {
            return Ok(None);
        };
        let value = self.decode_value(&slot.ty, &slot.default_value, None)?;
        let name = field_name(&field.name).into_owned();
        let native = mapname(&field.annotations, &owner.display_name)?
            .map(str::to_string)
            .unwrap_or_else(|| name.clone());
        Ok(Some(MemberSlot {
            field,
            name,
            native,
            layout: SlotLayout::new(&slot.ty, slot.offset),
            value,
        }))
    }

    /// Native record type of a struct: its mapname, else `struct <name>_`.
    pub fn native_struct(&self, node: &Node) -> CodegenResult<String> {
        let name = self.name_of(node.id)?;
        Ok(mapname(&node.annotations, &node.display_name)?
            .map(str::to_string)
            .unwrap_or_else(|| format!("struct {}_", name)))
    }

    pub fn extattr(&self) -> String {
        format!("{}{}", self.options.extended_attribute, self.options.extattr_space())
    }
}
