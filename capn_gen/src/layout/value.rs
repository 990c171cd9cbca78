/* Default and constant values: scalar bit patterns and materialized pointers */

use crate::error::{CodegenError, CodegenResult};
use crate::layout::scratch::{CapnPtr, ScratchSegment};
use capn_schema::{Type, Value};
use indexmap::IndexMap;
use std::fmt::Write;

/// A pointer value copied into the scratch segment and exposed to the
/// generated code under `symbol`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedValue {
    pub symbol: String,
    /// `N` of a shared `capn_valN` symbol; 0 for named constants.
    pub index: u32,
    pub ptr: CapnPtr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueDescriptor {
    pub tname: String,
    pub ty: Type,
    /// Scalar default: sign-extended integers, IEEE bits for floats.
    pub bits: u64,
    pub pointer: Option<MaterializedValue>,
}

impl ValueDescriptor {
    /* Non-zero scalar default or non-null pointer default */
    pub fn has_default(&self) -> bool {
        self.bits != 0 || self.pointer.is_some()
    }

    pub fn default_index(&self) -> u32 {
        self.pointer.as_ref().map_or(0, |p| p.index)
    }
}

/// Per-pass value table. Field defaults are shared by (C type, content)
/// behind `capn_valN`; constants get their own symbol.
#[derive(Debug, Default)]
pub struct ValueDecoder {
    scratch: ScratchSegment,
    shared: IndexMap<(String, Vec<u8>), (u32, CapnPtr)>,
    definitions: String,
}

#[derive(Clone, Copy)]
enum Payload<'a> {
    Text(&'a str),
    Data(&'a [u8]),
    Message(&'a [u8]),
}

impl ValueDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scratch(&self) -> &ScratchSegment {
        &self.scratch
    }

    /// Definitions emitted since the last call, in decode order.
    pub fn take_definitions(&mut self) -> String {
        std::mem::take(&mut self.definitions)
    }

    /// Decode `value` of type `ty`. With `symbol` set the value is a named
    /// constant: a non-null pointer is defined under that (non-static) name.
    pub fn decode(
        &mut self,
        ty: &Type,
        tname: &str,
        value: &Value,
        symbol: Option<&str>,
    ) -> CodegenResult<ValueDescriptor> {
        let label = symbol.unwrap_or(tname);
        check_kind(ty, value, label)?;

        let bits = scalar_bits(value);
        let pointer = match payload(value) {
            Some(payload) => self.materialize(tname, payload, symbol)?,
            None => None,
        };

        Ok(ValueDescriptor {
            tname: tname.to_string(),
            ty: ty.clone(),
            bits,
            pointer,
        })
    }

    fn materialize(
        &mut self,
        tname: &str,
        payload: Payload<'_>,
        symbol: Option<&str>,
    ) -> CodegenResult<Option<MaterializedValue>> {
        let content: &[u8] = match payload {
            Payload::Text(text) => text.as_bytes(),
            Payload::Data(data) => data,
            Payload::Message(message) => message,
        };

        if symbol.is_none() {
            if let Some((index, ptr)) = self.shared.get(&(tname.to_string(), content.to_vec())) {
                return Ok(Some(MaterializedValue {
                    symbol: format!("capn_val{}", index),
                    index: *index,
                    ptr: *ptr,
                }));
            }
        }

        let ptr = match payload {
            Payload::Text(text) => self.scratch.append_text(text),
            Payload::Data(data) => self.scratch.append_data(data),
            Payload::Message(message) => {
                let copied = self
                    .scratch
                    .append_message(message)
                    .map_err(|e| CodegenError::materialization(symbol.unwrap_or(tname), e.to_string()))?;
                match copied {
                    Some(ptr) => ptr,
                    None => return Ok(None),
                }
            }
        };

        let (name, index, storage) = match symbol {
            Some(name) => (name.to_string(), 0, ""),
            None => {
                let index = self.shared.len() as u32 + 1;
                self.shared.insert((tname.to_string(), content.to_vec()), (index, ptr));
                (format!("capn_val{}", index), index, "static ")
            }
        };

        if tname == "capn_text" {
            let _ = writeln!(
                self.definitions,
                "{}capn_text {} = {{{},(char*)&capn_buf[{}],(struct capn_segment*)&capn_seg}};",
                storage,
                name,
                ptr.len - 1,
                ptr.buf_offset()
            );
        } else {
            let (open, close) = if tname == "capn_ptr" { ("", "") } else { ("{", "}") };
            let _ = writeln!(
                self.definitions,
                "{}{} {} = {{{}{},(char*)&capn_buf[{}],(struct capn_segment*)&capn_seg{}}};",
                storage,
                tname,
                name,
                open,
                ptr.c_fields(),
                ptr.buf_offset(),
                close
            );
        }

        Ok(Some(MaterializedValue {
            symbol: name,
            index,
            ptr,
        }))
    }
}

fn payload(value: &Value) -> Option<Payload<'_>> {
    match value {
        Value::Text(text) if !text.is_empty() => Some(Payload::Text(text)),
        Value::Data(data) if !data.is_empty() => Some(Payload::Data(data)),
        Value::List(Some(blob)) | Value::Struct(Some(blob)) | Value::AnyPointer(Some(blob)) => {
            Some(Payload::Message(blob.as_bytes()))
        }
        _ => None,
    }
}

fn scalar_bits(value: &Value) -> u64 {
    match *value {
        Value::Bool(b) => u64::from(b),
        Value::Int8(v) => v as i64 as u64,
        Value::Int16(v) => v as i64 as u64,
        Value::Int32(v) => v as i64 as u64,
        Value::Int64(v) => v as u64,
        Value::Uint8(v) => u64::from(v),
        Value::Uint16(v) => u64::from(v),
        Value::Uint32(v) => u64::from(v),
        Value::Uint64(v) => v,
        Value::Float32(v) => u64::from(v.to_bits()),
        Value::Float64(v) => v.to_bits(),
        Value::Enum(v) => u64::from(v),
        _ => 0,
    }
}

/* A scalar value for a pointer slot (or the reverse) cannot be laid out */
fn check_kind(ty: &Type, value: &Value, label: &str) -> CodegenResult<()> {
    let value_is_pointer = matches!(
        value,
        Value::Text(_)
            | Value::Data(_)
            | Value::List(_)
            | Value::Struct(_)
            | Value::Interface
            | Value::AnyPointer(_)
    );
    let mismatch = match value {
        Value::Void => false,
        Value::Text(_) => !matches!(ty, Type::Text),
        Value::Data(_) => !matches!(ty, Type::Data),
        _ => value_is_pointer != ty.is_pointer(),
    };
    if mismatch {
        return Err(CodegenError::materialization(
            label,
            format!("{} value does not fit a {} slot", value.tag_name(), ty.tag_name()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use capn_schema::PointerBlob;

    #[test]
    fn test_scalar_bits() {
        let mut values = ValueDecoder::new();
        let d = values.decode(&Type::Int8, "int8_t", &Value::Int8(-2), None).unwrap();
        assert_eq!(d.bits, u64::MAX - 1);
        assert!(d.has_default());

        let d = values
            .decode(&Type::Float32, "float", &Value::Float32(1.0), None)
            .unwrap();
        assert_eq!(d.bits, 0x3f80_0000);

        let d = values.decode(&Type::Uint32, "uint32_t", &Value::Void, None).unwrap();
        assert!(!d.has_default());
        assert!(values.scratch().is_empty());
    }

    #[test]
    fn test_shared_text_defaults() {
        let mut values = ValueDecoder::new();
        let text = Value::Text("hello".into());
        let a = values.decode(&Type::Text, "capn_text", &text, None).unwrap();
        let b = values.decode(&Type::Text, "capn_text", &text, None).unwrap();
        let c = values
            .decode(&Type::Text, "capn_text", &Value::Text("other".into()), None)
            .unwrap();

        assert_eq!(a.pointer.as_ref().unwrap().symbol, "capn_val1");
        assert_eq!(a.pointer, b.pointer);
        assert_eq!(c.default_index(), 2);
        assert_eq!(
            values.take_definitions(),
            "static capn_text capn_val1 = {5,(char*)&capn_buf[0],(struct capn_segment*)&capn_seg};\n\
             static capn_text capn_val2 = {5,(char*)&capn_buf[8],(struct capn_segment*)&capn_seg};\n"
        );
    }

    #[test]
    fn test_empty_text_is_not_materialized() {
        let mut values = ValueDecoder::new();
        let d = values
            .decode(&Type::Text, "capn_text", &Value::Text(String::new()), None)
            .unwrap();
        assert_eq!(d.pointer, None);
        assert_eq!(d.default_index(), 0);
    }

    #[test]
    fn test_named_list_constant() {
        let mut values = ValueDecoder::new();
        let blob = PointerBlob(
            [1u64 | (3 << 32) | (2 << 35), 0x0002_0001]
                .iter()
                .flat_map(|w| w.to_le_bytes())
                .collect(),
        );
        let ty = Type::list_of(Type::Uint16);
        let d = values
            .decode(&ty, "capn_list16", &Value::List(Some(blob)), Some("ns_Limits"))
            .unwrap();
        assert_eq!(d.default_index(), 0);
        assert_eq!(
            values.take_definitions(),
            "capn_list16 ns_Limits = {{2,0,0,0,2,0,2,(char*)&capn_buf[0],(struct capn_segment*)&capn_seg}};\n"
        );
    }

    #[test]
    fn test_kind_mismatch() {
        let mut values = ValueDecoder::new();
        assert_matches!(
            values.decode(&Type::Int32, "int32_t", &Value::Text("x".into()), None),
            Err(CodegenError::ValueMaterializationFailed { .. })
        );
        assert_matches!(
            values.decode(&Type::Text, "capn_text", &Value::Uint8(1), None),
            Err(CodegenError::ValueMaterializationFailed { .. })
        );
    }
}
