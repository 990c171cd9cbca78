/* Codec loops between a native array plus count and a wire list.
 *
 * Paths are relative to the struct pointers of the codec functions: `d->`
 * is the destination and `s->` the source, so the wire path sits on `d` when
 * encoding and on `s` when decoding. */

use super::buffer::CodeBuf;
use super::context::FileContext;
use super::helpers::ptr_member;
use crate::error::CodegenResult;
use capn_schema::Type;

/// Member paths of one list field.
#[derive(Debug, Clone)]
pub struct ListPaths {
    pub wire: String,
    pub native: String,
    pub count: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Convert {
    None,
    F32,
    F64,
    Enum,
}

#[derive(Debug, Clone)]
enum ListElement {
    Void,
    Scalar {
        bits: u8,
        native: String,
        convert: Convert,
    },
    Text,
    Pointer,
    Struct(String),
}

fn classify(ctx: &FileContext<'_>, elem: &Type) -> CodegenResult<ListElement> {
    let scalar = |bits: u8, native: &str, convert: Convert| ListElement::Scalar {
        bits,
        native: native.to_string(),
        convert,
    };
    Ok(match elem {
        Type::Void => ListElement::Void,
        Type::Bool => scalar(1, "uint8_t", Convert::None),
        Type::Int8 => scalar(8, "int8_t", Convert::None),
        Type::Uint8 => scalar(8, "uint8_t", Convert::None),
        Type::Int16 => scalar(16, "int16_t", Convert::None),
        Type::Uint16 => scalar(16, "uint16_t", Convert::None),
        Type::Int32 => scalar(32, "int32_t", Convert::None),
        Type::Uint32 => scalar(32, "uint32_t", Convert::None),
        Type::Float32 => scalar(32, "float", Convert::F32),
        Type::Int64 => scalar(64, "int64_t", Convert::None),
        Type::Uint64 => scalar(64, "uint64_t", Convert::None),
        Type::Float64 => scalar(64, "double", Convert::F64),
        Type::Enum(r) => ListElement::Scalar {
            bits: 16,
            native: format!("enum {}", ctx.name_of(r.type_id)?),
            convert: Convert::Enum,
        },
        Type::Text => ListElement::Text,
        Type::Struct(r) => ListElement::Struct(ctx.name_of(r.type_id)?.to_string()),
        /* interfaces have no wire struct or codec functions to call per
         * element, so their lists travel as raw capn_ptr elements */
        Type::Data | Type::AnyPointer(_) | Type::List(_) | Type::Interface(_) => ListElement::Pointer,
    })
}

pub fn emit_list_encode(
    ctx: &mut FileContext<'_>,
    buf: &mut CodeBuf,
    indent: usize,
    elem: &Type,
    wire_tname: &str,
    paths: &ListPaths,
) -> CodegenResult<()> {
    let ListPaths { wire, native, count } = paths;
    let (head, body) = match classify(ctx, elem)? {
        ListElement::Void => {
            buf.line(indent, &format!("d->{} = capn_new_list(cs, s->{}, 0, 0);", wire, count));
            return Ok(());
        }
        ListElement::Struct(name) => {
            buf.line(
                indent,
                &format!("encode_{}_list(cs, &(d->{}), s->{}, s->{});", name, wire, count, native),
            );
            return Ok(());
        }
        ListElement::Scalar { bits, convert, .. } => {
            let item = match convert {
                Convert::None => format!("s->{}[i_]", native),
                Convert::F32 => format!("capn_from_f32(s->{}[i_])", native),
                Convert::F64 => format!("capn_from_f64(s->{}[i_])", native),
                Convert::Enum => format!("(uint16_t) s->{}[i_]", native),
            };
            (
                vec![format!("d->{} = capn_new_list{}(cs, s->{});", wire, bits, count)],
                vec![format!("capn_set{}(d->{}, i_, {});", bits, wire, item)],
            )
        }
        ListElement::Text => (
            vec![format!("d->{} = capn_new_ptr_list(cs, s->{});", wire, count)],
            vec![
                format!(
                    "capn_text text_ = {{.str = s->{n}[i_], .len = strlen(s->{n}[i_]),.seg = NULL}};",
                    n = native
                ),
                format!("capn_set_text(d->{}, i_, text_);", wire),
            ],
        ),
        ListElement::Pointer => {
            let handle = ptr_member(wire_tname, &format!("d->{}", wire));
            (
                vec![format!("{} = capn_new_ptr_list(cs, s->{});", handle, count)],
                vec![format!("capn_setp({}, i_, s->{}[i_]);", handle, native)],
            )
        }
    };

    buf.line(indent, "if (1) {");
    buf.line(indent + 1, "int i_;");
    for line in &head {
        buf.line(indent + 1, line);
    }
    buf.line(indent + 1, &format!("for(i_ = 0; i_ < s->{}; i_ ++) {{", count));
    for line in &body {
        buf.line(indent + 2, line);
    }
    buf.line(indent + 1, "}");
    buf.line(indent, "}");
    Ok(())
}

pub fn emit_list_decode(
    ctx: &mut FileContext<'_>,
    buf: &mut CodeBuf,
    indent: usize,
    elem: &Type,
    wire_tname: &str,
    paths: &ListPaths,
) -> CodegenResult<()> {
    let ListPaths { wire, native, count } = paths;
    let (handle, element, item) = match classify(ctx, elem)? {
        ListElement::Void => {
            buf.line(indent, &format!("capn_resolve(&(s->{}));", wire));
            buf.line(indent, &format!("d->{} = s->{}.len;", count, wire));
            return Ok(());
        }
        ListElement::Struct(name) => {
            buf.line(
                indent,
                &format!("decode_{}_list(&(d->{}), &(d->{}), s->{});", name, count, native, wire),
            );
            return Ok(());
        }
        ListElement::Scalar { bits, native: element, convert } => {
            let raw = format!("capn_get{}(s->{}, i_)", bits, wire);
            let item = match convert {
                Convert::None => raw,
                Convert::F32 => format!("capn_to_f32({})", raw),
                Convert::F64 => format!("capn_to_f64({})", raw),
                Convert::Enum => format!("({})(int) {}", element, raw),
            };
            (format!("s->{}.p", wire), element, vec![format!("d->{}[i_] = {};", native, item)])
        }
        ListElement::Text => {
            ctx.val0_used = true;
            (
                format!("s->{}", wire),
                "char *".to_string(),
                vec![
                    format!("capn_text text_ = capn_get_text(s->{}, i_, capn_val0);", wire),
                    format!("d->{}[i_] = strdup(text_.str);", native),
                ],
            )
        }
        ListElement::Pointer => {
            let handle = ptr_member(wire_tname, &format!("s->{}", wire));
            let item = vec![format!("d->{}[i_] = capn_getp({}, i_, 0);", native, handle)];
            (handle, "capn_ptr".to_string(), item)
        }
    };

    buf.line(indent, "if (1) {");
    buf.line(indent + 1, "int i_, nc_;");
    buf.line(indent + 1, &format!("capn_resolve(&({}));", handle));
    buf.line(indent + 1, &format!("nc_ = {}.len;", handle));
    buf.line(
        indent + 1,
        &format!("d->{} = ({} *)calloc(nc_, sizeof({}));", native, element, element),
    );
    buf.line(indent + 1, "for(i_ = 0; i_ < nc_; i_ ++) {");
    for line in &item {
        buf.line(indent + 2, line);
    }
    buf.line(indent + 1, "}");
    buf.line(indent + 1, &format!("d->{} = nc_;", count));
    buf.line(indent, "}");
    Ok(())
}

pub fn emit_list_free(
    ctx: &mut FileContext<'_>,
    buf: &mut CodeBuf,
    indent: usize,
    elem: &Type,
    paths: &ListPaths,
) -> CodegenResult<()> {
    let ListPaths { native, count, .. } = paths;
    let element = classify(ctx, elem)?;
    match &element {
        ListElement::Void => return Ok(()),
        ListElement::Struct(name) => {
            buf.line(indent, &format!("free_{}_list(d->{}, d->{});", name, count, native));
            return Ok(());
        }
        _ => {}
    }

    buf.line(indent, "if (1) {");
    buf.line(indent + 1, &format!("int i_, nc_ = d->{};", count));
    buf.line(indent + 1, "capnp_use(i_);capnp_use(nc_);");
    if let ListElement::Text = element {
        buf.line(indent + 1, "for(i_ = 0; i_ < nc_; i_ ++) {");
        buf.line(indent + 2, &format!("if (d->{}[i_] == NULL) continue;", native));
        buf.line(indent + 2, &format!("free(d->{}[i_]);", native));
        buf.line(indent + 1, "}");
    }
    buf.line(indent + 1, &format!("free(d->{});", native));
    buf.line(indent, "}");
    Ok(())
}
