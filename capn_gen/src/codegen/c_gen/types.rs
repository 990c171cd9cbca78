use super::context::FileContext;
use super::helpers::{c_hex, hi, lo};
use crate::error::CodegenResult;
use crate::schema::annotations::typedefto;
use capn_schema::{Node, NodeKind, Type};

/* enum declaration; members are numbered by position */
pub fn emit_enum(ctx: &mut FileContext<'_>, node: &Node) -> CodegenResult<()> {
    let NodeKind::Enum(body) = &node.kind else {
        return Ok(());
    };
    let name = ctx.name_of(node.id)?;

    let mut text = format!("\nenum {} {{", name);
    for (i, enumerant) in body.enumerants.iter().enumerate() {
        if i > 0 {
            text.push(',');
        }
        text.push_str(&format!("\n\t{}_{} = {}", name, enumerant.name, i));
    }
    text.push_str("\n};\n");
    ctx.header.raw(&text);

    if let Some(alias) = typedefto(&node.annotations, &node.display_name)? {
        ctx.header.raw(&format!("\ntypedef enum {} {};\n", name, alias));
    }
    Ok(())
}

/// Constant: `extern` declaration in the header, definition in the source.
/// Non-null pointer constants are defined while their value is decoded.
pub fn emit_const(ctx: &mut FileContext<'_>, node: &Node) -> CodegenResult<()> {
    let NodeKind::Const(body) = &node.kind else {
        return Ok(());
    };
    let name = ctx.name_of(node.id)?;
    let value = ctx.decode_value(&body.ty, &body.value, Some(name))?;
    let tname = value.tname.as_str();
    let bits = value.bits;

    let definition = match &body.ty {
        Type::Void | Type::Interface(_) => return Ok(()),
        Type::Bool | Type::Int8 | Type::Int16 | Type::Int32 => {
            format!("{} {} = {};", tname, name, bits as i32)
        }
        Type::Uint8 => format!("{} {} = {};", tname, name, bits as u8),
        Type::Uint16 => format!("{} {} = {};", tname, name, bits as u16),
        Type::Uint32 => format!("{} {} = {}u;", tname, name, bits as u32),
        Type::Enum(_) => format!("{} {} = ({}) {}u;", tname, name, tname, bits as u32),
        Type::Int64 | Type::Uint64 => format!(
            "{} {} = ((uint64_t) {}u << 32) | {}u;",
            tname,
            name,
            c_hex(hi(bits)),
            c_hex(lo(bits))
        ),
        Type::Float32 => {
            ctx.header.raw(&format!("extern union capn_conv_f32 {};\n", name));
            ctx.source.raw(&format!(
                "union capn_conv_f32 {} = {{{}u}};\n",
                name,
                c_hex(lo(bits))
            ));
            return Ok(());
        }
        Type::Float64 => {
            ctx.header.raw(&format!("extern union capn_conv_f64 {};\n", name));
            ctx.source.raw(&format!(
                "union capn_conv_f64 {} = {{((uint64_t) {}u << 32) | {}u}};\n",
                name,
                c_hex(hi(bits)),
                c_hex(lo(bits))
            ));
            return Ok(());
        }
        Type::Text | Type::Data | Type::Struct(_) | Type::List(_) | Type::AnyPointer(_) => {
            ctx.header.raw(&format!("extern {} {};\n", tname, name));
            if value.pointer.is_none() {
                ctx.source.raw(&format!("{} {};\n", tname, name));
            }
            return Ok(());
        }
    };
    ctx.header.raw(&format!("extern {} {};\n", tname, name));
    ctx.source.line(0, &definition);
    Ok(())
}
