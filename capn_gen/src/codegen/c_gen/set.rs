use super::buffer::CodeBuf;
use super::context::{FileContext, MemberSlot};
use super::helpers::{ptr_member, xor_suffix};
use capn_schema::Type;

/// Store `var` into the slot of `member` in `p.p`, applying its default.
pub fn emit_store(ctx: &mut FileContext<'_>, buf: &mut CodeBuf, indent: usize, member: &MemberSlot<'_>, var: &str) {
    let layout = &member.layout;
    let off = layout.byte_offset();
    let xor = xor_suffix(member.ty(), member.value.bits);
    let pvar = ptr_member(member.tname(), var);

    let line = match member.ty() {
        Type::Void => return,
        Type::Bool => format!(
            "capn_write1(p.p, {}, {} != {});",
            layout.offset,
            var,
            member.value.bits & 1
        ),
        Type::Int8 => format!("capn_write8(p.p, {}, (uint8_t) ({}{}));", off, var, xor),
        Type::Int16 | Type::Enum(_) => {
            format!("capn_write16(p.p, {}, (uint16_t) ({}{}));", off, var, xor)
        }
        Type::Int32 => format!("capn_write32(p.p, {}, (uint32_t) ({}{}));", off, var, xor),
        Type::Int64 => format!("capn_write64(p.p, {}, (uint64_t) ({}{}));", off, var, xor),
        Type::Uint8 => format!("capn_write8(p.p, {}, {}{});", off, var, xor),
        Type::Uint16 => format!("capn_write16(p.p, {}, {}{});", off, var, xor),
        Type::Uint32 => format!("capn_write32(p.p, {}, {}{});", off, var, xor),
        Type::Uint64 => format!("capn_write64(p.p, {}, {}{});", off, var, xor),
        Type::Float32 => format!("capn_write32(p.p, {}, capn_from_f32({}){});", off, var, xor),
        Type::Float64 => format!("capn_write64(p.p, {}, capn_from_f64({}){});", off, var, xor),
        Type::Text => match &member.value.pointer {
            Some(default) => {
                ctx.val0_used = true;
                format!(
                    "capn_set_text(p.p, {}, ({}.str != {}.str) ? {} : capn_val0);",
                    layout.offset, var, default.symbol, var
                )
            }
            None => format!("capn_set_text(p.p, {}, {});", layout.offset, var),
        },
        Type::Data | Type::Struct(_) | Type::Interface(_) | Type::List(_) | Type::AnyPointer(_) => {
            match &member.value.pointer {
                Some(default) => {
                    ctx.null_used = true;
                    let default_ptr = ptr_member(member.tname(), &default.symbol);
                    format!(
                        "capn_setp(p.p, {}, ({}.data != {}.data) ? {} : capn_null);",
                        layout.offset, pvar, default_ptr, pvar
                    )
                }
                None => format!("capn_setp(p.p, {}, {});", layout.offset, pvar),
            }
        }
    };
    buf.line(indent, &line);
}
