use super::buffer::CodeBuf;
use super::context::{FileContext, MemberSlot};
use super::helpers::{ptr_member, xor_suffix};
use capn_schema::Type;

/// Load the slot of `member` from `p.p` into `var`, undoing its default.
pub fn emit_load(ctx: &mut FileContext<'_>, buf: &mut CodeBuf, indent: usize, member: &MemberSlot<'_>, var: &str) {
    let layout = &member.layout;
    let off = layout.byte_offset();
    let xor = xor_suffix(member.ty(), member.value.bits);
    let pvar = ptr_member(member.tname(), var);

    let line = match member.ty() {
        Type::Void => return,
        Type::Bool => format!(
            "{} = (capn_read8(p.p, {}) & {}) != {};",
            var,
            off,
            1u32 << layout.bit_shift(),
            (member.value.bits & 1) << layout.bit_shift()
        ),
        Type::Int8 => format!("{} = (int8_t) ((int8_t)capn_read8(p.p, {})){};", var, off, xor),
        Type::Int16 => format!("{} = (int16_t) ((int16_t)capn_read16(p.p, {})){};", var, off, xor),
        Type::Int32 => format!("{} = (int32_t) ((int32_t)capn_read32(p.p, {})){};", var, off, xor),
        Type::Int64 => format!("{} = (int64_t) ((int64_t)(capn_read64(p.p, {})){});", var, off, xor),
        Type::Uint8 => format!("{} = capn_read8(p.p, {}){};", var, off, xor),
        Type::Uint16 => format!("{} = capn_read16(p.p, {}){};", var, off, xor),
        Type::Uint32 => format!("{} = capn_read32(p.p, {}){};", var, off, xor),
        Type::Uint64 => format!("{} = capn_read64(p.p, {}){};", var, off, xor),
        Type::Float32 => format!("{} = capn_to_f32(capn_read32(p.p, {}){});", var, off, xor),
        Type::Float64 => format!("{} = capn_to_f64(capn_read64(p.p, {}){});", var, off, xor),
        Type::Enum(_) => format!(
            "{} = ({})(int) capn_read16(p.p, {}){};",
            var,
            member.tname(),
            off,
            xor
        ),
        Type::Text => {
            let index = member.value.default_index();
            if index == 0 {
                ctx.val0_used = true;
            }
            buf.line(
                indent,
                &format!("{} = capn_get_text(p.p, {}, capn_val{});", var, layout.offset, index),
            );
            return;
        }
        Type::Data => format!("{} = capn_get_data(p.p, {});", var, layout.offset),
        Type::Struct(_) | Type::Interface(_) | Type::List(_) | Type::AnyPointer(_) => {
            format!("{} = capn_getp(p.p, {}, 0);", pvar, layout.offset)
        }
    };
    buf.line(indent, &line);

    if let Some(default) = &member.value.pointer {
        buf.line(indent, &format!("if (!{}.type) {{", pvar));
        buf.line(indent + 1, &format!("{} = {};", var, default.symbol));
        buf.line(indent, "}");
    }
}
