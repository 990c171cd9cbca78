/* Friendly codec: copy between the wire struct and the native record.
 *
 * encode_X(cs, struct X *d, N *s), decode_X(N *d, struct X *s) and
 * free_X(N *d). Member paths come from the current `Scope`. */

use super::buffer::CodeBuf;
use super::context::{FileContext, MemberSlot};
use super::list::{emit_list_decode, emit_list_encode, emit_list_free, ListPaths};
use super::scope::Scope;
use crate::error::CodegenResult;
use crate::schema::annotations::maplistcount;
use capn_schema::{Node, Type};

fn list_paths(member: &MemberSlot<'_>, scope: &Scope) -> CodegenResult<ListPaths> {
    let count = match maplistcount(&member.field.annotations, &member.field.name)? {
        Some(count) => count.to_string(),
        None => format!("n_{}", member.native),
    };
    Ok(ListPaths {
        wire: scope.wire_path(&member.name),
        native: scope.native_path(&member.native),
        count: scope.native_path(&count),
    })
}

pub fn emit_encode(
    ctx: &mut FileContext<'_>,
    buf: &mut CodeBuf,
    indent: usize,
    member: &MemberSlot<'_>,
    scope: &Scope,
) -> CodegenResult<()> {
    let wire = scope.wire_path(&member.name);
    let native = scope.native_path(&member.native);
    match member.ty() {
        Type::Void => {}
        Type::Bool
        | Type::Int8
        | Type::Int16
        | Type::Int32
        | Type::Int64
        | Type::Uint8
        | Type::Uint16
        | Type::Uint32
        | Type::Uint64
        | Type::Float32
        | Type::Float64
        | Type::Enum(_) => buf.line(indent, &format!("d->{} = s->{};", wire, native)),
        Type::Text => {
            buf.line(indent, &format!("if (s->{} != NULL) {{", native));
            buf.line(indent + 1, &format!("d->{}.str = s->{};", wire, native));
            buf.line(indent + 1, &format!("d->{}.len = strlen(s->{});", wire, native));
            buf.line(indent, "}");
            buf.line(indent, "else{");
            buf.line(indent + 1, &format!("d->{}.str = \"\";", wire));
            buf.line(indent + 1, &format!("d->{}.len = 0;", wire));
            buf.line(indent, "}");
            buf.line(indent, &format!("d->{}.seg = NULL;", wire));
        }
        Type::Struct(r) => {
            let name = ctx.name_of(r.type_id)?;
            buf.line(indent, &format!("encode_{}_ptr(cs, &(d->{}), s->{});", name, wire, native));
        }
        Type::List(list) => {
            let paths = list_paths(member, scope)?;
            emit_list_encode(ctx, buf, indent, &list.element_type, member.tname(), &paths)?;
        }
        Type::Data | Type::Interface(_) | Type::AnyPointer(_) => {
            buf.line(indent, &format!("/* {} {} */", wire, native));
        }
    }
    Ok(())
}

pub fn emit_decode(
    ctx: &mut FileContext<'_>,
    buf: &mut CodeBuf,
    indent: usize,
    member: &MemberSlot<'_>,
    scope: &Scope,
) -> CodegenResult<()> {
    let wire = scope.wire_path(&member.name);
    let native = scope.native_path(&member.native);
    match member.ty() {
        Type::Void => {}
        Type::Bool
        | Type::Int8
        | Type::Int16
        | Type::Int32
        | Type::Int64
        | Type::Uint8
        | Type::Uint16
        | Type::Uint32
        | Type::Uint64
        | Type::Float32
        | Type::Float64
        | Type::Enum(_) => buf.line(indent, &format!("d->{} = s->{};", native, wire)),
        Type::Text => buf.line(indent, &format!("d->{} = strdup(s->{}.str);", native, wire)),
        Type::Struct(r) => {
            let name = ctx.name_of(r.type_id)?;
            buf.line(indent, &format!("decode_{}_ptr(&(d->{}), s->{});", name, native, wire));
        }
        Type::List(list) => {
            let paths = list_paths(member, scope)?;
            emit_list_decode(ctx, buf, indent, &list.element_type, member.tname(), &paths)?;
        }
        Type::Data | Type::Interface(_) | Type::AnyPointer(_) => {
            buf.line(indent, &format!("/* {} {} */", native, wire));
        }
    }
    Ok(())
}

pub fn emit_free(
    ctx: &mut FileContext<'_>,
    buf: &mut CodeBuf,
    indent: usize,
    member: &MemberSlot<'_>,
    scope: &Scope,
) -> CodegenResult<()> {
    let native = scope.native_path(&member.native);
    match member.ty() {
        Type::Text => {
            buf.line(indent, &format!("if (d->{} != NULL) {{", native));
            buf.line(indent + 1, &format!("free(d->{});", native));
            buf.line(indent, "}");
        }
        Type::Struct(r) => {
            let name = ctx.name_of(r.type_id)?;
            buf.line(indent, &format!("free_{}_ptr(&(d->{}));", name, native));
        }
        Type::List(list) => {
            let paths = list_paths(member, scope)?;
            emit_list_free(ctx, buf, indent, &list.element_type, &paths)?;
        }
        Type::Data | Type::Interface(_) | Type::AnyPointer(_) => {
            let wire = scope.wire_path(&member.name);
            buf.line(indent, &format!("/* {} {} */", native, wire));
        }
        _ => {}
    }
    Ok(())
}

/// Pointer and list wrappers around encode_/decode_/free_ of a struct.
pub fn emit_struct_helpers(ctx: &mut FileContext<'_>, node: &Node) -> CodegenResult<()> {
    let n = ctx.name_of(node.id)?;
    let native = ctx.native_struct(node)?;
    let src = &mut ctx.source;

    src.raw(&format!(
        "void encode_{n}_list(struct capn_segment *cs, {n}_list *l,int count,{native} **s) {{\n"
    ));
    src.line(1, &format!("{}_list lst;", n));
    src.line(1, "int i;");
    src.line(1, &format!("lst = new_{}_list(cs, count);", n));
    src.line(1, "for(i = 0; i < count; i ++) {");
    src.line(2, &format!("struct {} d;", n));
    src.line(2, &format!("encode_{}(cs, &d, s[i]);", n));
    src.line(2, &format!("set_{}(&d, lst, i);", n));
    src.line(1, "}");
    src.line(1, "(*l) = lst;");
    src.line(0, "}");

    src.raw(&format!(
        "void encode_{n}_ptr(struct capn_segment *cs, {n}_ptr *p,{native} *s) {{\n"
    ));
    src.line(1, &format!("{}_ptr ptr;", n));
    src.line(1, &format!("struct {} d;", n));
    src.line(1, &format!("ptr = new_{}(cs);", n));
    src.line(1, "if (s == NULL) {");
    src.line(2, "ptr.p = capn_null;");
    src.line(1, "}");
    src.line(1, "else{");
    src.line(2, &format!("encode_{}(cs, &d, s);", n));
    src.line(2, &format!("write_{}(&d, ptr);", n));
    src.line(1, "}");
    src.line(1, "(*p) = ptr;");
    src.line(0, "}");

    src.raw(&format!(
        "void decode_{n}_list(int *pcount, {native} ***d, {n}_list list) {{\n"
    ));
    src.line(1, "int i;");
    src.line(1, "int nc;");
    src.line(1, &format!("{} **ptr;", native));
    src.line(1, "capn_resolve(&(list.p));");
    src.line(1, "nc = list.p.len;");
    src.line(1, &format!("ptr = ({native} **)calloc(nc, sizeof({native} *));"));
    src.line(1, "for(i = 0; i < nc; i ++) {");
    src.line(2, &format!("struct {} s;", n));
    src.line(2, &format!("get_{}(&s, list, i);", n));
    src.line(2, &format!("ptr[i] = ({native} *)calloc(1, sizeof({native}));"));
    src.line(2, &format!("decode_{}(ptr[i], &s);", n));
    src.line(1, "}");
    src.line(1, "(*d) = ptr;");
    src.line(1, "(*pcount) = nc;");
    src.line(0, "}");

    src.raw(&format!("void decode_{n}_ptr({native} **d,{n}_ptr p) {{\n"));
    src.line(1, &format!("struct {} s;", n));
    src.line(1, "capn_resolve(&(p.p));");
    src.line(1, "if (p.p.type == CAPN_NULL) {");
    src.line(2, "(*d) = NULL;");
    src.line(2, "return;");
    src.line(1, "}");
    src.line(1, &format!("*d = ({native} *)calloc(1, sizeof({native}));"));
    src.line(1, &format!("read_{}(&s, p);", n));
    src.line(1, &format!("decode_{}(*d, &s);", n));
    src.line(0, "}");

    src.raw(&format!("void free_{n}_list(int pcount, {native} **d) {{\n"));
    src.line(1, "int i;");
    src.line(1, "int nc = pcount;");
    src.line(1, &format!("{} **ptr = d;", native));
    src.line(1, "if (ptr == NULL) return;");
    src.line(1, "for(i = 0; i < nc; i ++) {");
    src.line(2, "if(ptr[i] == NULL) continue;");
    src.line(2, &format!("free_{}(ptr[i]);", n));
    src.line(2, "free(ptr[i]);");
    src.line(1, "}");
    src.line(1, "free(ptr);");
    src.line(0, "}");

    src.raw(&format!("void free_{n}_ptr({native} **d){{\n"));
    src.line(1, "if((*d) == NULL) return;");
    src.line(1, &format!("free_{}(*d);", n));
    src.line(1, "free(*d);");
    src.line(1, "(*d) = NULL;");
    src.line(0, "}");

    ctx.null_used = true;
    Ok(())
}
