/* Struct emission: the C struct declaration, read_/write_ bodies, the
 * optional codec functions and the optional per-field accessors. Groups are
 * emitted in place as anonymous sub-structs of their parent. */

use super::buffer::CodeBuf;
use super::codec::{emit_decode, emit_encode, emit_free};
use super::context::{FileContext, MemberSlot};
use super::get::emit_load;
use super::helpers::field_name;
use super::scope::Scope;
use super::set::emit_store;
use super::union::UnionTags;
use crate::error::{CodegenError, CodegenResult};
use crate::schema::annotations::{mapname, mapuniontag, typedefto};
use capn_schema::{Field, FieldKind, Node, StructNode, Type};
use tracing::debug;

/// Output of one struct, split by destination.
#[derive(Debug, Default)]
pub struct StructEmitter {
    pub(super) get: CodeBuf,
    pub(super) set: CodeBuf,
    pub(super) encoder: CodeBuf,
    pub(super) decoder: CodeBuf,
    pub(super) freeup: CodeBuf,
    pub(super) enums: CodeBuf,
    pub(super) decl: CodeBuf,
    pub(super) pub_get: CodeBuf,
    pub(super) pub_get_header: CodeBuf,
    pub(super) pub_set: CodeBuf,
    pub(super) pub_set_header: CodeBuf,
}

pub(super) fn struct_body<'n>(node: &'n Node) -> CodegenResult<&'n StructNode> {
    node.as_struct()
        .ok_or_else(|| CodegenError::unknown_id(node.id, format!("struct body of {}", node.display_name)))
}

impl StructEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn declare_slot(&mut self, indent: usize, member: &MemberSlot<'_>) {
        match member.ty() {
            Type::Void => {}
            Type::Bool => self
                .decl
                .line(indent, &format!("{} {} : 1;", member.tname(), member.name)),
            _ => self.decl.line(indent, &format!("{} {};", member.tname(), member.name)),
        }
    }

    /* Store/load of a slot member plus its codec lines, all at `indent` */
    pub(super) fn member_block(
        &mut self,
        ctx: &mut FileContext<'_>,
        indent: usize,
        member: &MemberSlot<'_>,
        scope: &Scope,
    ) -> CodegenResult<()> {
        let var = format!("s->{}", scope.wire_path(&member.name));
        emit_store(ctx, &mut self.set, indent, member, &var);
        emit_load(ctx, &mut self.get, indent, member, &var);
        if ctx.codec_gen() {
            emit_encode(ctx, &mut self.encoder, indent, member, scope)?;
            emit_decode(ctx, &mut self.decoder, indent, member, scope)?;
            emit_free(ctx, &mut self.freeup, indent, member, scope)?;
        }
        Ok(())
    }

    fn define_field<'a>(
        &mut self,
        ctx: &mut FileContext<'a>,
        owner: &'a Node,
        field: &'a Field,
        scope: &Scope,
    ) -> CodegenResult<Option<MemberSlot<'a>>> {
        match &field.kind {
            FieldKind::Slot(_) => {
                let Some(member) = ctx.member_slot(owner, field)? else {
                    return Ok(None);
                };
                self.declare_slot(scope.decl, &member);
                self.member_block(ctx, scope.func, &member, scope)?;
                Ok(Some(member))
            }
            FieldKind::Group(group) => {
                let index = ctx.index;
                let group_node = index.lookup(group.type_id, &field.name)?;
                self.define_group(ctx, group_node, Some(field), false, scope)?;
                Ok(None)
            }
        }
    }

    /// Emit the fields of `node` into the current buffers. `group` is the
    /// field naming the group in its parent; `None` for the root struct.
    /// `enclose_unions` wraps a union with its discriminant in a struct of
    /// its own, used for groups that are themselves union members.
    pub(super) fn define_group<'a>(
        &mut self,
        ctx: &mut FileContext<'a>,
        node: &'a Node,
        group: Option<&'a Field>,
        enclose_unions: bool,
        scope: &Scope,
    ) -> CodegenResult<()> {
        let body = struct_body(node)?;
        let fields = body.fields.as_slice();
        let ulen = usize::from(body.discriminant_count);
        let named_union = group.is_some() && body.is_union_only();
        let named_struct = group.is_some() && !named_union;

        let group_names = match group {
            Some(field) => {
                let wire = field_name(&field.name).into_owned();
                let native = mapname(&field.annotations, &field.name)?
                    .map(str::to_string)
                    .unwrap_or_else(|| wire.clone());
                Some((field, wire, native))
            }
            None => None,
        };

        let empty = fields
            .iter()
            .all(|f| matches!(f.as_slot(), Some(slot) if slot.ty == Type::Void));
        if let (true, true, Some((_, wire, _))) = (named_struct, empty, &group_names) {
            self.decl
                .line(scope.decl, &format!("/* struct {{ -empty- }} {}; */", wire));
            return Ok(());
        }

        let mut outer = scope.clone();
        if named_struct {
            self.decl.line(scope.decl, "capnp_nowarn struct {");
            outer = outer.nested_decl();
        }
        let inner = match &group_names {
            Some((_, wire, native)) => outer.member(wire, native),
            None => outer,
        };

        let is_root = !node.is_group();
        let leading = fields.iter().take_while(|f| !f.in_union()).count();
        for field in &fields[..leading] {
            let member = self.define_field(ctx, node, field, &inner)?;
            if is_root {
                self.define_accessors(ctx, node, member.as_ref())?;
            }
        }

        if ulen > 0 {
            let enclose = enclose_unions && !named_struct;
            let keep_union_name = named_union && !enclose_unions;

            let mut union_scope = inner.clone();
            if enclose {
                self.decl.line(inner.decl, "capnp_nowarn struct {");
                union_scope = union_scope.nested_decl();
            }

            let (kept_name, wire_tag, native_tag) = match &group_names {
                Some((field, wire, native)) if named_union => {
                    let native_tag = match mapuniontag(&field.annotations, &field.name)? {
                        Some(tag) => scope.native_path(tag),
                        None => scope.native_path(&format!("{}_which", native)),
                    };
                    let wire_tag = if keep_union_name {
                        scope.wire_path(&format!("{}_which", wire))
                    } else {
                        inner.wire_path("which")
                    };
                    (keep_union_name.then_some(wire.as_str()), wire_tag, native_tag)
                }
                _ => {
                    let tag = mapuniontag(&node.annotations, &node.display_name)?.unwrap_or("which");
                    (None, inner.wire_path("which"), inner.native_path(tag))
                }
            };

            let members = fields[leading..]
                .iter()
                .take_while(|f| f.in_union())
                .count();
            let union_fields = &fields[leading..leading + members];
            debug!(
                "union of {} with {} members, tag {}",
                node.display_name,
                union_fields.len(),
                wire_tag
            );
            let tags = UnionTags {
                kept_name,
                wire: wire_tag,
                native: native_tag,
            };
            self.emit_union(ctx, node, union_fields, &union_scope, &tags)?;

            for field in &fields[leading + members..] {
                let member = self.define_field(ctx, node, field, &inner)?;
                if is_root {
                    self.define_accessors(ctx, node, member.as_ref())?;
                }
            }

            if enclose {
                if let Some((_, wire, _)) = &group_names {
                    self.decl.line(inner.decl, &format!("}} {};", wire));
                }
            }
        }

        if let (true, Some((_, wire, _))) = (named_struct, &group_names) {
            self.decl.line(scope.decl, &format!("}} {};", wire));
        }
        Ok(())
    }

    /* X_get_f / X_set_f for a root slot field when $C::fieldgetset is on */
    fn define_accessors(
        &mut self,
        ctx: &mut FileContext<'_>,
        node: &Node,
        member: Option<&MemberSlot<'_>>,
    ) -> CodegenResult<()> {
        let Some(member) = member else {
            return Ok(());
        };
        if !ctx.options.field_get_set || *member.ty() == Type::Void {
            return Ok(());
        }
        let n = ctx.name_of(node.id)?;
        let ea = ctx.extattr();
        let (f, tname) = (member.name.as_str(), member.tname());

        self.pub_get_header
            .raw(&format!("\n{ea}{tname} {n}_get_{f}({n}_ptr p);\n"));
        self.pub_get.raw(&format!("\n{ea}{tname} {n}_get_{f}({n}_ptr p)\n{{\n"));
        self.pub_get.line(1, &format!("{} {};", tname, f));
        emit_load(ctx, &mut self.pub_get, 1, member, f);
        self.pub_get.line(1, &format!("return {};", f));
        self.pub_get.line(0, "}");

        self.pub_set_header
            .raw(&format!("\n{ea}void {n}_set_{f}({n}_ptr p, {tname} {f});\n"));
        self.pub_set
            .raw(&format!("\n{ea}void {n}_set_{f}({n}_ptr p, {tname} {f})\n{{\n"));
        emit_store(ctx, &mut self.pub_set, 1, member, f);
        self.pub_set.line(0, "}");
        Ok(())
    }
}

/// Emit the declaration, accessors and (with codecgen) codec functions of a
/// non-group struct.
pub fn emit_struct<'a>(ctx: &mut FileContext<'a>, node: &'a Node) -> CodegenResult<()> {
    let body = struct_body(node)?;
    let n = ctx.name_of(node.id)?;
    let ea = ctx.extattr();

    let mut s = StructEmitter::new();
    s.define_group(ctx, node, None, false, &Scope::root())?;

    let header = &mut ctx.header;
    header.append(&s.enums);
    let nowarn = if s.decl.is_empty() { "capnp_nowarn " } else { "" };
    header.raw(&format!("\n{}struct {} {{\n", nowarn, n));
    header.append(&s.decl);
    header.raw("};\n");
    if let Some(alias) = typedefto(&node.annotations, &node.display_name)? {
        header.raw(&format!("\ntypedef struct {} {};\n", n, alias));
    }

    let words = u32::from(body.data_word_count);
    let pointers = u32::from(body.pointer_count);
    header.raw(&format!("\nstatic const size_t {}_word_count = {};\n", n, words));
    header.raw(&format!("\nstatic const size_t {}_pointer_count = {};\n", n, pointers));
    header.raw(&format!(
        "\nstatic const size_t {}_struct_bytes_count = {};\n\n",
        n,
        8 * (words + pointers)
    ));

    let src = &mut ctx.source;
    src.raw(&format!("\n{ea}{n}_ptr new_{n}(struct capn_segment *s) {{\n"));
    src.line(1, &format!("{}_ptr p;", n));
    src.line(1, &format!("p.p = capn_new_struct(s, {}, {});", 8 * words, pointers));
    src.line(1, "return p;");
    src.line(0, "}");

    src.raw(&format!("{ea}{n}_list new_{n}_list(struct capn_segment *s, int len) {{\n"));
    src.line(1, &format!("{}_list p;", n));
    src.line(1, &format!("p.p = capn_new_list(s, len, {}, {});", 8 * words, pointers));
    src.line(1, "return p;");
    src.line(0, "}");

    src.raw(&format!("{ea}void read_{n}(struct {n} *s capnp_unused, {n}_ptr p) {{\n"));
    src.raw("\tcapn_resolve(&p.p);\n\tcapnp_use(s);\n");
    src.append(&s.get);
    src.line(0, "}");

    src.raw(&format!("{ea}void write_{n}(const struct {n} *s capnp_unused, {n}_ptr p) {{\n"));
    src.raw("\tcapn_resolve(&p.p);\n\tcapnp_use(s);\n");
    src.append(&s.set);
    src.line(0, "}");

    src.raw(&format!("{ea}void get_{n}(struct {n} *s, {n}_list l, int i) {{\n"));
    src.line(1, &format!("{}_ptr p;", n));
    src.line(1, "p.p = capn_getp(l.p, i, 0);");
    src.line(1, &format!("read_{}(s, p);", n));
    src.line(0, "}");

    src.raw(&format!("{ea}void set_{n}(const struct {n} *s, {n}_list l, int i) {{\n"));
    src.line(1, &format!("{}_ptr p;", n));
    src.line(1, "p.p = capn_getp(l.p, i, 0);");
    src.line(1, &format!("write_{}(s, p);", n));
    src.line(0, "}");

    if ctx.codec_gen() {
        let native = ctx.native_struct(node)?;
        let src = &mut ctx.source;
        src.raw(&format!(
            "\nvoid encode_{n}(struct capn_segment *cs,struct {n} *d, {native} *s) {{\n"
        ));
        src.append(&s.encoder);
        src.raw("\n}\n");
        src.raw(&format!("\nvoid decode_{n}({native} *d, struct {n} *s) {{\n"));
        src.append(&s.decoder);
        src.raw("\n}\n");
        src.raw(&format!("\nvoid free_{n}({native} *d) {{\n"));
        src.append(&s.freeup);
        src.raw("\n}\n");
    }

    ctx.source.append(&s.pub_get);
    ctx.source.append(&s.pub_set);
    ctx.header.append(&s.pub_get_header);
    ctx.header.append(&s.pub_set_header);
    Ok(())
}
