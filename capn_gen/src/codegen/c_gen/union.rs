/* Unions: discriminant, case arms and the <Node>_which enum.
 *
 * Zero-default slot members of the same storage class at the same offset
 * alias the same bytes of the C union, so their accessor arms are shared:
 * one set of case labels and a single load/store. Members with defaults and
 * groups get an arm each. The codec keeps one arm per member since native
 * member paths differ. */

use super::context::{FileContext, MemberSlot};
use super::helpers::field_name;
use super::scope::Scope;
use super::structs::StructEmitter;
use crate::error::CodegenResult;
use crate::layout::CaseClass;
use capn_schema::{Field, FieldKind, Node};
use indexmap::IndexMap;

const CLASS_ORDER: [CaseClass; 9] = [
    CaseClass::Bool,
    CaseClass::Enum,
    CaseClass::Bits8,
    CaseClass::Bits16,
    CaseClass::Bits32,
    CaseClass::Bits64,
    CaseClass::Text,
    CaseClass::Data,
    CaseClass::Pointer,
];

/// Where a union's discriminant lives. `kept_name` names the C union when it
/// is a named union group declared in its parent; the wire tag then sits
/// beside it as `<name>_which`.
#[derive(Debug, Clone)]
pub(super) struct UnionTags<'t> {
    pub(super) kept_name: Option<&'t str>,
    pub(super) wire: String,
    pub(super) native: String,
}

impl StructEmitter {
    fn case_label(&mut self, ctx: &FileContext<'_>, indent: usize, label: &str, codec: bool) {
        let line = format!("case {}:", label);
        self.get.line(indent, &line);
        self.set.line(indent, &line);
        if codec && ctx.codec_gen() {
            self.encoder.line(indent, &line);
            self.decoder.line(indent, &line);
            self.freeup.line(indent, &line);
        }
    }

    fn arm_break(&mut self, ctx: &FileContext<'_>, indent: usize, codec: bool) {
        self.get.line(indent, "break;");
        self.set.line(indent, "break;");
        if codec && ctx.codec_gen() {
            self.encoder.line(indent, "break;");
            self.decoder.line(indent, "break;");
            self.freeup.line(indent, "break;");
        }
    }

    /* Codec arm for one union member */
    fn codec_arm(
        &mut self,
        ctx: &mut FileContext<'_>,
        label: &str,
        member: &MemberSlot<'_>,
        scope: &Scope,
    ) -> CodegenResult<()> {
        let (case, body) = (scope.func, scope.func + 1);
        let line = format!("case {}:", label);
        self.encoder.line(case, &line);
        self.decoder.line(case, &line);
        self.freeup.line(case, &line);
        super::codec::emit_encode(ctx, &mut self.encoder, body, member, scope)?;
        super::codec::emit_decode(ctx, &mut self.decoder, body, member, scope)?;
        super::codec::emit_free(ctx, &mut self.freeup, body, member, scope)?;
        self.encoder.line(body, "break;");
        self.decoder.line(body, "break;");
        self.freeup.line(body, "break;");
        Ok(())
    }

    /// Emit the union formed by `fields` (all members of `node`'s union).
    pub(super) fn emit_union<'a>(
        &mut self,
        ctx: &mut FileContext<'a>,
        node: &'a Node,
        fields: &'a [Field],
        scope: &Scope,
        tags: &UnionTags<'_>,
    ) -> CodegenResult<()> {
        let body = super::structs::struct_body(node)?;
        let n = ctx.name_of(node.id)?;
        let tagoff = 2 * body.discriminant_offset;
        let f = scope.func;

        let (wire_tag, native_tag) = (tags.wire.as_str(), tags.native.as_str());
        let tag_member = match tags.kept_name {
            Some(name) => format!("{}_which", name),
            None => "which".to_string(),
        };
        self.decl
            .line(scope.decl, &format!("enum {}_which {};", n, tag_member));
        self.get.line(
            f,
            &format!("s->{} = (enum {}_which)(int) capn_read16(p.p, {});", wire_tag, n, tagoff),
        );
        self.set
            .line(f, &format!("capn_write16(p.p, {}, s->{});", tagoff, wire_tag));
        self.set.line(f, &format!("switch (s->{}) {{", wire_tag));
        self.get.line(f, &format!("switch (s->{}) {{", wire_tag));
        if ctx.codec_gen() {
            self.encoder
                .line(f, &format!("d->{} = s->{};", wire_tag, native_tag));
            self.encoder.line(f, &format!("switch (d->{}) {{", wire_tag));
            self.decoder
                .line(f, &format!("d->{} = s->{};", native_tag, wire_tag));
            self.decoder.line(f, &format!("switch (s->{}) {{", wire_tag));
            self.freeup.line(f, &format!("switch (d->{}) {{", native_tag));
        }

        /* decode every slot member once; definitions land in field order */
        let mut slots: Vec<Option<MemberSlot<'a>>> = Vec::with_capacity(fields.len());
        for field in fields {
            slots.push(ctx.member_slot(node, field)?);
        }

        /* shared arms, in storage class order, then by offset */
        for class in CLASS_ORDER {
            let mut partitions: IndexMap<u32, Vec<&MemberSlot<'a>>> = IndexMap::new();
            for member in slots.iter().flatten() {
                if member.value.has_default() || CaseClass::of(member.ty()) != Some(class) {
                    continue;
                }
                partitions.entry(member.layout.offset).or_default().push(member);
            }
            for members in partitions.values() {
                for member in members {
                    let label = format!("{}_{}", n, member.name);
                    self.get.line(f, &format!("case {}:", label));
                    self.set.line(f, &format!("case {}:", label));
                }
                let first = members[0];
                let var = format!("s->{}", scope.wire_path(&first.name));
                super::set::emit_store(ctx, &mut self.set, f + 1, first, &var);
                super::get::emit_load(ctx, &mut self.get, f + 1, first, &var);
                self.get.line(f + 1, "break;");
                self.set.line(f + 1, "break;");
                if ctx.codec_gen() {
                    for member in members {
                        let label = format!("{}_{}", n, member.name);
                        self.codec_arm(ctx, &label, member, scope)?;
                    }
                }
            }
        }

        self.decl.line(scope.decl, "capnp_nowarn union {");
        let mut enums = format!("enum {}_which {{", n);
        for (i, (field, slot)) in fields.iter().zip(&slots).enumerate() {
            let label = format!("{}_{}", n, field_name(&field.name));
            if i > 0 {
                enums.push(',');
            }
            enums.push_str(&format!("\n\t{} = {}", label, field.discriminant_value));

            match (&field.kind, slot) {
                (FieldKind::Group(group), _) => {
                    self.case_label(ctx, f, &label, true);
                    let index = ctx.index;
                    let group_node = index.lookup(group.type_id, &field.name)?;
                    let arm = scope.nested_decl().arm();
                    self.define_group(ctx, group_node, Some(field), true, &arm)?;
                    self.arm_break(ctx, f + 1, true);
                }
                (FieldKind::Slot(_), Some(member)) => {
                    self.declare_slot(scope.decl + 1, member);
                    if member.value.has_default() {
                        self.case_label(ctx, f, &label, true);
                        self.member_block(ctx, f + 1, member, scope)?;
                        self.arm_break(ctx, f + 1, true);
                    }
                }
                (FieldKind::Slot(_), None) => {}
            }
        }
        enums.push_str("\n};\n");

        match tags.kept_name {
            Some(name) => self.decl.line(scope.decl, &format!("}} {};", name)),
            None => self.decl.line(scope.decl, "};"),
        }

        for buf in [&mut self.get, &mut self.set] {
            buf.line(f, "default:");
            buf.line(f + 1, "break;");
            buf.line(f, "}");
        }
        if ctx.codec_gen() {
            for buf in [&mut self.encoder, &mut self.decoder, &mut self.freeup] {
                buf.line(f, "default:");
                buf.line(f + 1, "break;");
                buf.line(f, "}");
            }
        }

        self.enums.raw(&enums);
        Ok(())
    }
}
