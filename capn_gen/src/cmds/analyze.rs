/* Analyze command - declaration order and slot geometry per requested file */

use super::common::{InputFormat, input_label, load_request};
use anyhow::Context;
use capn_gen::CodegenResult;
use capn_gen::codegen::c_gen::FileContext;
use capn_gen::layout::SlotWidth;
use capn_gen::schema::{FileOptions, NameTable, SchemaIndex};
use capn_schema::{CodeGeneratorRequest, FieldKind, Node, NO_DISCRIMINANT};
use serde_derive::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub file: String,
    pub id: String,
    pub declarations: Vec<DeclarationReport>,
    pub structs: Vec<StructReport>,
}

#[derive(Debug, Serialize)]
pub struct DeclarationReport {
    pub name: String,
    pub kind: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StructReport {
    pub name: String,
    pub data_words: u16,
    pub pointers: u16,
    pub fields: Vec<FieldReport>,
}

#[derive(Debug, Serialize)]
pub struct FieldReport {
    /// Dotted path through enclosing groups.
    pub path: String,
    #[serde(rename = "type")]
    pub ty: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminant: Option<u16>,
    pub width: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<u32>,
    /// XOR mask applied to the stored bits, `0x0` without a default.
    pub xor_mask: String,
    /// Symbol of a materialized pointer default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_symbol: Option<String>,
}

/* Execute the analyze command */
pub fn run(input: Option<PathBuf>, format: InputFormat, json: bool) -> anyhow::Result<()> {
    let request = load_request(input.as_deref(), format)?;
    let reports = analyze_request(request)
        .with_context(|| format!("failed to analyze {}", input_label(input.as_deref())))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!("capnpc-c - Schema Analysis");
    println!("==========================\n");
    for report in &reports {
        print_report(report);
    }
    Ok(())
}

pub fn analyze_request(request: CodeGeneratorRequest) -> CodegenResult<Vec<FileReport>> {
    let index = SchemaIndex::build(request.nodes)?;
    let names = NameTable::resolve(&index)?;

    let mut reports = Vec::new();
    for requested in &request.requested_files {
        let file_node = index.lookup(requested.id, &requested.filename)?;
        let options = FileOptions::from_file(file_node)?;
        let mut ctx = FileContext::new(&index, &names, &options);

        let mut declarations = Vec::new();
        let mut structs = Vec::new();
        for &id in names.file_nodes(file_node.id) {
            let node = index.lookup(id, &file_node.display_name)?;
            declarations.push(DeclarationReport {
                name: names.name(id)?.to_string(),
                kind: node.kind_name(),
            });
            if let Some(body) = node.as_struct() {
                let mut fields = Vec::new();
                collect_fields(&mut ctx, node, "", &mut fields)?;
                structs.push(StructReport {
                    name: names.name(id)?.to_string(),
                    data_words: body.data_word_count,
                    pointers: body.pointer_count,
                    fields,
                });
            }
        }

        reports.push(FileReport {
            file: file_node.display_name.clone(),
            id: format!("{:#x}", file_node.id),
            declarations,
            structs,
        });
    }
    Ok(reports)
}

fn collect_fields<'a>(
    ctx: &mut FileContext<'a>,
    node: &'a Node,
    prefix: &str,
    out: &mut Vec<FieldReport>,
) -> CodegenResult<()> {
    let Some(body) = node.as_struct() else {
        return Ok(());
    };
    for field in &body.fields {
        let path = format!("{}{}", prefix, field.name);
        match &field.kind {
            FieldKind::Group(group) => {
                let index = ctx.index;
                let group_node = index.lookup(group.type_id, &path)?;
                collect_fields(ctx, group_node, &format!("{}.", path), out)?;
            }
            FieldKind::Slot(slot) => {
                let Some(member) = ctx.member_slot(node, field)? else {
                    continue;
                };
                let layout = member.layout;
                let width = match layout.width {
                    SlotWidth::Void => "void".to_string(),
                    SlotWidth::Bit => "1 bit".to_string(),
                    SlotWidth::Bytes(n) => format!("{} bytes", n),
                    SlotWidth::Pointer => "pointer".to_string(),
                };
                let in_data = matches!(layout.width, SlotWidth::Bit | SlotWidth::Bytes(_));
                out.push(FieldReport {
                    path,
                    ty: slot.ty.tag_name(),
                    discriminant: (field.discriminant_value != NO_DISCRIMINANT)
                        .then_some(field.discriminant_value),
                    width,
                    byte_offset: in_data.then(|| layout.byte_offset()),
                    bit: matches!(layout.width, SlotWidth::Bit).then(|| layout.bit_shift()),
                    pointer: layout.pointer_index(),
                    xor_mask: format!("{:#x}", member.value.bits & layout.value_mask()),
                    default_symbol: member.value.pointer.as_ref().map(|p| p.symbol.clone()),
                });
            }
        }
    }
    Ok(())
}

fn print_report(report: &FileReport) {
    println!("[~] {} ({})", report.file, report.id);
    println!("    Declaration order:");
    for decl in &report.declarations {
        println!("      - {} ({})", decl.name, decl.kind);
    }
    for s in &report.structs {
        println!(
            "\n    struct {} [{} data word(s), {} pointer(s)]",
            s.name, s.data_words, s.pointers
        );
        for f in &s.fields {
            let place = match (f.byte_offset, f.bit, f.pointer) {
                (Some(byte), Some(bit), _) => format!("byte {} bit {}", byte, bit),
                (Some(byte), None, _) => format!("byte {}", byte),
                (_, _, Some(ptr)) => format!("pointer {}", ptr),
                _ => "-".to_string(),
            };
            let union = f
                .discriminant
                .map(|d| format!(" [case {}]", d))
                .unwrap_or_default();
            let default = f
                .default_symbol
                .as_deref()
                .map(|s| format!(" default {}", s))
                .unwrap_or_default();
            println!(
                "      {:<24} {:<10} {:<9} {:<18} xor {}{}{}",
                f.path, f.ty, f.width, place, f.xor_mask, default, union
            );
        }
    }
    println!();
}
