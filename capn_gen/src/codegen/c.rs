use crate::codegen::c_gen::{
    CodeBuf, DeclaredType, FileContext, emit_codec_declarations, emit_const, emit_enum,
    emit_external_declarations, emit_forward_declarations, emit_struct, emit_struct_helpers,
};
use crate::error::{CodegenError, CodegenResult};
use crate::layout::ScratchSegment;
use crate::schema::{FileOptions, NameTable, SchemaIndex, used_imports};
use capn_schema::{CodeGeneratorRequest, Node, NodeKind, RequestedFile};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct CCodeGenerator {
    options: CCodeGeneratorOptions,
}

#[derive(Debug, Clone)]
pub struct CCodeGeneratorOptions {
    /// Directory the `<displayName><infix>.h/.c` paths are resolved against.
    pub output_dir: PathBuf,
    pub write_files: bool,
}

impl Default for CCodeGeneratorOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            write_files: true,
        }
    }
}

/// Header and source generated for one requested file.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub file_id: u64,
    pub display_name: String,
    pub header_path: PathBuf,
    pub source_path: PathBuf,
    pub header: String,
    pub source: String,
}

impl CCodeGenerator {
    pub fn new(options: CCodeGeneratorOptions) -> Self {
        Self { options }
    }

    /// Generate every requested file, writing them out when
    /// `write_files` is set. The first error aborts the run.
    pub fn generate(&self, request: CodeGeneratorRequest) -> CodegenResult<Vec<GeneratedFile>> {
        let index = SchemaIndex::build(request.nodes)?;
        let names = NameTable::resolve(&index)?;
        debug!("indexed {} nodes", index.len());

        let mut generated = Vec::with_capacity(request.requested_files.len());
        for requested in &request.requested_files {
            let file = self.generate_file(&index, &names, requested)?;
            if self.options.write_files {
                write_generated(&file)?;
            }
            generated.push(file);
        }
        Ok(generated)
    }

    fn generate_file(
        &self,
        index: &SchemaIndex,
        names: &NameTable,
        requested: &RequestedFile,
    ) -> CodegenResult<GeneratedFile> {
        let file_node = index.lookup(requested.id, &requested.filename)?;
        let options = FileOptions::from_file(file_node)?;
        let used = used_imports(index, names, file_node.id)?;
        debug!("generating {}", file_node.display_name);

        let nodes = names
            .file_nodes(file_node.id)
            .iter()
            .map(|&id| index.lookup(id, &file_node.display_name))
            .collect::<CodegenResult<Vec<&Node>>>()?;

        let mut ctx = FileContext::new(index, names, &options);

        let mut declared = Vec::new();
        for &node in &nodes {
            let is_interface = matches!(node.kind, NodeKind::Interface(_));
            if is_struct(node) || is_interface {
                declared.push(DeclaredType {
                    name: ctx.name_of(node.id)?.to_string(),
                    native: if is_interface { String::new() } else { ctx.native_struct(node)? },
                    is_interface,
                });
            }
        }

        let mut header = CodeBuf::new();
        emit_preamble(&mut header, file_node, &options);
        for import in &requested.imports {
            if options.do_not_include.contains(&import.id) {
                debug!("skipping import {} (donotinclude)", import.name);
                continue;
            }
            if !used.contains(&import.id) {
                debug!("skipping unused import {}", import.name);
                continue;
            }
            let base = import.name.strip_prefix('/').unwrap_or(&import.name);
            header.raw(&format!("#include \"{}{}.h\"\n", base, options.name_infix));
        }
        header.raw("\n#ifdef __cplusplus\nextern \"C\" {\n#endif\n");
        emit_forward_declarations(&mut header, &declared);

        for node in nodes.iter().copied().filter(|n| matches!(n.kind, NodeKind::Enum(_))) {
            emit_enum(&mut ctx, node)?;
        }
        for node in nodes.iter().copied().filter(|n| matches!(n.kind, NodeKind::Const(_))) {
            emit_const(&mut ctx, node)?;
        }
        for node in nodes.iter().copied().filter(|n| is_struct(n)) {
            emit_struct(&mut ctx, node)?;
            if ctx.codec_gen() {
                emit_struct_helpers(&mut ctx, node)?;
            }
        }

        let extattr = ctx.extattr();
        emit_external_declarations(&mut ctx.header, &declared, &extattr);
        if ctx.codec_gen() {
            emit_codec_declarations(&mut ctx.header, &declared);
        }
        ctx.header.raw("\n#ifdef __cplusplus\n}\n#endif\n#endif\n");
        header.append(&ctx.header);

        let basename = file_node
            .display_name
            .rsplit('/')
            .next()
            .unwrap_or(&file_node.display_name);
        let mut source = CodeBuf::new();
        emit_source_preamble(
            &mut source,
            &format!("{}{}", basename, options.name_infix),
            ctx.val0_used,
            ctx.null_used,
            ctx.values.scratch(),
        );
        source.append(&ctx.source);

        let stem = format!("{}{}", file_node.display_name, options.name_infix);
        Ok(GeneratedFile {
            file_id: file_node.id,
            display_name: file_node.display_name.clone(),
            header_path: self.options.output_dir.join(format!("{}.h", stem)),
            source_path: self.options.output_dir.join(format!("{}.c", stem)),
            header: header.into_string(),
            source: source.into_string(),
        })
    }
}

fn is_struct(node: &Node) -> bool {
    node.as_struct().is_some_and(|s| !s.is_group)
}

fn emit_preamble(header: &mut CodeBuf, file_node: &Node, options: &FileOptions) {
    let (hi, lo) = ((file_node.id >> 32) as u32, file_node.id as u32);
    header.raw(&format!("#ifndef CAPN_{:X}{:X}\n", hi, lo));
    header.raw(&format!("#define CAPN_{:X}{:X}\n", hi, lo));
    header.raw("/* AUTO GENERATED - DO NOT EDIT */\n");
    header.raw("#include <capnp_c.h>\n");
    for extra in &options.extra_headers {
        header.line(0, extra);
    }
    header.raw("\n");
    header.raw("#if CAPN_VERSION != 1\n");
    header.raw("#error \"version mismatch between capnp_c.h and generated code\"\n");
    header.raw("#endif\n\n");
    header.raw(
        "#ifndef capnp_nowarn\n\
         # ifdef __GNUC__\n\
         #  define capnp_nowarn __extension__\n\
         # else\n\
         #  define capnp_nowarn\n\
         # endif\n\
         #endif\n\n",
    );
}

fn emit_source_preamble(
    source: &mut CodeBuf,
    include: &str,
    val0_used: bool,
    null_used: bool,
    scratch: &ScratchSegment,
) {
    source.raw(&format!("#include \"{}.h\"\n", include));
    source.raw("/* AUTO GENERATED - DO NOT EDIT */\n");
    source.raw(
        "#ifdef __GNUC__\n\
         # define capnp_unused __attribute__((unused))\n\
         # define capnp_use(x) (void) (x);\n\
         #else\n\
         # define capnp_unused\n\
         # define capnp_use(x)\n\
         #endif\n\n",
    );
    source.raw("#include <stdlib.h>\n#include <string.h>\n");
    if val0_used {
        source.raw("static const capn_text capn_val0 = {0,\"\",0};\n");
    }
    if null_used {
        source.raw("static const capn_ptr capn_null = {CAPN_NULL};\n");
    }

    if !scratch.is_empty() {
        let payload = scratch.payload();
        source.raw(&format!("static const uint8_t capn_buf[{}] = {{", payload.len()));
        for (k, byte) in payload.iter().enumerate() {
            if k > 0 {
                source.raw(",");
            }
            /* payload starts at segment byte 8, so line breaks stay word aligned */
            if k % 8 == 0 {
                source.raw("\n\t");
            }
            source.raw(&byte.to_string());
        }
        source.raw("\n};\n");
        source.raw(&format!(
            "static const struct capn_segment capn_seg = {{{{0}},0,0,0,(char*)&capn_buf[0],{},{},0}};\n",
            payload.len(),
            payload.len()
        ));
    }
}

fn write_generated(file: &GeneratedFile) -> CodegenResult<()> {
    write_artifact(&file.header_path, &file.header)?;
    write_artifact(&file.source_path, &file.source)?;
    info!(
        "wrote {} and {}",
        file.header_path.display(),
        file.source_path.display()
    );
    Ok(())
}

fn write_artifact(path: &Path, contents: &str) -> CodegenResult<()> {
    let failure = |source| CodegenError::OutputWriteFailure {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(failure)?;
    }
    fs::write(path, contents).map_err(failure)
}
