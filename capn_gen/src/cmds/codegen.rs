/* Codegen command - generate C sources from a CodeGeneratorRequest */

use super::common::{InputFormat, input_label, load_request};
use anyhow::Context;
use capn_gen::codegen::{CCodeGenerator, CCodeGeneratorOptions};
use std::path::PathBuf;

/* Execute the codegen command */
pub fn run(
    input: Option<PathBuf>,
    output_dir: PathBuf,
    format: InputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    if verbose {
        println!("capnpc-c - C Code Generation");
        println!("============================\n");
        println!("[~] Configuration:");
        println!("  Input: {}", input_label(input.as_deref()));
        println!("  Format: {:?}", format);
        println!("  Output directory: {}", output_dir.display());
        println!();
    }

    let request = load_request(input.as_deref(), format)?;
    if verbose {
        println!(
            "[~] Loaded {} node(s), {} requested file(s)",
            request.nodes.len(),
            request.requested_files.len()
        );
    }

    let generator = CCodeGenerator::new(CCodeGeneratorOptions {
        output_dir: output_dir.clone(),
        write_files: true,
    });
    let generated = generator
        .generate(request)
        .with_context(|| format!("code generation into {} failed", output_dir.display()))?;

    for file in &generated {
        println!(
            "[✓] Generated C code: {} and {}",
            file.header_path.display(),
            file.source_path.display()
        );
    }
    Ok(())
}
