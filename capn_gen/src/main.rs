use clap::{Parser, Subcommand};
use cmds::common::InputFormat;
use std::path::PathBuf;

mod cmds;

#[derive(Parser)]
#[command(name = "capnpc-c")]
#[command(about = "Cap'n Proto C code generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /* Generate C headers and sources for every requested file */
    Codegen {
        /* CodeGeneratorRequest document; stdin when omitted */
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,

        /* Directory the generated files are written below */
        #[arg(short = 'o', long = "output", value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,

        /* Encoding of the request document */
        #[arg(long = "format", value_enum, default_value = "auto")]
        format: InputFormat,

        /* Enable verbose output */
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },

    /* Show declaration order and field geometry without generating code */
    Analyze {
        /* CodeGeneratorRequest document; stdin when omitted */
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,

        /* Encoding of the request document */
        #[arg(long = "format", value_enum, default_value = "auto")]
        format: InputFormat,

        /* Print the report as JSON */
        #[arg(long = "json")]
        json: bool,

        /* Enable verbose output */
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Codegen {
            input,
            output_dir,
            format,
            verbose,
        } => {
            cmds::common::init_tracing(verbose);
            cmds::codegen::run(input, output_dir, format, verbose)?;
        }

        Commands::Analyze {
            input,
            format,
            json,
            verbose,
        } => {
            cmds::common::init_tracing(verbose);
            cmds::analyze::run(input, format, json)?;
        }
    }

    Ok(())
}
