/* Common utilities shared between analyze and codegen commands */

use anyhow::Context;
use capn_schema::CodeGeneratorRequest;
use clap::ValueEnum;
use std::io::Read;
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum InputFormat {
    /* Pick by file extension, else by the first character of the document */
    Auto,
    Json,
    Yaml,
}

/* RUST_LOG wins; otherwise debug when verbose and warn when not */
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/* Read the request document from a file, or stdin when no path is given */
pub fn load_request(
    input: Option<&Path>,
    format: InputFormat,
) -> anyhow::Result<CodeGeneratorRequest> {
    let text = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read request from stdin")?;
            text
        }
    };

    let origin = input_label(input);
    match resolve_format(input, format, &text) {
        InputFormat::Json => serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {} as JSON", origin)),
        _ => serde_yml::from_str(&text)
            .with_context(|| format!("failed to parse {} as YAML", origin)),
    }
}

fn resolve_format(input: Option<&Path>, format: InputFormat, text: &str) -> InputFormat {
    if format != InputFormat::Auto {
        return format;
    }
    let extension = input
        .and_then(Path::extension)
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") => InputFormat::Json,
        Some("yaml") | Some("yml") => InputFormat::Yaml,
        _ if text.trim_start().starts_with('{') => InputFormat::Json,
        _ => InputFormat::Yaml,
    }
}

pub fn input_label(input: Option<&Path>) -> String {
    input.map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_format() {
        let json = Path::new("req.JSON");
        assert_eq!(resolve_format(Some(json), InputFormat::Auto, ""), InputFormat::Json);
        assert_eq!(resolve_format(None, InputFormat::Auto, "  {\"nodes\": []}"), InputFormat::Json);
        assert_eq!(resolve_format(None, InputFormat::Auto, "nodes: []"), InputFormat::Yaml);
        assert_eq!(resolve_format(Some(json), InputFormat::Yaml, "{}"), InputFormat::Yaml);
    }
}
