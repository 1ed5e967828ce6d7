//! Offline shader compiler: one GLSL file in, a SPIR-V binary or a
//! translated dialect out.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use material_forge::shader::{
    CompileOptions, ShaderCompiler, ShaderDialect, ShaderSource, ShaderStage,
};
use tracing::info;

#[derive(Debug, Default)]
struct Cli {
    source: Option<PathBuf>,
    destination: Option<PathBuf>,
    dialect: Option<ShaderDialect>,
    mobile: bool,
}

fn parse_cli(args: &[String]) -> Result<Cli> {
    let mut cli = Cli::default();
    for arg in args {
        match arg.as_str() {
            "--msl" => cli.dialect = Some(ShaderDialect::Msl),
            "--wgsl" => cli.dialect = Some(ShaderDialect::Wgsl),
            "--spirv" => cli.dialect = Some(ShaderDialect::SpirV),
            "--mobile" => cli.mobile = true,
            other if other.starts_with("--") => {
                return Err(anyhow!(
                    "unknown argument: {other} (supported: --msl, --wgsl, --spirv, --mobile)"
                ));
            }
            other => {
                if cli.source.is_none() {
                    cli.source = Some(PathBuf::from(other));
                } else if cli.destination.is_none() {
                    cli.destination = Some(PathBuf::from(other));
                } else {
                    return Err(anyhow!("unexpected extra argument: {other}"));
                }
            }
        }
    }
    Ok(cli)
}

fn output_extension(dialect: ShaderDialect) -> &'static str {
    match dialect {
        ShaderDialect::SpirV => "spv",
        ShaderDialect::Msl => "msl",
        ShaderDialect::Wgsl => "wgsl",
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_cli(&args)?;
    let source_path = cli
        .source
        .ok_or_else(|| anyhow!("usage: shader-compiler <source> <dest> [--msl|--wgsl] [--mobile]"))?;
    let destination = cli
        .destination
        .ok_or_else(|| anyhow!("missing <dest> argument"))?;

    let text = std::fs::read_to_string(&source_path)
        .with_context(|| format!("failed to read {}", source_path.display()))?;

    let file_name = source_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    // Hand-written dialect-specific shaders opt out of compilation and
    // ship verbatim.
    if file_name.contains("nocompile") {
        std::fs::write(&destination, &text)
            .with_context(|| format!("failed to write {}", destination.display()))?;
        info!("copied {} to {}", source_path.display(), destination.display());
        return Ok(());
    }

    let stage = ShaderStage::from_filename(file_name);
    let dialect = cli.dialect.unwrap_or(ShaderDialect::SpirV);

    let mut compiler = ShaderCompiler::new();
    compiler.add_include_path(std::env::current_dir()?);
    if let Some(parent) = source_path.parent() {
        if parent != Path::new("") {
            compiler.add_include_path(parent);
        }
    }

    let options = CompileOptions {
        mobile_target: cli.mobile,
        ..CompileOptions::default()
    };

    let compiled = compiler
        .compile(stage, &text, dialect, &options)
        .with_context(|| format!("error when compiling {}", source_path.display()))?;

    let out_path = destination.with_extension(output_extension(dialect));
    match compiled {
        ShaderSource::Binary(words) => {
            std::fs::write(&out_path, bytemuck::cast_slice::<u32, u8>(&words))
                .with_context(|| format!("failed to write {}", out_path.display()))?;
        }
        ShaderSource::Text(translated) => {
            std::fs::write(&out_path, translated)
                .with_context(|| format!("failed to write {}", out_path.display()))?;
        }
    }

    info!(
        "successfully written shader from {} to {}",
        source_path.display(),
        out_path.display()
    );
    Ok(())
}
