use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use paramcore::{yamlfmt, EventLog, MatchMode};
use pyparams::cli::pyparamc_cli::{
    Cli, Command, CompileArgs, ComposeArgs, ExtractArgs, SubstituteArgs,
};
use pyparams::markers::MarkerConfig;
use pyparams::{compile, compose};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let markers = MarkerConfig::default();
    match cli.cmd {
        Command::Extract(args) => extract(&args, &markers),
        Command::Compile(args) => compile_cmd(&args, &markers),
        Command::Substitute(args) => substitute(&args, &markers),
        Command::Compose(args) => compose_cmd(&args, &markers),
    }
}

fn extract(args: &ExtractArgs, markers: &MarkerConfig) -> Result<()> {
    let source = read(&args.src)?;
    let document = compile::source_to_document(&source, markers)?;
    let text = yamlfmt::write_document(&document)?;
    write(&args.out, &text)
}

fn compile_cmd(args: &CompileArgs, markers: &MarkerConfig) -> Result<()> {
    let source = read(&args.src)?;
    let config = read(&args.config)?;
    let document = yamlfmt::read_document(&config)?;
    let mut events = EventLog::new();
    let compiled = compile::compile_source(
        &source,
        &document,
        markers,
        args.validate_version,
        &mut events,
    )?;
    write(&args.out, &compiled)
}

fn substitute(args: &SubstituteArgs, markers: &MarkerConfig) -> Result<()> {
    let base = yamlfmt::read_document(&read(&args.base)?)?;
    let updates = yamlfmt::read_document(&read(&args.updates)?)?;
    let mode = if args.ignore_missing {
        MatchMode::Permissive
    } else {
        MatchMode::Strict
    };
    let mut events = EventLog::new();
    let merged = paramcore::reconcile::substitute(
        &base,
        &updates,
        mode,
        &args.keys,
        &markers.version_key,
        &mut events,
    )?;
    let text = yamlfmt::write_document(&merged)?;
    write(&args.out, &text)
}

fn compose_cmd(args: &ComposeArgs, markers: &MarkerConfig) -> Result<()> {
    let source = read(&args.src)?;
    let mut events = EventLog::new();
    let composed =
        compose::compose_source(&source, &args.search_folders, markers, &mut events)?;
    write(&args.out, &composed)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

// Outputs land on disk only once the whole transform has succeeded.
fn write(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!("wrote {}", path.display());
    Ok(())
}
