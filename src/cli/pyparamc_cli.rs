use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pyparamc")]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Extract(ExtractArgs),
    Compile(CompileArgs),
    Substitute(SubstituteArgs),
    Compose(ComposeArgs),
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    #[arg(long)]
    pub src: PathBuf,

    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct CompileArgs {
    #[arg(long)]
    pub src: PathBuf,

    #[arg(long)]
    pub config: PathBuf,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub validate_version: bool,
}

#[derive(Args, Debug)]
pub struct SubstituteArgs {
    #[arg(long)]
    pub base: PathBuf,

    #[arg(long)]
    pub updates: PathBuf,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub ignore_missing: bool,

    #[arg(long = "key")]
    pub keys: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ComposeArgs {
    #[arg(long)]
    pub src: PathBuf,

    #[arg(long = "search-folder")]
    pub search_folders: Vec<PathBuf>,

    #[arg(long)]
    pub out: PathBuf,
}
