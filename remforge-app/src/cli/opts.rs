use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Openai,
    Anthropic,
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "remforge",
    version,
    about = "Turn YAML course outlines into RemNote flashcard imports"
)]
pub struct Cli {
    /// Config file (YAML); built-in defaults apply when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG still takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Generate flashcards from a course file
    Generate(GenerateArgs),
    /// Check a course file and print its shape
    Validate(ValidateArgs),
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Course YAML file
    #[arg(long, short)]
    pub input: PathBuf,

    /// Where to write the RemNote plaintext
    #[arg(long, short, default_value = "flashcards.txt")]
    pub output: PathBuf,

    /// Provider override (the config file decides otherwise)
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// Model override
    #[arg(long)]
    pub model: Option<String>,

    /// Emit a flat list with tag suffixes instead of the indented tree
    #[arg(long)]
    pub flat: bool,

    /// Print the topic tree and a card estimate without calling a provider
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ValidateArgs {
    /// Course YAML file
    #[arg(long, short)]
    pub input: PathBuf,

    /// Print stats as JSON
    #[arg(long)]
    pub json: bool,
}
