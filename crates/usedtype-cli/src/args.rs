use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for the `usedtype` binary.
#[derive(Parser, Debug)]
#[command(
    name = "usedtype",
    version,
    about = "Report which exported struct fields a program actually uses"
)]
pub struct CliArgs {
    /// Regexp matching the import paths of the packages whose named types
    /// are analysis roots.
    #[arg(short = 'p', value_name = "PATTERN")]
    pub target_pattern: String,

    /// Call graph used to prune unreachable nested field accesses:
    /// one of "static", "cha", "rta", "pta"; empty for none.
    #[arg(long = "callgraph", value_name = "KIND", default_value = "")]
    pub callgraph: String,

    /// Print the source position of every field access under each field.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Enable debug logging.
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Working directory the snapshot path is resolved against.
    #[arg(short = 'C', long = "dir", default_value = ".")]
    pub dir: PathBuf,

    /// IR snapshot produced by the frontend.
    #[arg(long = "ir", value_name = "FILE", default_value = "ir.json")]
    pub ir: PathBuf,

    /// Glob patterns selecting the packages to analyze; all packages of
    /// the snapshot when empty.
    #[arg(value_name = "PATTERNS")]
    pub patterns: Vec<String>,
}
