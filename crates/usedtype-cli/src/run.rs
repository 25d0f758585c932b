//! Snapshot loading, package selection and pipeline invocation.

use crate::args::CliArgs;
use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use thiserror::Error;
use tracing::debug;
use usedtype_analysis::{
    AnalysisConfig, CallGraphKind, DriverError, Renderer, Strictness,
};
use usedtype_ir::{PkgId, Program};

/// Failure modes of a CLI run, split by exit code: usage/configuration
/// errors exit 1, load errors exit 2.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0:#}")]
    Load(anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => 1,
            Self::Load(_) => 2,
        }
    }
}

fn package_selection(patterns: &[String]) -> Result<Option<GlobSet>, CliError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for p in patterns {
        let glob = Glob::new(p)
            .map_err(|e| CliError::Usage(format!("invalid package pattern '{p}': {e}")))?;
        builder.add(glob);
    }
    let set = builder
        .build()
        .map_err(|e| CliError::Usage(format!("invalid package patterns: {e}")))?;
    Ok(Some(set))
}

fn select_packages(program: &Program, selection: Option<&GlobSet>) -> Vec<PkgId> {
    program
        .pkg_ids()
        .filter(|&p| selection.is_none_or(|s| s.is_match(&program.package(p).path)))
        .collect()
}

/// Load, analyze and render. Separated from [`run`] so tests can assert
/// on the output and the error kind without touching stdout.
pub fn execute(args: &CliArgs) -> Result<String, CliError> {
    let kind = CallGraphKind::parse(&args.callgraph)
        .map_err(|e| CliError::Usage(e.to_string()))?;
    let selection = package_selection(&args.patterns)?;

    let path = args.dir.join(&args.ir);
    let program = Program::from_json_file(&path)
        .with_context(|| format!("loading IR snapshot {}", path.display()))
        .map_err(CliError::Load)?;

    let pkgs = select_packages(&program, selection.as_ref());
    debug!(
        selected = pkgs.len(),
        total = program.packages.len(),
        "selected packages"
    );

    let mut config = AnalysisConfig::new(&args.target_pattern);
    config.call_graph = kind;
    config.strictness = Strictness::Lenient;
    let usages = usedtype_analysis::run(&program, &pkgs, &config).map_err(|e| match e {
        DriverError::Config(c) => CliError::Usage(c.to_string()),
        DriverError::MissingCallGraph(_) => CliError::Load(anyhow::anyhow!("{e}")),
    })?;

    Ok(Renderer::new(&program).verbose(args.verbose).render(&usages))
}

/// Run the CLI end to end and return the process exit code.
pub fn run(args: &CliArgs) -> u8 {
    init_tracing(args.debug);
    match execute(args) {
        Ok(output) => {
            println!("{output}");
            0
        }
        Err(e) => {
            eprintln!("usedtype: {e}");
            e.exit_code()
        }
    }
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::EnvFilter;
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Ignore a second init; tests call `run` repeatedly.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
