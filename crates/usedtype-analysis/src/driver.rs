//! Analysis driver: configuration validation and phase orchestration.

use crate::alloc_set::find_named_type_alloc_set;
use crate::direct_usage::find_in_package_struct_direct_usage;
use crate::full_usage::{
    CustomImplements, StructFullBuildOption, StructFullUsages, build_struct_full_usages,
};
use crate::named_type::NamedTypeFilter;
use crate::render::Renderer;
use crate::traverse::Strictness;
use regex::Regex;
use thiserror::Error;
use tracing::debug;
use usedtype_ir::{CallGraph, PkgId, Program, static_call_graph};

/// Which call graph, if any, prunes nested field accesses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CallGraphKind {
    #[default]
    None,
    /// Direct call edges, derived from the IR in-process.
    Static,
    /// Class-hierarchy analysis; carried by the snapshot.
    Cha,
    /// Rapid type analysis; carried by the snapshot, needs a main package.
    Rta,
    /// Points-to analysis; carried by the snapshot, needs a main package.
    Pta,
}

impl CallGraphKind {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s {
            "" => Ok(Self::None),
            "static" => Ok(Self::Static),
            "cha" => Ok(Self::Cha),
            "rta" => Ok(Self::Rta),
            "pta" => Ok(Self::Pta),
            other => Err(ConfigError::UnknownCallGraphKind(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Static => "static",
            Self::Cha => "cha",
            Self::Rta => "rta",
            Self::Pta => "pta",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("target package pattern must not be empty")]
    EmptyPattern,
    #[error("invalid target package pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("unknown call graph kind '{0}'")]
    UnknownCallGraphKind(String),
    #[error("call graph kind '{0}' requires a main package")]
    RequiresMainPackage(&'static str),
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("call graph '{0}' not present in the program snapshot")]
    MissingCallGraph(&'static str),
}

pub struct AnalysisConfig<'a> {
    /// Regexp matched against the import paths of the packages whose
    /// named types are analysis roots.
    pub target_pattern: &'a str,
    pub call_graph: CallGraphKind,
    pub strictness: Strictness,
    pub filter: Option<&'a NamedTypeFilter<'a>>,
    pub custom_implements: Option<&'a CustomImplements<'a>>,
}

impl<'a> AnalysisConfig<'a> {
    pub fn new(target_pattern: &'a str) -> Self {
        Self {
            target_pattern,
            call_graph: CallGraphKind::None,
            strictness: Strictness::default(),
            filter: None,
            custom_implements: None,
        }
    }
}

/// Run the whole pipeline over `pkgs`: direct-usage collection, root
/// allocation discovery, then the full-usage build.
///
/// Configuration errors surface before any traversal starts; the result
/// is all-or-nothing.
pub fn run(
    program: &Program,
    pkgs: &[PkgId],
    config: &AnalysisConfig<'_>,
) -> Result<StructFullUsages, DriverError> {
    if config.target_pattern.is_empty() {
        return Err(ConfigError::EmptyPattern.into());
    }
    let pattern = Regex::new(config.target_pattern).map_err(ConfigError::InvalidPattern)?;

    if matches!(config.call_graph, CallGraphKind::Rta | CallGraphKind::Pta)
        && !program.has_main_package()
    {
        return Err(ConfigError::RequiresMainPackage(config.call_graph.as_str()).into());
    }

    let graph: Option<CallGraph> = match config.call_graph {
        CallGraphKind::None => None,
        CallGraphKind::Static => Some(static_call_graph(program)),
        CallGraphKind::Cha | CallGraphKind::Rta | CallGraphKind::Pta => {
            let kind = config.call_graph.as_str();
            Some(
                program
                    .call_graphs
                    .get(kind)
                    .cloned()
                    .ok_or(DriverError::MissingCallGraph(kind))?,
            )
        }
    };
    if let Some(g) = &graph {
        debug!(kind = config.call_graph.as_str(), nodes = g.node_count(), "call graph attached");
    }

    let dm = find_in_package_struct_direct_usage(program, pkgs, config.strictness);
    debug!(types = dm.len(), "collected direct field usage");
    if tracing::enabled!(tracing::Level::DEBUG) && !dm.is_empty() {
        debug!(
            "direct usage:\n{}",
            Renderer::new(program).render_direct_usage(&dm)
        );
    }

    let roots = find_named_type_alloc_set(program, pkgs, &pattern, config.filter, config.strictness);
    debug!(roots = roots.len(), "located root allocation sites");
    if tracing::enabled!(tracing::Level::DEBUG) && !roots.is_empty() {
        debug!("allocation sites:\n{}", roots.render(program));
    }

    let opt = StructFullBuildOption {
        call_graph: graph.as_ref(),
        custom_implements: config.custom_implements,
    };
    Ok(build_struct_full_usages(program, &dm, &roots, &opt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use usedtype_ir::ProgramBuilder;

    fn empty_program() -> Program {
        let mut b = ProgramBuilder::new();
        b.package("main", "main");
        b.finish()
    }

    #[test]
    fn test_empty_pattern_is_a_config_error() {
        let program = empty_program();
        let config = AnalysisConfig::new("");
        let err = run(&program, &[], &config).expect_err("must reject");
        assert!(matches!(
            err,
            DriverError::Config(ConfigError::EmptyPattern)
        ));
    }

    #[test]
    fn test_invalid_pattern_is_a_config_error() {
        let program = empty_program();
        let config = AnalysisConfig::new("([");
        let err = run(&program, &[], &config).expect_err("must reject");
        assert!(matches!(
            err,
            DriverError::Config(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_rta_without_main_package_is_a_config_error() {
        let mut b = ProgramBuilder::new();
        b.package("sdk", "sdk");
        let program = b.finish();
        let mut config = AnalysisConfig::new("sdk");
        config.call_graph = CallGraphKind::Rta;
        let err = run(&program, &[], &config).expect_err("must reject");
        assert!(matches!(
            err,
            DriverError::Config(ConfigError::RequiresMainPackage("rta"))
        ));
    }

    #[test]
    fn test_snapshot_borne_graph_must_be_present() {
        let program = empty_program();
        let mut config = AnalysisConfig::new("sdk");
        config.call_graph = CallGraphKind::Cha;
        let err = run(&program, &[], &config).expect_err("must reject");
        assert!(matches!(err, DriverError::MissingCallGraph("cha")));
    }

    #[test]
    fn test_unknown_call_graph_kind_fails_to_parse() {
        let err = CallGraphKind::parse("points-to").expect_err("must reject");
        assert!(matches!(err, ConfigError::UnknownCallGraphKind(_)));
        assert_eq!(CallGraphKind::parse("").expect("none"), CallGraphKind::None);
        assert_eq!(
            CallGraphKind::parse("static").expect("static"),
            CallGraphKind::Static
        );
    }
}
