//! Whole-program struct field-usage analysis.
//!
//! Given a typed program IR and a pattern naming the target packages, the
//! analyzer reports which exported fields of each target named type are
//! actually referenced anywhere in the program, descending through field
//! types and interface variants, and optionally pruning nested accesses
//! that a call graph shows to be unreachable from their parent access.
//!
//! Pipeline:
//! 1. [`traverse`] walks every instruction and value once per package.
//! 2. [`direct_usage`] buckets virtual field accesses by declaring type.
//! 3. [`alloc_set`] locates allocation sites of target named types.
//! 4. [`full_usage`] joins the two, consulting [`reach`] per child field.
//! 5. [`render`] serializes the result deterministically.
//!
//! [`driver::run`] ties the phases together behind one entry point.

pub mod alloc_set;
pub mod direct_usage;
pub mod driver;
pub mod full_usage;
pub mod named_type;
pub mod reach;
pub mod render;
pub mod traverse;
pub mod type_util;

mod util;

pub use alloc_set::{Alloc, NamedTypeAllocSet, find_named_type_alloc_set};
pub use direct_usage::{
    StructDirectUsage, StructDirectUsageMap, StructField, VirtAccessPoint,
    find_in_package_struct_direct_usage,
};
pub use driver::{AnalysisConfig, CallGraphKind, ConfigError, DriverError, run};
pub use full_usage::{
    CustomImplements, StructFieldFullUsage, StructFieldFullUsageKey, StructFullBuildOption,
    StructFullUsage, StructFullUsageKey, StructFullUsages, build_struct_full_usages,
};
pub use named_type::{NamedTypeFilter, find_package_named_types};
pub use reach::ReachabilityOracle;
pub use render::Renderer;
pub use traverse::{Strictness, Traversal};
