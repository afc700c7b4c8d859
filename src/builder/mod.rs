//! Build execution: toolchain resolution, per-target package builds, and
//! the parallel matrix executor.

pub mod executor;
pub mod package;
pub mod toolchain;

pub use executor::{MatrixExecutor, TargetOutcome, TargetReport};
pub use package::PackageBuilder;
pub use toolchain::{ToolchainHandle, ToolchainResolver};
