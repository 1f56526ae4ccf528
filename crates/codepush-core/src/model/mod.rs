//! Release ledger domain models
//!
//! Plain data mirrors of the ledger rows. Identifiers are the SQLite row ids;
//! a pointer value of `0` means "none yet".

pub mod deployment;
pub mod package;
pub mod release;

pub use deployment::{Deployment, DeploymentVersion};
pub use package::{Package, PackageDiff, PackageMetrics, ReleaseHistoryEntry};
pub use release::{format_label, ReleaseMethod, ReleaseParams};
