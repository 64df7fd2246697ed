//! # Provisioning Engine
//!
//! Reconciliation of directory identities into the account registry.
//!
//! This crate provides:
//! - Role resolution from directory membership, with the `org_admin` escalation rule
//! - Directory and registry snapshots
//! - Correlation by login and classification (new / outdated / unchanged / removed)
//! - Plan execution with per-identity outcomes
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐
//! │ DirectoryReader │────►│              │     ┌──────────┐     ┌──────────────┐
//! │  (+ roles)      │     │  Reconciler  │────►│ SyncPlan │────►│ SyncExecutor │
//! ├─────────────────┤     │              │     └──────────┘     └──────┬───────┘
//! │RegistrySnapshot │────►│              │                             │
//! └─────────────────┘     └──────────────┘                             ▼
//!                                                                ┌────────────┐
//!                                                                │ SyncReport │
//!                                                                └────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use ldapsync_provisioning::{SyncPipeline, SyncSettings};
//!
//! let pipeline = SyncPipeline::new(directory, registry, settings);
//! let session = registry.authenticate("admin", "secret").await?;
//!
//! let overview = pipeline.overview(&session).await?;
//! let report = pipeline.run(&session).await?;
//! for failure in report.failures() {
//!     eprintln!("{}: {:?}", failure.correlation_key, failure.outcome);
//! }
//! ```

pub mod directory;
pub mod error;
pub mod executor;
pub mod identity;
pub mod pipeline;
pub mod reconciliation;
pub mod registry;
pub mod report;
pub mod roles;

// Re-exports
pub use directory::{DirectoryReader, DirectorySnapshot, UnresolvedPath};
pub use error::{SyncError, SyncResult};
pub use executor::SyncExecutor;
pub use identity::{Identity, IdentityChanges};
pub use pipeline::{SyncOverview, SyncPipeline, SyncSettings};
pub use reconciliation::{classify, Action, Classification, PlanEntry, Reconciler, SyncPlan};
pub use registry::RegistrySnapshot;
pub use report::{ReportEntry, SyncOutcome, SyncReport, SyncStatistics};
pub use roles::{MembershipKind, ResolvedMapping, RoleMapping, RoleSet, ESCALATION_ROLE, ROLE_CATALOGUE};
