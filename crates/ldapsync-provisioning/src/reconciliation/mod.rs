//! # Reconciliation
//!
//! Correlates the directory snapshot with the registry snapshot by login
//! name and derives the plan of registry changes.
//!
//! ## Overview
//!
//! - Directory identities without a registry account are **new**
//! - Matched identities whose name, second name, email or role set differ
//!   are **outdated**
//! - Registry accounts absent from the directory are **removed** (reported only)
//!
//! ```text
//!  DirectorySnapshot ──┐
//!                      ├──► Reconciler ──► SyncPlan ──► SyncExecutor
//!  RegistrySnapshot ───┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use ldapsync_provisioning::reconciliation::Reconciler;
//!
//! let reconciler = Reconciler::new(directory_identities, registry_identities);
//! for identity in reconciler.get_new() {
//!     println!("new: {identity}");
//! }
//! let plan = reconciler.plan();
//! ```

pub mod engine;
pub mod plan;

// Re-export main types
pub use engine::{classify, Classification, Reconciler};
pub use plan::{Action, PlanEntry, SyncPlan};
