//! # Connector Framework
//!
//! Core abstractions for talking to the two systems ldapsync reconciles:
//! the directory (source of truth for people and memberships) and the
//! account registry (the system accounts are provisioned into).
//!
//! ## Architecture
//!
//! The framework is capability based, one trait per side:
//!
//! - [`DirectoryClient`] - subtree searches against the directory
//! - [`RegistryClient`] - session handshake and the account/role calls of the registry
//!
//! Both traits speak in typed values ([`DirectoryEntry`], [`AccountDetails`],
//! [`Session`]); wire formats never leak past a connector crate.
//!
//! ## Crate Organization
//!
//! - [`error`] - Error types and their classification
//! - [`config`] - Shared configuration types and the `ConnectorConfig` trait
//! - [`traits`] - Connector capability traits
//! - [`types`] - Entries, sessions and registry records

pub mod config;
pub mod error;
pub mod traits;
pub mod types;
