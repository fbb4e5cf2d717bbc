//! Dependency graph resolution for H5P interactive-content libraries.
//!
//! The crate turns a library name into the complete, ordered set of libraries
//! needed to run (or author) it:
//!
//! - [`registry`]: the global library catalog, fetched once and cached on
//!   disk, indexed by repo name and by library id
//! - [`library`]: manifests, resolution modes and requested-version handling
//! - [`semantics`]: scanning a library's configuration schema for optional
//!   embedded-library references
//! - [`resolver`]: the leveled breadth-first walk producing the final
//!   load-ordered [`resolver::graph::DependencyGraph`]
//! - [`version`]: pinning `major.minor` requests against git tags
//! - [`cache`]: the filesystem store for registry snapshots and resolved
//!   graphs
//! - [`verify`]: checking that cached lists and installed folders line up
//!
//! Network and disk access sit behind the [`library::source::LibrarySource`],
//! [`registry::source::RegistrySource`] and [`version::vcs::TagProvider`]
//! traits, so resolution logic is testable without either.

pub mod cache;
pub mod config;
pub mod error;
pub mod library;
pub mod registry;
pub mod resolver;
pub mod semantics;
pub mod verify;
pub mod version;
