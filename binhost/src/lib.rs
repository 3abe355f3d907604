//! binhost - publish Portage binary packages to GitHub
//!
//! This library uploads binary package archives as GitHub release assets and
//! keeps the binhost package index (`Packages`) stored on a branch of the same
//! repository in sync with what has been published.
//!
//! # Modules
//!
//! - [`manifest`] - package index parsing, single-package merge, serialization
//! - [`package`] - build environment and archive resolution
//! - [`forge`] - hosting API abstraction and its GitHub implementation
//! - [`publisher`] - the branch/release/asset/index workflow
//! - [`config`] - runtime configuration
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod forge;
pub mod logging;
pub mod manifest;
pub mod package;
pub mod publisher;
