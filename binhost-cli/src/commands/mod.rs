//! CLI command implementations.

pub mod locate;
pub mod manifest;
pub mod publish;
