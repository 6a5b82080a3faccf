//! Resolve external names and remote identifiers for managed cloud resources.
//!
//! See [`external_name`] for the resolution machinery and [`config`] for the
//! persisted defaults the `extname` binary uses to build setup layers.

pub mod config;
pub mod external_name;
