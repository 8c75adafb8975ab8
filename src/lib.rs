//! The `airport` management binary: startup steps run by the container
//! command chain, plus the HTTP server itself.

pub mod cli;
pub mod commands;
pub mod staticfiles;

pub use cli::{Cli, Commands};
pub use commands::run;
