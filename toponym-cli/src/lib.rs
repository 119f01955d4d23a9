//! Support library for the `toponym` binary.
//!
//! Exposes the command pipeline and logging set-up so integration tests can
//! drive the CLI without spawning a subprocess.

pub mod cli;
pub mod logging;
