//! Wiring for the `loopclaw` binary, exposed as a library so the
//! end-to-end tests can build the same agent the CLI runs.

pub mod commands;
pub mod logging;
