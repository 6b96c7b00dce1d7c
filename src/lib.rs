// Library surface for headless/integration tests and reuse.
// The binary only adds argument parsing and terminal setup on top of this.
pub mod config;
pub mod error;
pub mod geometry;
pub mod placement;
pub mod runtime;
pub mod session;
pub mod stopwatch;
pub mod ui;
