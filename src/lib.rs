// Library target for benchmarks and integration tests.
// The binary entry point is main.rs; this file re-declares the module tree so
// that harnesses can import types via `rolecall::engine::*` / `rolecall::session::*`.
// Some code is only exercised through the binary, so suppress dead_code warnings.
#![allow(dead_code)]

pub mod analytics;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod session;
pub mod store;

// Private: the terminal front-end, reachable only from the binary
mod app;
mod event;
mod ui;
