// The binary entry point is main.rs; the library exposes the module tree so
// integration tests can drive the engines without a terminal.

pub mod app;
pub mod config;
pub mod event;
pub mod keyboard;
pub mod logging;
pub mod prompts;
pub mod session;
pub mod store;
pub mod ui;
