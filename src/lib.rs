// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod celebration;
pub mod clock;
pub mod config;
pub mod controller;
pub mod countdown;
pub mod error;
pub mod exercise;
pub mod history;
pub mod micro_session;
pub mod runtime;
pub mod sequencer;
pub mod ui;
pub mod util;
