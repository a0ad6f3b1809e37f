// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod accuracy;
pub mod app_dirs;
pub mod chunker;
pub mod clock;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod runtime;
pub mod store;
pub mod ui;
