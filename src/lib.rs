// Library surface for hosts, the CLI and integration tests.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod analyzer;
pub mod config;
pub mod letters;
pub mod runtime;
pub mod sampler;
pub mod service;
pub mod session;
pub mod trace;
pub mod util;
pub mod wordlist;
