//! Shared integration test harness.

pub mod server;

pub use server::TestServer;
