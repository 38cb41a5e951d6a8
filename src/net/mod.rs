// Key Server Integration
// Wire records and the HTTP client

pub mod client;
pub mod models;

pub use client::{KeyServerClient, NetError, DEFAULT_BASE_URL};
